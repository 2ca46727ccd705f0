//! Overlay service: the one owner of the drawer and frame
//!
//! The surfaces exist only while the service is connected. Anything that
//! needs the drawer asks the service for it and gets
//! [`Error::ServiceNotRunning`] otherwise.

use std::rc::Rc;
use std::time::Instant;

use lsw_core::prelude::*;
use lsw_core::Event;

use crate::bus::EventBus;
use crate::collaborators::Collaborators;
use crate::drawer::{create_drawer, DrawerDelegate};
use crate::frame::{create_frame, FrameDelegate};
use crate::prefs::Preferences;

/// Rounds of queued preference notifications delivered by one settle before
/// giving up on handlers that keep writing
const MAX_SETTLE_ROUNDS: usize = 16;

#[derive(Debug)]
pub struct OverlayService {
    bus: EventBus,
    prefs: Preferences,
    collaborators: Collaborators,
    drawer: Option<Rc<DrawerDelegate>>,
    frame: Option<Rc<FrameDelegate>>,
}

impl OverlayService {
    pub fn new(bus: &EventBus, prefs: &Preferences, collaborators: Collaborators) -> Self {
        Self {
            bus: bus.clone(),
            prefs: prefs.clone(),
            collaborators,
            drawer: None,
            frame: None,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn is_running(&self) -> bool {
        self.drawer.is_some()
    }

    /// Create both surfaces. Connecting twice keeps the live instances.
    pub fn on_service_connected(&mut self) -> Result<()> {
        if self.is_running() {
            warn!("Overlay service already connected");
            return Ok(());
        }

        let drawer = create_drawer(&self.bus, &self.prefs, self.collaborators.clone());
        drawer.on_create()?;
        self.drawer = Some(drawer);

        let frame = create_frame(&self.bus, &self.prefs, self.collaborators.clone());
        if let Err(e) = frame.on_create() {
            self.on_destroy()?;
            return Err(e);
        }
        self.frame = Some(frame);

        info!("Overlay service connected");
        self.settle()
    }

    /// Tear both surfaces down
    pub fn on_destroy(&mut self) -> Result<()> {
        if let Some(frame) = self.frame.take() {
            frame.on_destroy()?;
        }
        if let Some(drawer) = self.drawer.take() {
            drawer.on_destroy()?;
            info!("Overlay service destroyed");
        }
        self.settle()
    }

    pub fn drawer(&self) -> Result<Rc<DrawerDelegate>> {
        self.drawer.clone().ok_or(Error::ServiceNotRunning)
    }

    pub fn frame(&self) -> Result<Rc<FrameDelegate>> {
        self.frame.clone().ok_or(Error::ServiceNotRunning)
    }

    /// Send an event and deliver the preference changes it caused
    pub fn send(&self, event: Event) -> Result<()> {
        debug!("Sending {}", event.event_type());
        self.bus.send(event)?;
        self.settle()
    }

    /// Deliver queued preference notifications until none are left
    pub fn settle(&self) -> Result<()> {
        for _ in 0..MAX_SETTLE_ROUNDS {
            if !self.prefs.has_pending() {
                return Ok(());
            }
            self.prefs.dispatch_pending()?;
        }
        if self.prefs.has_pending() {
            warn!(
                "Preference notifications still pending after {} rounds",
                MAX_SETTLE_ROUNDS
            );
        }
        Ok(())
    }

    /// Advance both surfaces' transitions to `now`
    pub fn tick(&self, now: Instant) -> Result<()> {
        if let Some(drawer) = &self.drawer {
            drawer.tick(now)?;
        }
        if let Some(frame) = &self.frame {
            frame.tick(now)?;
        }
        self.settle()
    }

    /// The keyguard was locked or dismissed
    pub fn on_keyguard_changed(&self) -> Result<()> {
        self.frame()?.on_keyguard_changed()?;
        self.settle()
    }

    /// Re-read the preference file and notify the keys that changed
    pub fn reload_preferences(&self) -> Result<Vec<String>> {
        let changed = self.prefs.reload()?;
        if !changed.is_empty() {
            info!("Preferences reloaded, {} key(s) changed", changed.len());
        }
        self.settle()?;
        Ok(changed)
    }
}

impl Drop for OverlayService {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.on_destroy() {
                warn!("Failed to tear down overlay service: {}", e);
            }
        }
    }
}
