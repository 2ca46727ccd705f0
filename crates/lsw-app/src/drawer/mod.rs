//! Slide-out widget drawer
//!
//! A full-width overlay window holding a vertically scrolling widget grid. It
//! opens from a button, from a `ShowDrawer` event or by dragging the edge
//! handle, and fades out when closed. Only [`crate::service::OverlayService`]
//! creates it.

pub mod gesture;
pub mod handle;


use std::rc::Rc;
use std::time::Instant;

use lsw_core::prelude::*;
use lsw_core::{Event, Gravity};
use serde::Serialize;

use crate::bus::EventBus;
use crate::collaborators::{
    AttachResult, Collaborators, DisplayMetrics, HostResult, WindowKind, WindowParams,
};
use crate::delegate::{Delegate, DelegateCore, Parts, Surface};
use crate::grid::{GridCounts, SpannedGrid};
use crate::prefs::{keys, HandlerRegistry, Preferences};
use crate::store::PreferenceWidgetStore;
use crate::transition::{Easing, Transition};

use self::gesture::snap_decision;
use self::handle::{Handle, HANDLE_WIDTH_DP};

pub type DrawerDelegate = Delegate<DrawerSurface>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeEnd {
    /// Drawer fully visible
    Shown,
    /// Remove the window
    Hide { call_listener: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    transition: Transition,
    end: FadeEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snap {
    transition: Transition,
    opens: bool,
}

/// Drawer-specific state
#[derive(Debug)]
pub struct DrawerSurface {
    params: WindowParams,
    handle: Handle,
    attached: bool,
    alpha: f32,
    background_color: u32,
    side_padding_px: i32,
    top_padding_px: u32,
    corner_radius_px: i32,
    fade: Option<Fade>,
    snap: Option<Snap>,
}

/// Observable drawer state, for status output and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawerSnapshot {
    pub attached: bool,
    pub x: i32,
    pub gravity: Gravity,
    pub width: u32,
    pub alpha: f32,
    pub handle_shown: bool,
    pub scrolling_open: bool,
    pub background_color: u32,
    pub side_padding_px: i32,
    pub top_padding_px: u32,
    pub corner_radius_px: i32,
    pub fading: bool,
    pub snapping: bool,
    pub can_scroll_vertically: bool,
}

impl DrawerSurface {
    fn new(display: &DisplayMetrics, prefs: &Preferences) -> Self {
        Self {
            params: WindowParams {
                x: 0,
                gravity: Gravity::Left,
                width: display.width_px,
            },
            handle: Handle::new(display.dp_to_px(HANDLE_WIDTH_DP).max(1) as u32, Gravity::Left),
            attached: false,
            alpha: 0.0,
            background_color: prefs.drawer_background_color(),
            side_padding_px: 0,
            top_padding_px: 0,
            corner_radius_px: display.dp_to_px(prefs.drawer_corner_radius_dp()),
            fade: None,
            snap: None,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Window choreography
    // ─────────────────────────────────────────────────────────

    fn try_show_handle(&mut self, core: &DelegateCore) {
        let prefs = core.prefs();
        let power = &core.collaborators().power;
        if prefs.drawer_enabled() && prefs.show_drawer_handle() && power.is_interactive() {
            self.handle.show(core.collaborators().window.as_ref());
        }
    }

    fn hide_handle(&mut self, core: &DelegateCore) {
        self.handle.hide(core.collaborators().window.as_ref());
    }

    fn hide_all(&mut self, core: &mut DelegateCore) {
        self.hide_drawer(core, false);
        self.hide_handle(core);
    }

    fn show_drawer(&mut self, core: &mut DelegateCore, hide_handle: bool) {
        match core
            .collaborators()
            .window
            .add(WindowKind::Drawer, &self.params)
        {
            AttachResult::Applied => {
                debug!("Drawer window added at x={}", self.params.x);
                core.emit(Event::DrawerAttachmentState { attached: true });
            }
            AttachResult::Unchanged => self.update_drawer(core),
            AttachResult::NotReady => debug!("Window manager not ready, drawer not shown"),
        }

        if hide_handle {
            self.hide_handle(core);
        }
    }

    fn update_drawer(&mut self, core: &DelegateCore) {
        if core
            .collaborators()
            .window
            .update(WindowKind::Drawer, &self.params)
            == AttachResult::NotReady
        {
            debug!("Window manager not ready, drawer layout not updated");
        }
    }

    /// Fade out, then remove the window. `call_listener` sends
    /// `DrawerHidden` once removed.
    fn hide_drawer(&mut self, core: &mut DelegateCore, call_listener: bool) {
        core.update_state(|s| s.handling_click(false));
        core.list_mut().clear_editing();

        // A pending snap would reopen the drawer when it lands
        self.snap = None;
        self.fade = Some(Fade {
            transition: Transition::new(1.0, 0.0, core.now(), Easing::Accelerate),
            end: FadeEnd::Hide { call_listener },
        });
        self.try_show_handle(core);
    }

    fn remove_drawer(&mut self, core: &mut DelegateCore, call_listener: bool) {
        match core.collaborators().window.remove(WindowKind::Drawer) {
            AttachResult::Applied => {
                debug!("Drawer window removed");
                core.emit(Event::DrawerAttachmentState { attached: false });
                if call_listener {
                    core.emit(Event::DrawerHidden);
                }
            }
            AttachResult::Unchanged => {}
            AttachResult::NotReady => debug!("Window manager not ready, drawer not removed"),
        }
    }

    fn on_attachment_changed(&mut self, core: &mut DelegateCore, attached: bool) {
        self.attached = attached;

        if !attached {
            log_host(core.collaborators().widget_host.stop_listening(), "stop_listening");
            return;
        }

        if !self.handle.scrolling_open {
            core.list_mut().update_views();
            log_host(
                core.collaborators().widget_host.start_listening(),
                "start_listening",
            );
        }

        self.top_padding_px = core.display().status_bar_height_px;

        if self.handle.scrolling_open {
            self.alpha = 1.0;
        } else {
            self.fade = Some(Fade {
                transition: Transition::new(self.alpha, 1.0, core.now(), Easing::Decelerate),
                end: FadeEnd::Shown,
            });
        }

        self.background_color = core.prefs().drawer_background_color();
    }

    fn update_side_padding(&mut self, core: &DelegateCore) {
        self.side_padding_px = core.display().dp_to_px(core.prefs().drawer_side_padding_dp());
    }

    fn can_scroll_vertically(&self, core: &DelegateCore) -> bool {
        core.list().editing_position().is_none() || core.state().is_holding_item
    }

    fn snapshot(&self, core: &DelegateCore) -> DrawerSnapshot {
        DrawerSnapshot {
            attached: self.attached,
            x: self.params.x,
            gravity: self.params.gravity,
            width: self.params.width,
            alpha: self.alpha,
            handle_shown: self.handle.is_shown(),
            scrolling_open: self.handle.scrolling_open,
            background_color: self.background_color,
            side_padding_px: self.side_padding_px,
            top_padding_px: self.top_padding_px,
            corner_radius_px: self.corner_radius_px,
            fading: self.fade.is_some(),
            snapping: self.snap.is_some(),
            can_scroll_vertically: self.can_scroll_vertically(core),
        }
    }
}

fn log_host(result: HostResult, call: &str) {
    if result == HostResult::NotReady {
        debug!("Widget host not ready for {}", call);
    }
}

impl Surface for DrawerSurface {
    const NAME: &'static str = "drawer";

    fn handlers() -> HandlerRegistry<Parts<Self>> {
        HandlerRegistry::new()
            .handler(keys::DRAWER_ENABLED, |p: &mut Parts<Self>| {
                if p.core.prefs().drawer_enabled() {
                    p.surface.try_show_handle(&p.core);
                } else {
                    p.surface.hide_all(&mut p.core);
                }
                Ok(())
            })
            .handler(keys::SHOW_DRAWER_HANDLE, |p: &mut Parts<Self>| {
                if p.core.prefs().show_drawer_handle() {
                    p.surface.try_show_handle(&p.core);
                } else {
                    p.surface.hide_handle(&p.core);
                }
                Ok(())
            })
            .handler(keys::DRAWER_WIDGETS, |p: &mut Parts<Self>| {
                // A reorder already shows the new order
                if p.core.state().updated_for_move {
                    p.core.update_state(|s| s.for_move(false));
                } else {
                    p.core.reload_widgets();
                }
                Ok(())
            })
            .handler(keys::DRAWER_BACKGROUND_COLOR, |p: &mut Parts<Self>| {
                p.surface.background_color = p.core.prefs().drawer_background_color();
                Ok(())
            })
            .handler(keys::DRAWER_COL_COUNT, |p: &mut Parts<Self>| {
                p.update_counts();
                Ok(())
            })
            .handler(keys::DRAWER_WIDGET_CORNER_RADIUS, |p: &mut Parts<Self>| {
                p.surface.corner_radius_px =
                    p.core.display().dp_to_px(p.core.prefs().drawer_corner_radius_dp());
                if p.surface.attached {
                    p.core.list_mut().update_views();
                }
                Ok(())
            })
            .handler(keys::LOCK_WIDGET_DRAWER, |p: &mut Parts<Self>| {
                p.core.list_mut().clear_editing();
                Ok(())
            })
            .handler(keys::DRAWER_SIDE_PADDING, |p: &mut Parts<Self>| {
                p.surface.update_side_padding(&p.core);
                Ok(())
            })
    }

    fn retrieve_counts(&self, core: &DelegateCore) -> GridCounts {
        GridCounts::columns(core.prefs().drawer_col_count())
    }

    fn is_locked(&self, core: &DelegateCore) -> bool {
        core.prefs().lock_widget_drawer()
    }

    fn on_item_selected(&mut self, core: &mut DelegateCore, selected: bool) {
        core.update_state(|s| s.holding_item(selected));
    }

    fn on_create(&mut self, core: &mut DelegateCore) -> Result<()> {
        self.update_side_padding(core);
        self.try_show_handle(core);
        Ok(())
    }

    fn on_destroy(&mut self, core: &mut DelegateCore) -> Result<()> {
        self.fade = None;
        self.snap = None;
        if core.collaborators().window.remove(WindowKind::Drawer) == AttachResult::Applied {
            log_host(core.collaborators().widget_host.stop_listening(), "stop_listening");
        }
        self.attached = false;
        self.alpha = 0.0;
        self.hide_handle(core);
        Ok(())
    }

    fn on_event(&mut self, core: &mut DelegateCore, event: &Event) -> Result<()> {
        match event {
            Event::ShowDrawer => {
                self.params.x = 0;
                self.show_drawer(core, true);
            }
            Event::CloseDrawer | Event::DrawerBackButtonClick => self.hide_drawer(core, true),
            Event::ShowHandle | Event::DrawerHidden => self.try_show_handle(core),
            Event::DrawerShown => self.hide_handle(core),
            Event::ScreenOn => {
                if core.collaborators().power.is_interactive() {
                    self.try_show_handle(core);
                }
            }
            Event::ScreenOff => {
                if !core.collaborators().power.is_interactive() {
                    self.hide_all(core);
                }
            }
            Event::DrawerWidgetClick => core.update_state(|s| s.handling_click(true)),
            Event::DrawerAttachmentState { attached } => {
                self.on_attachment_changed(core, *attached)
            }
            Event::ScrollInDrawer {
                from,
                dist,
                initial,
            } => {
                self.params.gravity = *from;
                self.params.x = gesture::scroll_offset(self.params.width, *dist);

                if *initial {
                    self.handle.scrolling_open = true;
                    self.show_drawer(core, false);
                } else {
                    self.update_drawer(core);
                }
            }
            Event::ScrollOpenFinish => {
                self.handle.scrolling_open = false;
                let decision = snap_decision(self.params.width, self.params.x, &core.display());
                debug!(
                    "Drag released at x={}, snapping {}",
                    self.params.x,
                    if decision.opens { "open" } else { "closed" }
                );
                self.snap = Some(Snap {
                    transition: Transition::new(
                        self.params.x as f32,
                        decision.target_x as f32,
                        core.now(),
                        decision.easing(),
                    ),
                    opens: decision.opens,
                });
            }
            Event::RemoveWidgetConfirmed { .. } | Event::LaunchAddDrawerWidget { .. } => {}
        }
        Ok(())
    }

    fn on_widget_moved(&mut self, core: &mut DelegateCore) {
        core.update_state(|s| s.for_move(true));
    }

    fn on_widget_click(&mut self, core: &mut DelegateCore, trigger: bool) -> Result<()> {
        if trigger && core.prefs().request_unlock_drawer() {
            core.collaborators().unlocker.dismiss_or_unlock();
            core.emit(Event::CloseDrawer);
        } else {
            core.emit(Event::DrawerWidgetClick);
        }
        Ok(())
    }

    fn tick(&mut self, core: &mut DelegateCore, now: Instant) -> Result<()> {
        if let Some(snap) = self.snap {
            self.params.x = snap.transition.value_at(now).round() as i32;
            self.update_drawer(core);

            if snap.transition.is_finished(now) {
                self.snap = None;
                if snap.opens {
                    core.emit(Event::DrawerShown);
                    core.emit(Event::DrawerAttachmentState { attached: true });
                } else {
                    self.hide_drawer(core, true);
                }
            }
        }

        if let Some(fade) = self.fade {
            self.alpha = fade.transition.value_at(now);

            if fade.transition.is_finished(now) {
                self.fade = None;
                match fade.end {
                    FadeEnd::Shown => core.emit(Event::DrawerShown),
                    FadeEnd::Hide { call_listener } => self.remove_drawer(core, call_listener),
                }
            }
        }

        Ok(())
    }
}

/// Build the drawer. Only the overlay service calls this.
pub(crate) fn create_drawer(
    bus: &EventBus,
    prefs: &Preferences,
    collaborators: Collaborators,
) -> Rc<DrawerDelegate> {
    let surface = DrawerSurface::new(&collaborators.display, prefs);
    let core = DelegateCore::new(
        DrawerSurface::NAME,
        prefs,
        Box::new(PreferenceWidgetStore::new(prefs, keys::DRAWER_WIDGETS)),
        Box::new(SpannedGrid::new(1, prefs.drawer_col_count())),
        collaborators,
    );
    Delegate::new(bus, core, surface)
}

impl Delegate<DrawerSurface> {
    /// Close the drawer and start the add-widget flow
    pub fn pick_widget(&self) -> Result<()> {
        self.with_parts_mut(|p| {
            p.surface.hide_drawer(&mut p.core, true);
            p.core.emit(Event::LaunchAddDrawerWidget { from_drawer: true });
            Ok(())
        })
    }

    /// System dialogs are closing (home or recents pressed)
    pub fn close_system_dialogs(&self) -> Result<()> {
        self.with_parts_mut(|p| {
            p.surface.hide_drawer(&mut p.core, true);
            Ok(())
        })
    }

    /// The display was resized or rotated
    pub fn on_display_changed(&self, width_px: u32) -> Result<()> {
        self.with_parts_mut(|p| {
            p.surface.params.width = width_px;
            p.surface.update_drawer(&p.core);
            Ok(())
        })
    }

    pub fn can_scroll_vertically(&self) -> bool {
        self.with_parts(|p| p.surface.can_scroll_vertically(&p.core))
    }

    pub fn snapshot(&self) -> DrawerSnapshot {
        self.with_parts(|p| p.surface.snapshot(&p.core))
    }
}
