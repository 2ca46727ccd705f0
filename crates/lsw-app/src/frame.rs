//! Lock-screen widget frame
//!
//! A fixed grid of widgets drawn over the lock screen. It is visible while
//! the frame is enabled, the screen is on and the keyguard is locked.

use std::rc::Rc;

use lsw_core::prelude::*;
use lsw_core::{Event, Gravity};
use serde::Serialize;

use crate::bus::EventBus;
use crate::collaborators::{AttachResult, Collaborators, DisplayMetrics, WindowKind, WindowParams};
use crate::delegate::{Delegate, DelegateCore, Parts, Surface};
use crate::grid::{GridCounts, SpannedGrid};
use crate::prefs::{keys, HandlerRegistry, Preferences};
use crate::store::PreferenceWidgetStore;

pub type FrameDelegate = Delegate<FrameSurface>;

#[derive(Debug)]
pub struct FrameSurface {
    params: WindowParams,
    attached: bool,
    /// Shown regardless of the keyguard while the settings screen previews it
    preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSnapshot {
    pub attached: bool,
    pub rows: u32,
    pub columns: u32,
    pub locked: bool,
    pub preview: bool,
}

impl FrameSurface {
    fn new(display: &DisplayMetrics) -> Self {
        Self {
            params: WindowParams {
                x: 0,
                gravity: Gravity::Left,
                width: display.width_px,
            },
            attached: false,
            preview: false,
        }
    }

    fn should_show(&self, core: &DelegateCore) -> bool {
        let power = &core.collaborators().power;
        core.prefs().frame_enabled()
            && (self.preview || (power.is_interactive() && power.is_keyguard_locked()))
    }

    /// Add or remove the window to match the current conditions
    fn update_visibility(&mut self, core: &mut DelegateCore) {
        if self.should_show(core) {
            self.show(core);
        } else {
            self.hide(core);
        }
    }

    fn show(&mut self, core: &mut DelegateCore) {
        match core.collaborators().window.add(WindowKind::Frame, &self.params) {
            AttachResult::Applied => {
                debug!("Frame window added");
                self.attached = true;
                core.list_mut().update_views();
            }
            AttachResult::Unchanged => self.attached = true,
            AttachResult::NotReady => debug!("Window manager not ready, frame not shown"),
        }
    }

    fn hide(&mut self, core: &mut DelegateCore) {
        match core.collaborators().window.remove(WindowKind::Frame) {
            AttachResult::Applied => {
                debug!("Frame window removed");
                self.attached = false;
                core.update_state(|s| s.handling_click(false));
                core.list_mut().clear_editing();
            }
            AttachResult::Unchanged => self.attached = false,
            AttachResult::NotReady => debug!("Window manager not ready, frame not hidden"),
        }
    }

    fn snapshot(&self, core: &DelegateCore) -> FrameSnapshot {
        FrameSnapshot {
            attached: self.attached,
            rows: core.grid().row_count(),
            columns: core.grid().column_count(),
            locked: core.prefs().lock_widget_frame(),
            preview: self.preview,
        }
    }
}

impl Surface for FrameSurface {
    const NAME: &'static str = "frame";

    fn handlers() -> HandlerRegistry<Parts<Self>> {
        HandlerRegistry::new()
            .handler(keys::FRAME_ENABLED, |p: &mut Parts<Self>| {
                p.surface.update_visibility(&mut p.core);
                Ok(())
            })
            .handler(keys::FRAME_WIDGETS, |p: &mut Parts<Self>| {
                if p.core.state().updated_for_move {
                    p.core.update_state(|s| s.for_move(false));
                } else {
                    p.core.reload_widgets();
                }
                Ok(())
            })
            .handler(keys::FRAME_ROW_COUNT, |p: &mut Parts<Self>| {
                p.update_counts();
                Ok(())
            })
            .handler(keys::FRAME_COL_COUNT, |p: &mut Parts<Self>| {
                p.update_counts();
                Ok(())
            })
            .handler(keys::LOCK_WIDGET_FRAME, |p: &mut Parts<Self>| {
                p.core.list_mut().clear_editing();
                Ok(())
            })
    }

    fn retrieve_counts(&self, core: &DelegateCore) -> GridCounts {
        let prefs = core.prefs();
        GridCounts::new(Some(prefs.frame_row_count()), Some(prefs.frame_col_count()))
    }

    fn is_locked(&self, core: &DelegateCore) -> bool {
        core.prefs().lock_widget_frame()
    }

    fn on_item_selected(&mut self, core: &mut DelegateCore, selected: bool) {
        core.update_state(|s| s.holding_item(selected));
    }

    fn on_create(&mut self, core: &mut DelegateCore) -> Result<()> {
        self.update_visibility(core);
        Ok(())
    }

    fn on_destroy(&mut self, core: &mut DelegateCore) -> Result<()> {
        self.hide(core);
        Ok(())
    }

    fn on_event(&mut self, core: &mut DelegateCore, event: &Event) -> Result<()> {
        match event {
            Event::ScreenOn => self.update_visibility(core),
            Event::ScreenOff => {
                if !self.preview && !core.collaborators().power.is_interactive() {
                    self.hide(core);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_widget_moved(&mut self, core: &mut DelegateCore) {
        core.update_state(|s| s.for_move(true));
    }

    fn on_widget_click(&mut self, core: &mut DelegateCore, trigger: bool) -> Result<()> {
        if trigger && core.prefs().request_unlock_frame() {
            core.collaborators().unlocker.dismiss_or_unlock();
        } else {
            core.update_state(|s| s.handling_click(true));
        }
        Ok(())
    }
}

/// Build the frame. Only the overlay service calls this.
pub(crate) fn create_frame(
    bus: &EventBus,
    prefs: &Preferences,
    collaborators: Collaborators,
) -> Rc<FrameDelegate> {
    let surface = FrameSurface::new(&collaborators.display);
    let core = DelegateCore::new(
        FrameSurface::NAME,
        prefs,
        Box::new(PreferenceWidgetStore::new(prefs, keys::FRAME_WIDGETS)),
        Box::new(SpannedGrid::new(prefs.frame_row_count(), prefs.frame_col_count())),
        collaborators,
    );
    Delegate::new(bus, core, surface)
}

impl Delegate<FrameSurface> {
    /// Re-check visibility after the keyguard was locked or dismissed
    pub fn on_keyguard_changed(&self) -> Result<()> {
        self.with_parts_mut(|p| {
            p.surface.update_visibility(&mut p.core);
            Ok(())
        })
    }

    /// Force the frame on screen while `preview` is set, even when unlocked
    pub fn set_preview(&self, preview: bool) -> Result<()> {
        self.with_parts_mut(|p| {
            p.surface.preview = preview;
            p.surface.update_visibility(&mut p.core);
            Ok(())
        })
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        self.with_parts(|p| p.surface.snapshot(&p.core))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ManualClock;
    use crate::platform::{PlatformCall, SimulatedPlatform};
    use lsw_core::WidgetItem;

    struct Harness {
        bus: EventBus,
        prefs: Preferences,
        platform: Rc<SimulatedPlatform>,
        frame: Rc<FrameDelegate>,
    }

    fn harness() -> Harness {
        let prefs = Preferences::in_memory();
        prefs
            .set_widget_list(
                keys::FRAME_WIDGETS,
                &[WidgetItem::widget(1, "clock"), WidgetItem::widget(2, "music")],
            )
            .unwrap();
        prefs.dispatch_pending().unwrap();

        let platform = Rc::new(SimulatedPlatform::new());
        let collaborators = Collaborators::from_platform(
            platform.clone(),
            Rc::new(ManualClock::new()),
            DisplayMetrics::default(),
        );
        let bus = EventBus::new();
        let frame = create_frame(&bus, &prefs, collaborators);
        frame.on_create().unwrap();

        Harness {
            bus,
            prefs,
            platform,
            frame,
        }
    }

    impl Harness {
        fn set<T: Serialize>(&self, key: &str, value: T) {
            self.prefs.set(key, &value).unwrap();
            self.prefs.dispatch_pending().unwrap();
        }
    }

    #[test]
    fn test_shown_on_locked_screen() {
        let h = harness();
        assert!(h.platform.is_attached(WindowKind::Frame));
        assert!(h.frame.snapshot().attached);
    }

    #[test]
    fn test_hidden_after_unlock() {
        let h = harness();

        h.platform.set_keyguard_locked(false);
        h.frame.on_keyguard_changed().unwrap();
        assert!(!h.platform.is_attached(WindowKind::Frame));

        h.platform.set_keyguard_locked(true);
        h.frame.on_keyguard_changed().unwrap();
        assert!(h.platform.is_attached(WindowKind::Frame));
    }

    #[test]
    fn test_preview_shows_frame_while_unlocked() {
        let h = harness();
        h.platform.set_keyguard_locked(false);
        h.frame.on_keyguard_changed().unwrap();
        assert!(!h.platform.is_attached(WindowKind::Frame));

        h.frame.set_preview(true).unwrap();
        assert!(h.platform.is_attached(WindowKind::Frame));
        assert!(h.frame.snapshot().preview);

        h.frame.set_preview(false).unwrap();
        assert!(!h.platform.is_attached(WindowKind::Frame));
    }

    #[test]
    fn test_preview_still_respects_enabled_flag() {
        let h = harness();
        h.set(keys::FRAME_ENABLED, false);

        h.frame.set_preview(true).unwrap();
        assert!(!h.platform.is_attached(WindowKind::Frame));
    }

    #[test]
    fn test_screen_off_and_on() {
        let h = harness();

        h.platform.set_interactive(false);
        h.bus.send(Event::ScreenOff).unwrap();
        assert!(!h.frame.snapshot().attached);

        h.platform.set_interactive(true);
        h.bus.send(Event::ScreenOn).unwrap();
        assert!(h.frame.snapshot().attached);
    }

    #[test]
    fn test_disabling_removes_window() {
        let h = harness();

        h.set(keys::FRAME_ENABLED, false);
        assert!(!h.platform.is_attached(WindowKind::Frame));

        // Screen on does not bring a disabled frame back
        h.bus.send(Event::ScreenOn).unwrap();
        assert!(!h.platform.is_attached(WindowKind::Frame));
    }

    #[test]
    fn test_counts_follow_preferences() {
        let h = harness();
        assert_eq!(h.frame.snapshot().rows, keys::DEFAULT_FRAME_ROW_COUNT);

        h.set(keys::FRAME_ROW_COUNT, 3u32);
        h.set(keys::FRAME_COL_COUNT, 2u32);

        let snapshot = h.frame.snapshot();
        assert_eq!((snapshot.rows, snapshot.columns), (3, 2));
    }

    #[test]
    fn test_lock_blocks_reorder() {
        let h = harness();
        h.set(keys::LOCK_WIDGET_FRAME, true);

        assert!(!h.frame.move_widget(0, 1).unwrap());
        assert!(!h.frame.begin_editing(0).unwrap());
    }

    #[test]
    fn test_reorder_is_persisted_without_reload() {
        let h = harness();

        assert!(h.frame.move_widget(1, 0).unwrap());
        h.prefs.dispatch_pending().unwrap();

        let order: Vec<i32> = h.prefs.widget_list(keys::FRAME_WIDGETS).iter().map(|w| w.id).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(!h.frame.state().updated_for_move);
    }

    #[test]
    fn test_trigger_click_unlocks_when_requested() {
        let h = harness();

        h.frame.on_widget_click(true).unwrap();
        assert!(h.frame.state().handling_click);
        assert!(!h.platform.calls().contains(&PlatformCall::Unlock));

        h.set(keys::REQUEST_UNLOCK_FRAME, true);
        h.frame.on_widget_click(true).unwrap();
        assert!(h.platform.calls().contains(&PlatformCall::Unlock));
    }

    #[test]
    fn test_destroy_removes_window() {
        let h = harness();
        h.frame.on_destroy().unwrap();

        assert!(!h.platform.is_attached(WindowKind::Frame));
        assert_eq!(h.bus.observer_count(), 0);
        assert_eq!(h.prefs.listener_count(), 0);
    }
}
