//! Overlay lifecycle through the public service API

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use lsw_app::collaborators::{Collaborators, DisplayMetrics, ManualClock, WindowKind};
use lsw_app::prefs::keys;
use lsw_app::{EventBus, EventObserver, OverlayService, OverlayState, Preferences, SimulatedPlatform};
use lsw_core::{Event, Result, WidgetItem};

#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<&'static str>>,
}

impl EventObserver for Recorder {
    fn name(&self) -> &str {
        "test-recorder"
    }

    fn on_event(&self, event: &Event) -> Result<()> {
        self.seen.borrow_mut().push(event.event_type());
        Ok(())
    }
}

struct Harness {
    service: OverlayService,
    platform: Rc<SimulatedPlatform>,
    clock: Rc<ManualClock>,
    recorder: Rc<Recorder>,
}

impl Harness {
    fn new() -> Self {
        let prefs = Preferences::in_memory();
        prefs
            .set(
                keys::DRAWER_WIDGETS,
                &vec![
                    WidgetItem::widget(1, "clock"),
                    WidgetItem::widget(2, "weather"),
                    WidgetItem::shortcut(3, "torch"),
                ],
            )
            .unwrap();
        prefs.dispatch_pending().unwrap();

        let platform = Rc::new(SimulatedPlatform::new());
        let clock = Rc::new(ManualClock::new());
        let collaborators =
            Collaborators::from_platform(platform.clone(), clock.clone(), DisplayMetrics::default());

        let bus = EventBus::new();
        let recorder = Rc::new(Recorder::default());
        bus.add_observer(&recorder);

        let mut service = OverlayService::new(&bus, &prefs, collaborators);
        service.on_service_connected().unwrap();

        Self {
            service,
            platform,
            clock,
            recorder,
        }
    }

    fn run_for(&self, ms: u64) {
        for _ in 0..ms / 16 + 1 {
            let now = self.clock.advance(Duration::from_millis(16));
            self.service.tick(now).unwrap();
        }
    }

    fn seen(&self) -> Vec<&'static str> {
        self.recorder.seen.borrow_mut().drain(..).collect()
    }
}

#[test]
fn test_drawer_opens_and_closes() {
    let h = Harness::new();
    h.seen();

    h.service.send(Event::ShowDrawer).unwrap();
    h.run_for(200);

    let drawer = h.service.drawer().unwrap();
    assert!(h.platform.is_attached(WindowKind::Drawer));
    assert!(drawer.snapshot().attached);
    assert!(h.seen().contains(&"drawer_shown"));

    h.service.send(Event::CloseDrawer).unwrap();
    h.run_for(200);

    assert!(!h.platform.is_attached(WindowKind::Drawer));
    assert!(!drawer.snapshot().attached);
    assert_eq!(drawer.state(), OverlayState::default());
    assert!(h.seen().contains(&"drawer_hidden"));
}

#[test]
fn test_frame_follows_keyguard() {
    let h = Harness::new();
    assert!(h.platform.is_attached(WindowKind::Frame));

    h.platform.set_keyguard_locked(false);
    h.service.on_keyguard_changed().unwrap();
    assert!(!h.platform.is_attached(WindowKind::Frame));

    h.platform.set_keyguard_locked(true);
    h.service.on_keyguard_changed().unwrap();
    assert!(h.platform.is_attached(WindowKind::Frame));
}

#[test]
fn test_destroy_persists_reordered_widgets() {
    let mut h = Harness::new();
    let prefs = h.service.prefs().clone();

    let drawer = h.service.drawer().unwrap();
    assert!(drawer.move_widget(0, 2).unwrap());
    drop(drawer);

    h.service.on_destroy().unwrap();

    let order: Vec<i32> = prefs
        .widget_list(keys::DRAWER_WIDGETS)
        .iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(order, vec![2, 3, 1]);
    assert!(!h.platform.is_attached(WindowKind::Drawer));
    assert!(!h.platform.is_attached(WindowKind::Frame));
    assert_eq!(h.service.bus().observer_count(), 1);
}
