//! Engine - the owner loop's state
//!
//! The engine owns the message channel, the overlay service, the simulated
//! platform, the manual clock, the preference watcher and the settings. A
//! frontend feeds it [`Message`]s and drains the [`EngineEvent`]s each one
//! produced.
//!
//! Everything here is `!Send` and stays on the thread that created the
//! engine. Background tasks only hold the [`mpsc::Sender`].

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use lsw_core::prelude::*;
use lsw_core::Event;
use tokio::sync::mpsc;

use crate::bus::{EventBus, EventObserver};
use crate::collaborators::{Clock, Collaborators, ManualClock};
use crate::command::{Command, Target};
use crate::config::{self, Settings};
use crate::delegate::{Delegate, Surface};
use crate::engine_event::{EngineEvent, StateReport, SurfaceReport};
use crate::message::Message;
use crate::platform::SimulatedPlatform;
use crate::prefs::{PreferenceWatcher, Preferences};
use crate::service::OverlayService;

/// Capacity of the message channel
const CHANNEL_CAPACITY: usize = 256;

/// Step used when `tick` advances the clock
const FRAME: Duration = Duration::from_millis(16);

type EventLog = Rc<RefCell<Vec<EngineEvent>>>;

/// Records every bus event as it is sent
struct BusRecorder {
    events: EventLog,
}

impl EventObserver for BusRecorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(&self, event: &Event) -> Result<()> {
        self.events.borrow_mut().push(EngineEvent::Bus(event.clone()));
        Ok(())
    }
}

/// Operation a command applies to one surface
#[derive(Debug, Clone, Copy)]
enum SurfaceOp {
    Move { from: usize, to: usize },
    Hold(bool),
    Edit(usize),
    Remove(i32),
    Click { trigger: bool },
}

pub struct Engine {
    /// Sender half of the message channel. Clone this for input sources.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half, drained by the frontend loop
    pub msg_rx: mpsc::Receiver<Message>,

    pub settings: Settings,

    pub project_path: PathBuf,

    service: OverlayService,
    platform: Rc<SimulatedPlatform>,
    clock: Rc<ManualClock>,
    events: EventLog,
    _recorder: Rc<BusRecorder>,
    watcher: Option<PreferenceWatcher>,
    quit: bool,
}

impl Engine {
    /// Create an engine for a project directory.
    ///
    /// - Initializes `.lsw/` (non-fatal if it fails)
    /// - Loads settings from `.lsw/config.toml`
    /// - Opens the preference file
    /// - Connects the overlay service if configured to
    pub fn new(project_path: PathBuf) -> Result<Self> {
        if let Err(e) = config::init_config_dir(&project_path) {
            warn!("Failed to initialize .lsw directory: {}", e);
        }
        let settings = config::load_settings(&project_path);
        Self::with_settings(project_path, settings)
    }

    pub fn with_settings(project_path: PathBuf, settings: Settings) -> Result<Self> {
        let (msg_tx, msg_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let prefs = Preferences::open(config::preferences_path(&project_path, &settings));
        let platform = Rc::new(SimulatedPlatform::new());
        let clock = Rc::new(ManualClock::new());
        let collaborators = Collaborators::from_platform(
            platform.clone(),
            clock.clone(),
            settings.display.metrics(),
        );

        // The recorder goes first so it sees events in the order they were sent
        let bus = EventBus::new();
        let events: EventLog = Rc::default();
        let recorder = Rc::new(BusRecorder {
            events: events.clone(),
        });
        bus.add_observer(&recorder);

        let service = OverlayService::new(&bus, &prefs, collaborators);

        let mut engine = Self {
            msg_tx,
            msg_rx,
            settings,
            project_path,
            service,
            platform,
            clock,
            events,
            _recorder: recorder,
            watcher: None,
            quit: false,
        };

        if engine.settings.behavior.connect_on_start {
            engine.connect()?;
            engine.collect_platform_calls();
        }

        Ok(engine)
    }

    /// Start watching the preference file. Needs a tokio runtime.
    pub fn start_watcher(&mut self) {
        if !self.settings.preferences.watch || self.watcher.is_some() {
            return;
        }
        let path = config::preferences_path(&self.project_path, &self.settings);
        let mut watcher =
            PreferenceWatcher::new(path).with_debounce_ms(self.settings.preferences.debounce_ms);
        match watcher.start(self.msg_tx.clone()) {
            Ok(()) => self.watcher = Some(watcher),
            Err(e) => warn!("Preference watcher not started: {}", e),
        }
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn service(&self) -> &OverlayService {
        &self.service
    }

    pub fn platform(&self) -> &SimulatedPlatform {
        &self.platform
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Handle one message. Failures are reported as [`EngineEvent::Error`].
    pub fn process_message(&mut self, msg: Message) {
        match msg {
            Message::Command { line, command } => {
                debug!("Line {}: {}", line, command.name());
                if let Err(e) = self.execute(line, command) {
                    self.report_error(Some(line), &e);
                }
            }
            Message::InvalidCommand { line, message } => {
                let e = Error::command(line, message);
                self.report_error(Some(line), &e);
            }
            Message::PreferencesChanged => match self.service.reload_preferences() {
                Ok(keys) if !keys.is_empty() => {
                    self.push(EngineEvent::PreferencesReloaded { keys });
                }
                Ok(_) => trace!("Preference file unchanged"),
                Err(e) => self.report_error(None, &e),
            },
            Message::WatcherError { message } => {
                warn!("Preference watcher: {}", message);
                self.push(EngineEvent::Error {
                    line: None,
                    message,
                    fatal: false,
                });
            }
            Message::InputClosed => {
                info!("Input closed");
                self.quit = true;
            }
            Message::Quit => self.quit = true,
        }
        self.collect_platform_calls();
    }

    /// Take everything reported since the last drain
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Stop the watcher and tear the overlay down
    pub fn shutdown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if self.service.is_running() {
            if let Err(e) = self.disconnect() {
                self.report_error(None, &e);
            }
        }
        self.collect_platform_calls();
        self.push(EngineEvent::Shutdown);
    }

    pub fn state_report(&self) -> StateReport {
        StateReport {
            running: self.service.is_running(),
            drawer: self
                .service
                .drawer()
                .ok()
                .map(|drawer| surface_report(&*drawer, drawer.snapshot())),
            frame: self
                .service
                .frame()
                .ok()
                .map(|frame| surface_report(&*frame, frame.snapshot())),
            pending_confirmation: self.platform.pending_confirmation().map(|item| item.id),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────

    fn execute(&mut self, line: usize, command: Command) -> Result<()> {
        match command {
            Command::ScreenOn => {
                self.platform.set_interactive(true);
                self.service.send(Event::ScreenOn)
            }
            Command::ScreenOff => {
                self.platform.set_interactive(false);
                self.service.send(Event::ScreenOff)
            }
            Command::Lock => {
                self.platform.set_keyguard_locked(true);
                self.service.on_keyguard_changed()
            }
            Command::Unlock => {
                self.platform.set_keyguard_locked(false);
                self.service.on_keyguard_changed()
            }
            Command::Preview { shown } => self.service.frame()?.set_preview(shown),
            Command::Show => self.send_to_drawer(Event::ShowDrawer),
            Command::Close => self.send_to_drawer(Event::CloseDrawer),
            Command::Back => self.send_to_drawer(Event::DrawerBackButtonClick),
            Command::Handle => self.send_to_drawer(Event::ShowHandle),
            Command::Scroll {
                dist,
                initial,
                from,
            } => self.send_to_drawer(Event::ScrollInDrawer {
                from,
                dist,
                initial,
            }),
            Command::Release => self.send_to_drawer(Event::ScrollOpenFinish),
            Command::Move { target, from, to } => {
                self.on_surface(line, target, SurfaceOp::Move { from, to })
            }
            Command::Hold { target, held } => self.on_surface(line, target, SurfaceOp::Hold(held)),
            Command::Edit { target, position } => {
                self.on_surface(line, target, SurfaceOp::Edit(position))
            }
            Command::Remove { target, id } => self.on_surface(line, target, SurfaceOp::Remove(id)),
            Command::Click { target, trigger } => {
                self.on_surface(line, target, SurfaceOp::Click { trigger })
            }
            Command::Confirm { remove } => {
                let item = self
                    .platform
                    .take_pending_confirmation()
                    .ok_or_else(|| Error::command(line, "no removal awaiting confirmation"))?;
                self.service.send(Event::remove_confirmed(Some(item), remove))
            }
            Command::Add => {
                self.service.drawer()?.pick_widget()?;
                self.service.settle()
            }
            Command::Set { key, value } => {
                self.service.prefs().set_value(&key, value)?;
                self.service.settle()
            }
            Command::Tick { ms } => self.advance(Duration::from_millis(ms)),
            Command::State => {
                let report = self.state_report();
                self.push(EngineEvent::State(Box::new(report)));
                Ok(())
            }
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect(),
            Command::Quit => {
                self.quit = true;
                Ok(())
            }
        }
    }

    fn send_to_drawer(&self, event: Event) -> Result<()> {
        // Drawer events only make sense while it exists
        self.service.drawer()?;
        self.service.send(event)
    }

    fn on_surface(&self, line: usize, target: Target, op: SurfaceOp) -> Result<()> {
        match target {
            Target::Drawer => apply_op(line, &*self.service.drawer()?, op)?,
            Target::Frame => apply_op(line, &*self.service.frame()?, op)?,
        }
        self.service.settle()
    }

    /// Move the clock forward frame by frame, ticking transitions
    fn advance(&self, by: Duration) -> Result<()> {
        let mut remaining = by;
        while !remaining.is_zero() {
            let step = remaining.min(FRAME);
            self.clock.advance(step);
            self.service.tick(self.clock.now())?;
            remaining -= step;
        }
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let was_running = self.service.is_running();
        self.service.on_service_connected()?;
        if !was_running {
            self.push(EngineEvent::ServiceConnected);
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.service.is_running() {
            return Err(Error::ServiceNotRunning);
        }
        self.service.on_destroy()?;
        self.push(EngineEvent::ServiceDestroyed);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Reporting
    // ─────────────────────────────────────────────────────────

    fn push(&self, event: EngineEvent) {
        self.events.borrow_mut().push(event);
    }

    fn report_error(&mut self, line: Option<usize>, e: &Error) {
        warn!("{}", e);
        let fatal = e.is_fatal();
        self.push(EngineEvent::Error {
            line,
            message: e.to_string(),
            fatal,
        });
        if fatal || (self.settings.behavior.strict && line.is_some()) {
            self.quit = true;
        }
    }

    fn collect_platform_calls(&self) {
        let calls = self.platform.take_calls();
        if self.settings.behavior.report_platform_calls {
            self.events
                .borrow_mut()
                .extend(calls.into_iter().map(EngineEvent::Platform));
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }
}

fn apply_op<S: Surface>(line: usize, delegate: &Delegate<S>, op: SurfaceOp) -> Result<()> {
    match op {
        SurfaceOp::Move { from, to } => {
            if !delegate.move_widget(from, to)? {
                info!("{}: move {} -> {} had no effect", delegate.name(), from, to);
            }
        }
        SurfaceOp::Hold(held) => delegate.select_item(held)?,
        SurfaceOp::Edit(position) => {
            if !delegate.begin_editing(position)? {
                info!("{}: cannot edit position {}", delegate.name(), position);
            }
        }
        SurfaceOp::Remove(id) => {
            if !delegate.remove_widget(id)? {
                return Err(Error::command(
                    line,
                    format!("{} has no widget {}", delegate.name(), id),
                ));
            }
        }
        SurfaceOp::Click { trigger } => delegate.on_widget_click(trigger)?,
    }
    Ok(())
}

fn surface_report<S: Surface, T>(delegate: &Delegate<S>, surface: T) -> SurfaceReport<T> {
    SurfaceReport {
        state: delegate.state(),
        widgets: delegate.displayed_widgets().iter().map(|w| w.id).collect(),
        surface,
    }
}
