//! Overlay delegate: the state machine shared by every overlay surface
//!
//! A [`Delegate`] pairs the common [`DelegateCore`] (widget list, grid, list
//! model, interaction state) with a [`Surface`] that adds what is specific
//! to one overlay (drawer, lock-screen frame). The delegate is the observer
//! registered with the event bus and the preference store; for every input
//! it runs the core handling first and then the surface hook.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --on_create--> Created --on_destroy--> Destroyed
//! ```
//!
//! While created, every bus event and preference change is handled with
//! exclusive access to the delegate's state. Events a handler wants to send
//! are queued on the core and sent once that access has been released, so
//! depth-first dispatch never re-enters a borrowed delegate.

use std::cell::{Cell, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::time::Instant;

use lsw_core::prelude::*;
use lsw_core::{dedup_by_id, Event, WidgetItem, WidgetKind};

use crate::bus::{EventBus, EventObserver, ObserverId};
use crate::collaborators::{Collaborators, DisplayMetrics};
use crate::grid::{GridCounts, GridLayout};
use crate::list_model::WidgetListModel;
use crate::prefs::{HandlerRegistry, PreferenceListener, Preferences};
use crate::state::OverlayState;
use crate::store::WidgetListStore;


/// Behaviour specific to one overlay surface.
///
/// Hooks receive the shared core so they can read and update common state;
/// the core's own handling has already run when a hook is called.
pub trait Surface: Sized + 'static {
    /// Name used in logs and errors
    const NAME: &'static str;

    /// Preference bindings for this surface
    fn handlers() -> HandlerRegistry<Parts<Self>>;

    /// Grid dimensions this surface wants. `None` leaves an axis untouched.
    fn retrieve_counts(&self, core: &DelegateCore) -> GridCounts;

    /// Whether drag reordering is disabled
    fn is_locked(&self, core: &DelegateCore) -> bool;

    /// An item was picked up (`true`) or dropped (`false`)
    fn on_item_selected(&mut self, core: &mut DelegateCore, selected: bool);

    fn on_create(&mut self, _core: &mut DelegateCore) -> Result<()> {
        Ok(())
    }

    fn on_destroy(&mut self, _core: &mut DelegateCore) -> Result<()> {
        Ok(())
    }

    fn on_event(&mut self, _core: &mut DelegateCore, _event: &Event) -> Result<()> {
        Ok(())
    }

    /// The list model order was committed after a drag
    fn on_widget_moved(&mut self, _core: &mut DelegateCore) {}

    /// Called after the core handled a removal answer. `position` is the
    /// item's index in the list before removal, `None` if it was absent.
    fn widget_removal_confirmed(
        &mut self,
        _core: &mut DelegateCore,
        _item: Option<&WidgetItem>,
        _remove: bool,
        _position: Option<usize>,
    ) {
    }

    /// A hosted widget was clicked; `trigger` marks clicks that launch
    /// something.
    fn on_widget_click(&mut self, core: &mut DelegateCore, _trigger: bool) -> Result<()> {
        core.update_state(|s| s.handling_click(true));
        Ok(())
    }

    /// Advance time-driven transitions
    fn tick(&mut self, _core: &mut DelegateCore, _now: Instant) -> Result<()> {
        Ok(())
    }
}

/// Everything a preference handler can touch
pub struct Parts<S> {
    pub core: DelegateCore,
    pub surface: S,
}

impl<S: Surface> Parts<S> {
    /// Re-apply the surface's grid dimensions
    pub fn update_counts(&mut self) {
        let counts = self.surface.retrieve_counts(&self.core);
        self.core.update_counts(counts);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Core
// ─────────────────────────────────────────────────────────────────────────────

/// State and operations shared by every surface
pub struct DelegateCore {
    name: &'static str,
    state: OverlayState,
    current_widgets: Vec<WidgetItem>,
    list: WidgetListModel,
    grid: Box<dyn GridLayout>,
    store: Box<dyn WidgetListStore>,
    prefs: Preferences,
    collaborators: Collaborators,
    outbox: Vec<Event>,
}

impl std::fmt::Debug for DelegateCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateCore")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("current_widgets", &self.current_widgets.len())
            .field("outbox", &self.outbox)
            .finish_non_exhaustive()
    }
}

impl DelegateCore {
    pub fn new(
        name: &'static str,
        prefs: &Preferences,
        store: Box<dyn WidgetListStore>,
        grid: Box<dyn GridLayout>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            name,
            state: OverlayState::default(),
            current_widgets: Vec::new(),
            list: WidgetListModel::new(),
            grid,
            store,
            prefs: prefs.clone(),
            collaborators,
            outbox: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Replace the state with `transform(state)` in one step
    pub fn update_state(&mut self, transform: impl FnOnce(OverlayState) -> OverlayState) {
        let new_state = transform(self.state);
        if new_state != self.state {
            debug!(
                surface = self.name,
                "Updating state from {:?} to {:?}", self.state, new_state
            );
        }
        self.state = new_state;
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn display(&self) -> DisplayMetrics {
        self.collaborators.display
    }

    pub fn now(&self) -> Instant {
        self.collaborators.clock.now()
    }

    pub fn list(&self) -> &WidgetListModel {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut WidgetListModel {
        &mut self.list
    }

    pub fn grid(&self) -> &dyn GridLayout {
        self.grid.as_ref()
    }

    pub fn grid_mut(&mut self) -> &mut dyn GridLayout {
        self.grid.as_mut()
    }

    // ─────────────────────────────────────────────────────────
    // Widget list
    // ─────────────────────────────────────────────────────────

    /// Last committed widget list
    pub fn current_widgets(&self) -> &[WidgetItem] {
        &self.current_widgets
    }

    /// Commit and persist a widget list. A failed write is logged; the
    /// in-memory list stays authoritative until the next reload.
    pub fn set_current_widgets(&mut self, mut widgets: Vec<WidgetItem>) {
        let dropped = dedup_by_id(&mut widgets);
        if dropped > 0 {
            warn!(
                surface = self.name,
                "Dropped {} duplicate widget id(s) before saving", dropped
            );
        }
        if let Err(e) = self.store.save(&widgets) {
            warn!(surface = self.name, "Failed to persist widget list: {}", e);
        }
        self.current_widgets = widgets;
    }

    /// Re-read the persisted list and show it
    pub fn reload_widgets(&mut self) {
        self.current_widgets = self.store.load();
        self.list.update_widgets(self.current_widgets.clone());
    }

    pub fn widgets_key(&self) -> &str {
        self.store.key()
    }

    // ─────────────────────────────────────────────────────────
    // Outgoing events
    // ─────────────────────────────────────────────────────────

    /// Queue an event to send once the current handler returns
    pub fn emit(&mut self, event: Event) {
        self.outbox.push(event);
    }

    fn take_outbox(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // ─────────────────────────────────────────────────────────
    // Shared handling
    // ─────────────────────────────────────────────────────────

    /// Apply the non-`None` axes of `counts` to the grid
    pub fn update_counts(&mut self, counts: GridCounts) {
        if let Some(rows) = counts.rows {
            self.grid.set_row_count(rows);
        }
        if let Some(columns) = counts.columns {
            self.grid.set_column_count(columns);
        }
    }

    /// Handle a removal answer. Returns the item's index in the list before
    /// removal.
    pub fn remove_confirmed(&mut self, item: Option<&WidgetItem>, remove: bool) -> Option<usize> {
        let position = item.and_then(|item| self.current_widgets.iter().position(|w| w == item));

        let (Some(item), Some(index), true) = (item, position, remove) else {
            return position;
        };

        let mut widgets = self.current_widgets.clone();
        widgets.remove(index);
        match item.kind {
            WidgetKind::Widget => self.collaborators.widget_host.delete_widget_id(item.id),
            WidgetKind::Shortcut => self.collaborators.shortcuts.remove_shortcut_id(item.id),
        }
        info!(surface = self.name, "Removed {} {}", item.kind, item.id);

        self.set_current_widgets(widgets);
        self.list.clear_editing();
        self.list.update_widgets(self.current_widgets.clone());

        position
    }

    /// Commit the list model's order after a drag
    pub fn widget_moved(&mut self) {
        let order = self.list.widgets().to_vec();
        self.set_current_widgets(order);
        self.list.clear_editing();
    }

    fn attach(&mut self) {
        self.grid
            .set_span_size_lookup(Some(WidgetListModel::span_size_lookup()));
        self.reload_widgets();
    }

    fn detach(&mut self) {
        let order = self.list.widgets().to_vec();
        self.set_current_widgets(order);
        self.grid.set_span_size_lookup(None);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delegate
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Created,
    Destroyed,
}

/// A surface wired to the bus and the preference store
pub struct Delegate<S: Surface> {
    self_ref: Weak<Self>,
    bus: EventBus,
    prefs: Preferences,
    handlers: HandlerRegistry<Parts<S>>,
    observer: Cell<Option<ObserverId>>,
    lifecycle: Cell<Lifecycle>,
    parts: RefCell<Parts<S>>,
}

impl<S: Surface> std::fmt::Debug for Delegate<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegate")
            .field("surface", &S::NAME)
            .field("lifecycle", &self.lifecycle.get())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Delegate<S> {
    pub fn new(bus: &EventBus, core: DelegateCore, surface: S) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            bus: bus.clone(),
            prefs: core.prefs.clone(),
            handlers: S::handlers(),
            observer: Cell::new(None),
            lifecycle: Cell::new(Lifecycle::Uninitialized),
            parts: RefCell::new(Parts { core, surface }),
        })
    }

    pub fn name(&self) -> &'static str {
        S::NAME
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn is_created(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Created
    }

    /// Register with the bus and preferences, load the persisted list and
    /// apply grid counts.
    pub fn on_create(&self) -> Result<()> {
        if self.lifecycle.get() != Lifecycle::Uninitialized {
            return Err(Error::lifecycle(
                S::NAME,
                format!("on_create called while {:?}", self.lifecycle.get()),
            ));
        }

        {
            let mut parts = self.parts_mut()?;

            let listener: Weak<dyn PreferenceListener> = self.self_ref.clone();
            self.handlers.register(&self.prefs, listener);
            let observer: Weak<dyn EventObserver> = self.self_ref.clone();
            self.observer.set(Some(self.bus.add_observer_weak(observer)));

            parts.core.attach();
            parts.update_counts();

            let Parts { core, surface } = &mut *parts;
            if let Err(e) = surface.on_create(core) {
                drop(parts);
                self.release_registrations();
                return Err(e);
            }
        }

        self.lifecycle.set(Lifecycle::Created);
        info!("{} created", S::NAME);
        self.flush()
    }

    /// Undo every registration and persist the on-screen order.
    pub fn on_destroy(&self) -> Result<()> {
        self.ensure_created("on_destroy")?;
        self.release_registrations();

        {
            let mut parts = self.parts_mut()?;
            parts.core.detach();
            let Parts { core, surface } = &mut *parts;
            surface.on_destroy(core)?;
        }

        self.lifecycle.set(Lifecycle::Destroyed);
        info!("{} destroyed", S::NAME);
        self.flush()
    }

    fn release_registrations(&self) {
        if let Some(id) = self.observer.take() {
            self.bus.remove_observer(id);
        }
        self.handlers.unregister(&self.prefs);
    }

    fn ensure_created(&self, operation: &str) -> Result<()> {
        if self.is_created() {
            Ok(())
        } else {
            Err(Error::lifecycle(
                S::NAME,
                format!("{} called while {:?}", operation, self.lifecycle.get()),
            ))
        }
    }

    fn parts_mut(&self) -> Result<RefMut<'_, Parts<S>>> {
        self.parts
            .try_borrow_mut()
            .map_err(|_| Error::lifecycle(S::NAME, "re-entrant call while handling another input"))
    }

    /// Send events queued by the last handler
    fn flush(&self) -> Result<()> {
        let events = self.parts_mut()?.core.take_outbox();
        for event in events {
            self.bus.send(event)?;
        }
        Ok(())
    }

    /// Run `f` with exclusive access, then send whatever it queued
    pub(crate) fn with_parts_mut<R>(&self, f: impl FnOnce(&mut Parts<S>) -> Result<R>) -> Result<R> {
        let result = {
            let mut parts = self.parts_mut()?;
            f(&mut *parts)?
        };
        self.flush()?;
        Ok(result)
    }

    /// Read-only view of the delegate
    pub fn with_parts<R>(&self, f: impl FnOnce(&Parts<S>) -> R) -> R {
        f(&self.parts.borrow())
    }

    // ─────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────

    pub fn state(&self) -> OverlayState {
        self.parts.borrow().core.state()
    }

    /// `None` while the delegate is busy handling an input
    #[cfg(test)]
    pub(crate) fn try_state(&self) -> Option<OverlayState> {
        self.parts.try_borrow().ok().map(|parts| parts.core.state())
    }

    pub fn update_state(&self, transform: impl FnOnce(OverlayState) -> OverlayState) -> Result<()> {
        self.parts_mut()?.core.update_state(transform);
        Ok(())
    }

    pub fn current_widgets(&self) -> Vec<WidgetItem> {
        self.parts.borrow().core.current_widgets().to_vec()
    }

    /// What the list model currently shows
    pub fn displayed_widgets(&self) -> Vec<WidgetItem> {
        self.parts.borrow().core.list().widgets().to_vec()
    }

    // ─────────────────────────────────────────────────────────
    // Interaction
    // ─────────────────────────────────────────────────────────

    pub fn update_counts(&self) -> Result<()> {
        self.with_parts_mut(|parts| {
            parts.update_counts();
            Ok(())
        })
    }

    /// Drag callback. `moved` is `false` when the drop left the order as it
    /// was.
    pub fn on_widget_moved(&self, moved: bool) -> Result<()> {
        self.ensure_created("on_widget_moved")?;
        if !moved {
            return Ok(());
        }
        self.with_parts_mut(|parts| {
            let Parts { core, surface } = parts;
            core.widget_moved();
            surface.on_widget_moved(core);
            Ok(())
        })
    }

    /// Drag one item to a new position and commit the order. Refused while
    /// the surface is locked.
    pub fn move_widget(&self, from: usize, to: usize) -> Result<bool> {
        self.ensure_created("move_widget")?;
        let moved = self.with_parts_mut(|parts| {
            if parts.surface.is_locked(&parts.core) {
                debug!("{} is locked, ignoring move", S::NAME);
                return Ok(false);
            }
            Ok(parts.core.list_mut().move_item(from, to) && from != to)
        })?;
        self.on_widget_moved(moved)?;
        Ok(moved)
    }

    pub fn select_item(&self, selected: bool) -> Result<()> {
        self.ensure_created("select_item")?;
        self.with_parts_mut(|parts| {
            let Parts { core, surface } = parts;
            surface.on_item_selected(core, selected);
            Ok(())
        })
    }

    /// Open the edit affordance on `position`. Refused while locked.
    pub fn begin_editing(&self, position: usize) -> Result<bool> {
        self.ensure_created("begin_editing")?;
        self.with_parts_mut(|parts| {
            if parts.surface.is_locked(&parts.core) {
                return Ok(false);
            }
            parts.core.list_mut().set_editing_position(Some(position));
            Ok(parts.core.list().editing_position() == Some(position))
        })
    }

    /// Ask the user to confirm removing the item with `id`. Returns `false`
    /// if no such item is shown.
    pub fn remove_widget(&self, id: i32) -> Result<bool> {
        self.ensure_created("remove_widget")?;
        self.with_parts_mut(|parts| {
            let item = parts.core.current_widgets().iter().find(|w| w.id == id).cloned();
            match item {
                Some(item) => {
                    parts.core.collaborators().confirmation.show(&item);
                    Ok(true)
                }
                None => {
                    debug!("{}: no widget {} to remove", S::NAME, id);
                    Ok(false)
                }
            }
        })
    }

    pub fn on_widget_click(&self, trigger: bool) -> Result<()> {
        self.ensure_created("on_widget_click")?;
        self.with_parts_mut(|parts| {
            let Parts { core, surface } = parts;
            surface.on_widget_click(core, trigger)
        })
    }

    pub fn tick(&self, now: Instant) -> Result<()> {
        if !self.is_created() {
            return Ok(());
        }
        self.with_parts_mut(|parts| {
            let Parts { core, surface } = parts;
            surface.tick(core, now)
        })
    }
}

impl<S: Surface> EventObserver for Delegate<S> {
    fn name(&self) -> &str {
        S::NAME
    }

    fn on_event(&self, event: &Event) -> Result<()> {
        {
            let mut parts = self.parts_mut()?;
            let Parts { core, surface } = &mut *parts;

            if let Event::RemoveWidgetConfirmed { item, remove } = event {
                let position = core.remove_confirmed(item.as_ref(), *remove);
                surface.widget_removal_confirmed(core, item.as_ref(), *remove, position);
            }

            surface.on_event(core, event)?;
        }
        self.flush()
    }
}

impl<S: Surface> PreferenceListener for Delegate<S> {
    fn on_preference_changed(&self, key: &str) -> Result<()> {
        if !self.handlers.handles(key) {
            return Ok(());
        }
        {
            let mut parts = self.parts_mut()?;
            trace!("{} handling preference '{}'", S::NAME, key);
            self.handlers.dispatch(&mut *parts, key)?;
        }
        self.flush()
    }
}

impl<S: Surface> Drop for Delegate<S> {
    fn drop(&mut self) {
        self.release_registrations();
    }
}
