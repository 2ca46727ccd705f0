//! On-screen widget list
//!
//! Holds what a surface currently displays, which can run ahead of the
//! persisted list while the user drags items around.

use lsw_core::{WidgetItem, WidgetSize};
use tracing::{debug, trace};

use crate::grid::SpanSizeLookup;

#[derive(Debug, Default, Clone)]
pub struct WidgetListModel {
    widgets: Vec<WidgetItem>,
    /// Position of the item showing its edit affordance
    editing_position: Option<usize>,
    /// Bumped whenever views must be rebound
    generation: u64,
}

impl WidgetListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widgets(&self) -> &[WidgetItem] {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn position_of(&self, id: i32) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }

    /// Replace the displayed list
    pub fn update_widgets(&mut self, widgets: Vec<WidgetItem>) {
        trace!("List model now shows {} item(s)", widgets.len());
        self.widgets = widgets;
        if self
            .editing_position
            .is_some_and(|pos| pos >= self.widgets.len())
        {
            self.editing_position = None;
        }
        self.update_views();
    }

    /// Drag reorder. Returns `false` when either position is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.widgets.len() || to >= self.widgets.len() {
            debug!(
                "Ignoring move {} -> {} in list of {}",
                from,
                to,
                self.widgets.len()
            );
            return false;
        }
        if from == to {
            return true;
        }

        let item = self.widgets.remove(from);
        self.widgets.insert(to, item);
        self.editing_position = None;
        self.update_views();
        true
    }

    pub fn editing_position(&self) -> Option<usize> {
        self.editing_position
    }

    pub fn set_editing_position(&mut self, position: Option<usize>) {
        self.editing_position = position.filter(|pos| *pos < self.widgets.len());
        self.update_views();
    }

    /// Close any open edit affordance
    pub fn clear_editing(&mut self) {
        if self.editing_position.take().is_some() {
            self.update_views();
        }
    }

    /// Request every item view to rebind
    pub fn update_views(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Lookup installed on the grid while the surface is alive
    pub fn span_size_lookup() -> SpanSizeLookup {
        Box::new(|item: &WidgetItem| -> WidgetSize { item.span() })
    }
}
