//! Grid layout configuration for overlay surfaces

use lsw_core::{WidgetItem, WidgetSize};
use serde::Serialize;
use tracing::warn;

/// Maps an item to its cell span
pub type SpanSizeLookup = Box<dyn Fn(&WidgetItem) -> WidgetSize>;

/// Row and column counts requested by a surface. `None` leaves that axis as
/// it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GridCounts {
    pub rows: Option<u32>,
    pub columns: Option<u32>,
}

impl GridCounts {
    pub fn new(rows: Option<u32>, columns: Option<u32>) -> Self {
        Self { rows, columns }
    }

    pub fn columns(columns: u32) -> Self {
        Self {
            rows: None,
            columns: Some(columns),
        }
    }
}

pub trait GridLayout {
    fn row_count(&self) -> u32;
    fn set_row_count(&mut self, rows: u32);
    fn column_count(&self) -> u32;
    fn set_column_count(&mut self, columns: u32);

    /// Install (or clear, with `None`) the span lookup
    fn set_span_size_lookup(&mut self, lookup: Option<SpanSizeLookup>);
    fn has_span_size_lookup(&self) -> bool;

    /// Span of `item`, never wider than the grid
    fn span_of(&self, item: &WidgetItem) -> WidgetSize;
}

/// Grid with per-item spans
pub struct SpannedGrid {
    rows: u32,
    columns: u32,
    lookup: Option<SpanSizeLookup>,
}

impl Default for SpannedGrid {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 1,
            lookup: None,
        }
    }
}

impl std::fmt::Debug for SpannedGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpannedGrid")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

impl SpannedGrid {
    pub fn new(rows: u32, columns: u32) -> Self {
        let mut grid = Self::default();
        grid.set_row_count(rows);
        grid.set_column_count(columns);
        grid
    }
}

fn at_least_one(axis: &str, value: u32) -> u32 {
    if value == 0 {
        warn!("Ignoring {} count of 0, using 1", axis);
        1
    } else {
        value
    }
}

impl GridLayout for SpannedGrid {
    fn row_count(&self) -> u32 {
        self.rows
    }

    fn set_row_count(&mut self, rows: u32) {
        self.rows = at_least_one("row", rows);
    }

    fn column_count(&self) -> u32 {
        self.columns
    }

    fn set_column_count(&mut self, columns: u32) {
        self.columns = at_least_one("column", columns);
    }

    fn set_span_size_lookup(&mut self, lookup: Option<SpanSizeLookup>) {
        self.lookup = lookup;
    }

    fn has_span_size_lookup(&self) -> bool {
        self.lookup.is_some()
    }

    fn span_of(&self, item: &WidgetItem) -> WidgetSize {
        let span = match &self.lookup {
            Some(lookup) => lookup(item),
            None => WidgetSize::default(),
        };
        WidgetSize {
            width_span: span.width_span.clamp(1, self.columns),
            height_span: span.height_span.max(1),
        }
    }
}
