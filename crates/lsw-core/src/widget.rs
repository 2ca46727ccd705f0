//! Placed widget and shortcut items

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Kind of item placed in an overlay grid.
///
/// The kind decides which platform resource is released when the item is
/// removed: a widget id goes back to the widget host, a shortcut id to the
/// shortcut id manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    #[default]
    Widget,
    Shortcut,
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetKind::Widget => write!(f, "widget"),
            WidgetKind::Shortcut => write!(f, "shortcut"),
        }
    }
}

/// Size of an item in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WidgetSize {
    pub width_span: u32,
    pub height_span: u32,
}

impl Default for WidgetSize {
    fn default() -> Self {
        Self {
            width_span: 1,
            height_span: 1,
        }
    }
}

/// One placed widget or shortcut.
///
/// Equality and hashing use the host-assigned `id` only, so an item found in
/// a persisted list matches the one carried by an event even when its
/// metadata has been refreshed since.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WidgetItem {
    /// Host-assigned id (widget id or shortcut id)
    pub id: i32,

    /// Type tag
    #[serde(default)]
    pub kind: WidgetKind,

    /// Provider component (widgets) or target intent (shortcuts)
    #[serde(default)]
    pub provider: Option<String>,

    /// Display label
    #[serde(default)]
    pub label: Option<String>,

    /// Cell span; `None` means the surface default of 1x1
    #[serde(default)]
    pub size: Option<WidgetSize>,
}

impl WidgetItem {
    pub fn widget(id: i32, provider: impl Into<String>) -> Self {
        Self {
            id,
            kind: WidgetKind::Widget,
            provider: Some(provider.into()),
            label: None,
            size: None,
        }
    }

    pub fn shortcut(id: i32, label: impl Into<String>) -> Self {
        Self {
            id,
            kind: WidgetKind::Shortcut,
            provider: None,
            label: Some(label.into()),
            size: None,
        }
    }

    pub fn with_size(mut self, width_span: u32, height_span: u32) -> Self {
        self.size = Some(WidgetSize {
            width_span,
            height_span,
        });
        self
    }

    /// Span used by the grid layout
    pub fn span(&self) -> WidgetSize {
        self.size.unwrap_or_default()
    }
}

impl PartialEq for WidgetItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WidgetItem {}

impl Hash for WidgetItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Drop later duplicates of an id, keeping first-seen order.
///
/// Returns the number of entries removed.
pub fn dedup_by_id(items: &mut Vec<WidgetItem>) -> usize {
    let before = items.len();
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.id));
    before - items.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_metadata() {
        let a = WidgetItem::widget(4, "com.example/.Clock");
        let b = WidgetItem::widget(4, "com.example/.Weather").with_size(2, 2);
        assert_eq!(a, b);
        assert_ne!(a, WidgetItem::widget(5, "com.example/.Clock"));
    }

    #[test]
    fn test_default_span_is_single_cell() {
        let item = WidgetItem::shortcut(1, "Camera");
        assert_eq!(item.span(), WidgetSize::default());
        assert_eq!(item.with_size(3, 1).span().width_span, 3);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut items = vec![
            WidgetItem::widget(1, "a"),
            WidgetItem::shortcut(2, "b"),
            WidgetItem::widget(1, "c"),
        ];
        assert_eq!(dedup_by_id(&mut items), 1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].provider.as_deref(), Some("a"));
    }

    #[test]
    fn test_deserialize_minimal_item() {
        let item: WidgetItem = serde_json::from_str(r#"{"id": 12}"#).unwrap();
        assert_eq!(item.id, 12);
        assert_eq!(item.kind, WidgetKind::Widget);
        assert!(item.size.is_none());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&WidgetKind::Shortcut).unwrap();
        assert_eq!(json, "\"shortcut\"");
    }
}
