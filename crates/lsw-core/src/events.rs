//! Overlay event definitions
//!
//! The closed set of signals carried by the event bus between overlay
//! surfaces, the overlay service and external collaborators (confirmation UI,
//! add-widget flow).

use serde::{Deserialize, Serialize};

use crate::widget::WidgetItem;

/// Screen edge a gesture or window is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    #[default]
    Left,
    Right,
}

impl std::fmt::Display for Gravity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gravity::Left => write!(f, "left"),
            Gravity::Right => write!(f, "right"),
        }
    }
}

/// Events exchanged through the bus.
///
/// Values are immutable and carry only what their handlers need.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // ─────────────────────────────────────────────────────────
    // Drawer Visibility
    // ─────────────────────────────────────────────────────────
    /// Open the drawer fully
    ShowDrawer,

    /// Close the drawer with a fade
    CloseDrawer,

    /// Show the drawer handle if it is allowed to be visible
    ShowHandle,

    /// Drawer finished its open transition
    DrawerShown,

    /// Drawer window was removed
    DrawerHidden,

    /// Back button pressed while the drawer had focus
    DrawerBackButtonClick,

    /// A widget inside the drawer was tapped
    DrawerWidgetClick,

    /// Drawer window attached to or detached from the window manager
    DrawerAttachmentState { attached: bool },

    // ─────────────────────────────────────────────────────────
    // Swipe-to-open Gesture
    // ─────────────────────────────────────────────────────────
    /// Drag from the handle, `dist` pixels travelled from the `from` edge
    ScrollInDrawer {
        from: Gravity,
        dist: f32,
        initial: bool,
    },

    /// Drag released; the drawer snaps open or closed from its current offset
    ScrollOpenFinish,

    // ─────────────────────────────────────────────────────────
    // Power State
    // ─────────────────────────────────────────────────────────
    ScreenOn,
    ScreenOff,

    // ─────────────────────────────────────────────────────────
    // Widget Management
    // ─────────────────────────────────────────────────────────
    /// Answer from the removal confirmation UI
    RemoveWidgetConfirmed {
        item: Option<WidgetItem>,
        remove: bool,
    },

    /// Ask the external add-widget flow to start
    LaunchAddDrawerWidget { from_drawer: bool },
}

impl Event {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ShowDrawer => "show_drawer",
            Self::CloseDrawer => "close_drawer",
            Self::ShowHandle => "show_handle",
            Self::DrawerShown => "drawer_shown",
            Self::DrawerHidden => "drawer_hidden",
            Self::DrawerBackButtonClick => "drawer_back_button_click",
            Self::DrawerWidgetClick => "drawer_widget_click",
            Self::DrawerAttachmentState { .. } => "drawer_attachment_state",
            Self::ScrollInDrawer { .. } => "scroll_in_drawer",
            Self::ScrollOpenFinish => "scroll_open_finish",
            Self::ScreenOn => "screen_on",
            Self::ScreenOff => "screen_off",
            Self::RemoveWidgetConfirmed { .. } => "remove_widget_confirmed",
            Self::LaunchAddDrawerWidget { .. } => "launch_add_drawer_widget",
        }
    }

    /// Convenience constructor for the confirmation UI answer
    pub fn remove_confirmed(item: Option<WidgetItem>, remove: bool) -> Self {
        Self::RemoveWidgetConfirmed { item, remove }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_labels_are_snake_case() {
        let events = vec![
            Event::ShowDrawer,
            Event::CloseDrawer,
            Event::ShowHandle,
            Event::DrawerShown,
            Event::DrawerHidden,
            Event::DrawerBackButtonClick,
            Event::DrawerWidgetClick,
            Event::DrawerAttachmentState { attached: true },
            Event::ScrollInDrawer {
                from: Gravity::Left,
                dist: 10.0,
                initial: true,
            },
            Event::ScrollOpenFinish,
            Event::ScreenOn,
            Event::ScreenOff,
            Event::remove_confirmed(None, false),
            Event::LaunchAddDrawerWidget { from_drawer: true },
        ];

        for event in events {
            let label = event.event_type();
            assert!(!label.is_empty());
            assert_eq!(label, label.to_lowercase());
            assert!(!label.contains(' '));
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(Event::DrawerAttachmentState { attached: false }).unwrap();
        assert_eq!(json["type"], "drawer_attachment_state");
        assert_eq!(json["attached"], false);
    }

    #[test]
    fn test_remove_confirmed_parses_null_item() {
        let event: Event =
            serde_json::from_str(r#"{"type":"remove_widget_confirmed","item":null,"remove":true}"#)
                .unwrap();
        assert_eq!(event, Event::remove_confirmed(None, true));
    }

    #[test]
    fn test_scroll_event_parses_gravity() {
        let event: Event = serde_json::from_str(
            r#"{"type":"scroll_in_drawer","from":"right","dist":42.5,"initial":false}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::ScrollInDrawer {
                from: Gravity::Right,
                dist: 42.5,
                initial: false
            }
        );
    }
}
