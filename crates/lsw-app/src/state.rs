//! Overlay interaction state

use serde::Serialize;

/// Interaction flags shared by every overlay surface.
///
/// A plain value: delegates replace it wholesale through
/// `Delegate::update_state`, so no reader ever sees half an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OverlayState {
    /// A widget is currently picked up for dragging
    pub is_holding_item: bool,

    /// The last widget-list write came from a reorder; the next change
    /// notification for the list must not reload it
    pub updated_for_move: bool,

    /// A widget click is being handled (suppresses re-entrant clicks)
    pub handling_click: bool,
}

impl OverlayState {
    pub fn holding_item(self, is_holding_item: bool) -> Self {
        Self {
            is_holding_item,
            ..self
        }
    }

    pub fn for_move(self, updated_for_move: bool) -> Self {
        Self {
            updated_for_move,
            ..self
        }
    }

    pub fn handling_click(self, handling_click: bool) -> Self {
        Self {
            handling_click,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_change_one_flag() {
        let state = OverlayState::default().holding_item(true);
        assert!(state.is_holding_item);
        assert!(!state.updated_for_move);
        assert!(!state.handling_click);

        let state = state.for_move(true).handling_click(true).holding_item(false);
        assert_eq!(
            state,
            OverlayState {
                is_holding_item: false,
                updated_for_move: true,
                handling_click: true,
            }
        );
    }
}
