//! Swipe-to-open geometry
//!
//! The drawer window is as wide as the screen and slides in from one edge.
//! Its horizontal offset `x` is `0` when fully open and `-width` when fully
//! off-screen.

use crate::collaborators::DisplayMetrics;
use crate::transition::Easing;

/// Distance a drag must cover for the drawer to open on release
pub const OPEN_THRESHOLD_DP: f32 = 100.0;

/// Window offset after a drag of `dist` px from the edge
pub fn scroll_offset(width: u32, dist: f32) -> i32 {
    let distance_from_edge = width as f32 - dist;
    -(distance_from_edge as i32)
}

/// How far the drawer has travelled onto the screen
pub fn visible_distance(width: u32, x: i32) -> u32 {
    (width as i64 + x as i64).unsigned_abs() as u32
}

/// Where the drawer settles when the drag is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapDecision {
    pub opens: bool,
    pub target_x: i32,
}

impl SnapDecision {
    pub fn easing(&self) -> Easing {
        if self.opens {
            Easing::Decelerate
        } else {
            Easing::Accelerate
        }
    }
}

/// Open when strictly more than [`OPEN_THRESHOLD_DP`] is on screen
pub fn snap_decision(width: u32, x: i32, display: &DisplayMetrics) -> SnapDecision {
    let threshold = display.dp_to_px(OPEN_THRESHOLD_DP).max(0) as u32;
    let opens = visible_distance(width, x) > threshold;
    SnapDecision {
        opens,
        target_x: if opens { 0 } else { -(width as i32) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> DisplayMetrics {
        DisplayMetrics {
            width_px: 1080,
            density: 2.0,
            status_bar_height_px: 0,
        }
    }

    #[test]
    fn test_scroll_offset_tracks_finger() {
        assert_eq!(scroll_offset(1080, 0.0), -1080);
        assert_eq!(scroll_offset(1080, 300.0), -780);
        assert_eq!(scroll_offset(1080, 1080.0), 0);
        // Truncates toward zero like the window manager's integer offset
        assert_eq!(scroll_offset(1080, 300.7), -779);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 100dp at density 2 is 200px
        let at = snap_decision(1080, scroll_offset(1080, 200.0), &display());
        assert!(!at.opens);
        assert_eq!(at.target_x, -1080);
        assert_eq!(at.easing(), Easing::Accelerate);

        let past = snap_decision(1080, scroll_offset(1080, 201.0), &display());
        assert!(past.opens);
        assert_eq!(past.target_x, 0);
        assert_eq!(past.easing(), Easing::Decelerate);
    }

    #[test]
    fn test_visible_distance_is_absolute() {
        assert_eq!(visible_distance(1080, -1080), 0);
        assert_eq!(visible_distance(1080, 0), 1080);
        assert_eq!(visible_distance(100, -300), 200);
    }
}
