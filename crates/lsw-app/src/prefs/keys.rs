//! Preference keys and their default values

// Drawer
pub const DRAWER_ENABLED: &str = "drawer_enabled";
pub const SHOW_DRAWER_HANDLE: &str = "show_drawer_handle";
pub const DRAWER_WIDGETS: &str = "drawer_widgets";
pub const DRAWER_BACKGROUND_COLOR: &str = "drawer_background_color";
pub const DRAWER_COL_COUNT: &str = "drawer_col_count";
pub const DRAWER_WIDGET_CORNER_RADIUS: &str = "drawer_widget_corner_radius";
pub const LOCK_WIDGET_DRAWER: &str = "lock_widget_drawer";
pub const DRAWER_SIDE_PADDING: &str = "drawer_side_padding";
pub const REQUEST_UNLOCK_DRAWER: &str = "request_unlock_drawer";

// Lock screen frame
pub const FRAME_ENABLED: &str = "frame_enabled";
pub const FRAME_WIDGETS: &str = "frame_widgets";
pub const FRAME_ROW_COUNT: &str = "frame_row_count";
pub const FRAME_COL_COUNT: &str = "frame_col_count";
pub const LOCK_WIDGET_FRAME: &str = "lock_widget_frame";
pub const REQUEST_UNLOCK_FRAME: &str = "request_unlock_frame";

pub const DEFAULT_DRAWER_ENABLED: bool = true;
pub const DEFAULT_SHOW_DRAWER_HANDLE: bool = true;
/// Opaque dark grey, ARGB
pub const DEFAULT_DRAWER_BACKGROUND_COLOR: u32 = 0xFF_20_20_20;
pub const DEFAULT_DRAWER_COL_COUNT: u32 = 2;
pub const DEFAULT_DRAWER_CORNER_RADIUS_DP: f32 = 16.0;
pub const DEFAULT_DRAWER_SIDE_PADDING_DP: f32 = 0.0;

pub const DEFAULT_FRAME_ENABLED: bool = true;
pub const DEFAULT_FRAME_ROW_COUNT: u32 = 1;
pub const DEFAULT_FRAME_COL_COUNT: u32 = 1;

/// Every key the overlay surfaces react to
pub const ALL: &[&str] = &[
    DRAWER_ENABLED,
    SHOW_DRAWER_HANDLE,
    DRAWER_WIDGETS,
    DRAWER_BACKGROUND_COLOR,
    DRAWER_COL_COUNT,
    DRAWER_WIDGET_CORNER_RADIUS,
    LOCK_WIDGET_DRAWER,
    DRAWER_SIDE_PADDING,
    REQUEST_UNLOCK_DRAWER,
    FRAME_ENABLED,
    FRAME_WIDGETS,
    FRAME_ROW_COUNT,
    FRAME_COL_COUNT,
    LOCK_WIDGET_FRAME,
    REQUEST_UNLOCK_FRAME,
];
