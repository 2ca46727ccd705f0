//! # lsw-core - Core Domain Types
//!
//! Foundation crate for Lockscreen Widgets. Provides domain types, error
//! handling, the overlay event set and logging initialization.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Widgets (`widget`)
//! - [`WidgetItem`] - One placed widget or shortcut, equal by id
//! - [`WidgetKind`] - Widget vs shortcut type tag
//! - [`WidgetSize`] - Cell span of an item
//!
//! ### Events (`events`)
//! - [`Event`] - Closed set of bus events
//! - [`Gravity`] - Screen edge for gestures and window placement
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use lsw_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod prelude;
pub mod widget;

pub use error::{Error, Result, ResultExt};
pub use events::{Event, Gravity};
pub use widget::{dedup_by_id, WidgetItem, WidgetKind, WidgetSize};
