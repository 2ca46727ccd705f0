//! Lockscreen Widgets
//!
//! Headless frontend for the overlay core in `lsw-app`: reads commands from
//! a script or stdin and writes what the overlay did as NDJSON.

pub mod headless;

pub use headless::runner::run_headless;
