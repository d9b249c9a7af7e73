//! Command-line interface for streamocr.

mod commands;
pub mod icons;
pub mod picker;
pub mod render;

pub use commands::{is_verbose, run};
