//! Utility modules for the NAS manager.

pub mod errors;
pub mod logger;
pub mod size;
pub mod time;

pub use errors::{NasError, Result};
