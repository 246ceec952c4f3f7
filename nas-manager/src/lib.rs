//! NAS Manager Library
//!
//! TrueNAS SCALE administration: snapshot retention and replication retry on
//! top of the v2.0 REST API.

pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use client::TrueNasClient;
pub use config::Config;
pub use utils::errors::{NasError, Result};
