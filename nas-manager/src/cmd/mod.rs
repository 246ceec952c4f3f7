//! Subcommand handlers. Results go to stdout, logs to stderr.

pub mod dataset;
pub mod health;
pub mod pool;
pub mod replication;
pub mod snapshot;
pub mod system;

use chrono::{DateTime, Local, Utc};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GIB)
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
