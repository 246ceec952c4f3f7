use serde::{Deserialize, Serialize};

/// A storage pool from `GET pool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub allocated: u64,
    #[serde(default)]
    pub healthy: bool,
}

fn default_status() -> String {
    "UNKNOWN".to_string()
}

impl Pool {
    /// Allocated share of the pool in percent, `None` for zero-sized pools.
    pub fn usage_pct(&self) -> Option<f64> {
        if self.size == 0 {
            return None;
        }
        Some(self.allocated as f64 / self.size as f64 * 100.0)
    }

    pub fn free(&self) -> u64 {
        self.size.saturating_sub(self.allocated)
    }
}

/// Subset of `GET system/info` used for connection checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime_seconds: f64,
    #[serde(default)]
    pub system_product: Option<String>,
    #[serde(default)]
    pub system_manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub cores: Option<u32>,
    #[serde(default)]
    pub physmem: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_pct() {
        let pool: Pool = serde_json::from_value(json!({
            "name": "tank", "status": "ONLINE", "size": 1000, "allocated": 850, "healthy": true
        }))
        .unwrap();
        assert_eq!(pool.usage_pct(), Some(85.0));
        assert_eq!(pool.free(), 150);
    }

    #[test]
    fn test_zero_sized_pool() {
        let pool: Pool = serde_json::from_value(json!({"name": "offline"})).unwrap();
        assert_eq!(pool.status, "UNKNOWN");
        assert_eq!(pool.usage_pct(), None);
    }
}
