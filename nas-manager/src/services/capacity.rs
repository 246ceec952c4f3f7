use serde::Serialize;

use crate::models::Pool;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityAlert {
    pub pool: String,
    pub usage_pct: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub status: String,
}

/// Pools at or above `threshold` percent allocation. Zero-sized pools are
/// skipped.
pub fn capacity_alerts(pools: &[Pool], threshold: f64) -> Vec<CapacityAlert> {
    pools
        .iter()
        .filter_map(|pool| {
            let usage_pct = pool.usage_pct()?;
            (usage_pct >= threshold).then(|| CapacityAlert {
                pool: pool.name.clone(),
                usage_pct,
                used_bytes: pool.allocated,
                total_bytes: pool.size,
                status: pool.status.clone(),
            })
        })
        .collect()
}
