//! Capacity estimation: traffic, storage and bandwidth from an [`AssumptionSet`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assumptions::{check_percent, AssumptionField, AssumptionSet};
use crate::error::Result;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const KB_PER_MB: f64 = 1024.0;
pub const KB_PER_GB: f64 = 1024.0 * 1024.0;

/// Derived load figures for one set of assumptions.
///
/// `read_qps` and `write_qps` split `average_qps` by the cache hit rate:
/// every cache hit is counted as a read and every miss as a write. This is a
/// modeling shortcut, not a measured read/write ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DerivedMetrics {
    pub total_daily_requests: f64,
    pub average_qps: f64,
    pub peak_qps: f64,
    pub read_qps: f64,
    pub write_qps: f64,
    pub storage_gb: f64,
    pub egress_mb_per_sec: f64,
}

/// Compute [`DerivedMetrics`] for `assumptions` with the active cache hit rate.
///
/// Either every metric is produced or the call fails with `InvalidInput`.
pub fn estimate(assumptions: &AssumptionSet, cache_hit_rate_pct: f64) -> Result<DerivedMetrics> {
    assumptions.validate()?;
    check_percent(AssumptionField::CacheHitRate, cache_hit_rate_pct)?;

    let hit_ratio = cache_hit_rate_pct / 100.0;
    let miss_ratio = 1.0 - hit_ratio;

    let dau = assumptions.daily_active_users as f64;
    let per_user = assumptions.requests_per_user_per_day as f64;

    let total_daily_requests = dau * per_user;
    let average_qps = total_daily_requests / SECONDS_PER_DAY;
    let peak_qps = average_qps * assumptions.peak_multiplier;
    let read_qps = average_qps * hit_ratio;
    let write_qps = average_qps * miss_ratio;

    let storage_kb = total_daily_requests
        * assumptions.object_size_kb
        * f64::from(assumptions.replication_factor);
    let storage_gb = storage_kb / KB_PER_GB;

    let egress_mb_per_sec = ((average_qps * assumptions.payload_size_kb * miss_ratio) / KB_PER_MB)
        * assumptions.egress_overhead_factor;

    let metrics = DerivedMetrics {
        total_daily_requests,
        average_qps,
        peak_qps,
        read_qps,
        write_qps,
        storage_gb,
        egress_mb_per_sec,
    };
    debug!(
        average_qps = metrics.average_qps,
        peak_qps = metrics.peak_qps,
        storage_gb = metrics.storage_gb,
        "estimated capacity"
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SizingError;
    use approx::assert_relative_eq;

    fn interview_defaults() -> AssumptionSet {
        AssumptionSet {
            daily_active_users: 1_000_000,
            requests_per_user_per_day: 20,
            peak_multiplier: 2.0,
            object_size_kb: 10.0,
            replication_factor: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_qps_breakdown() {
        let metrics = estimate(&interview_defaults(), 80.0).unwrap();

        assert_relative_eq!(metrics.total_daily_requests, 20_000_000.0);
        assert_relative_eq!(metrics.average_qps, 231.481, epsilon = 1e-3);
        assert_relative_eq!(metrics.peak_qps, 462.963, epsilon = 1e-3);
        assert_relative_eq!(metrics.read_qps, 185.185, epsilon = 1e-3);
        assert_relative_eq!(metrics.write_qps, 46.296, epsilon = 1e-3);
    }

    #[test]
    fn test_replicated_storage() {
        let metrics = estimate(&interview_defaults(), 80.0).unwrap();
        // 600,000,000 KB across three replicas
        assert_relative_eq!(metrics.storage_gb, 572.204, epsilon = 1e-3);
    }

    #[test]
    fn test_egress_only_counts_cache_misses() {
        let mut set = interview_defaults();
        set.payload_size_kb = 10.0;
        set.egress_overhead_factor = 1.5;

        let metrics = estimate(&set, 80.0).unwrap();
        let expected = (metrics.average_qps * 10.0 * 0.2 / 1024.0) * 1.5;
        assert_relative_eq!(metrics.egress_mb_per_sec, expected, epsilon = 1e-9);

        let all_hits = estimate(&set, 100.0).unwrap();
        assert_eq!(all_hits.egress_mb_per_sec, 0.0);
        assert_eq!(all_hits.write_qps, 0.0);
    }

    #[test]
    fn test_zero_traffic_is_all_zero() {
        let set = AssumptionSet {
            daily_active_users: 0,
            ..Default::default()
        };
        let metrics = estimate(&set, 50.0).unwrap();
        assert_eq!(metrics.average_qps, 0.0);
        assert_eq!(metrics.storage_gb, 0.0);
        assert_eq!(metrics.egress_mb_per_sec, 0.0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(matches!(
            estimate(&interview_defaults(), 101.0),
            Err(SizingError::InvalidInput { .. })
        ));
        assert!(estimate(&interview_defaults(), -0.5).is_err());
        assert!(estimate(&interview_defaults(), f64::NAN).is_err());

        let mut set = interview_defaults();
        set.peak_multiplier = 0.0;
        assert!(estimate(&set, 80.0).is_err());

        let mut set = interview_defaults();
        set.replication_factor = 0;
        assert!(estimate(&set, 80.0).is_err());

        let mut set = interview_defaults();
        set.object_size_kb = -10.0;
        assert!(estimate(&set, 80.0).is_err());
    }
}
