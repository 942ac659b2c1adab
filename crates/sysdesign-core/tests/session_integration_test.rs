use approx::assert_relative_eq;
use proptest::prelude::*;
use sysdesign_core::{
    estimate, params, to_csv, toggles, AssumptionField, AssumptionSet, ConsistencyModel,
    DesignSession, ProfileCatalog, ProfileOverrides, ServiceLevels, SizingError, CSV_COLUMNS,
};

fn chat_session() -> DesignSession {
    let mut session = DesignSession::new(ProfileCatalog::builtin());
    session.select_profile("Real-Time Chat").unwrap();
    session
}

#[test]
fn test_interview_example_numbers() {
    let set = AssumptionSet {
        daily_active_users: 1_000_000,
        requests_per_user_per_day: 20,
        peak_multiplier: 2.0,
        object_size_kb: 10.0,
        replication_factor: 3,
        ..Default::default()
    };
    let metrics = estimate(&set, 80.0).unwrap();

    assert_eq!(metrics.total_daily_requests, 20_000_000.0);
    assert_relative_eq!(metrics.average_qps, 231.5, epsilon = 0.05);
    assert_relative_eq!(metrics.peak_qps, 463.0, epsilon = 0.05);
    assert_relative_eq!(metrics.read_qps, 185.2, epsilon = 0.05);
    assert_relative_eq!(metrics.write_qps, 46.3, epsilon = 0.05);
    assert_relative_eq!(metrics.storage_gb, 572.2, epsilon = 0.05);
}

#[test]
fn test_doubling_replication_doubles_storage() {
    let set = AssumptionSet::default();
    let doubled = AssumptionSet {
        replication_factor: set.replication_factor * 2,
        ..set.clone()
    };
    let base = estimate(&set, 80.0).unwrap();
    let twice = estimate(&doubled, 80.0).unwrap();
    assert_relative_eq!(twice.storage_gb, base.storage_gb * 2.0, max_relative = 1e-12);
}

#[test]
fn test_region_locking_layer_added_once() {
    let mut session = chat_session();
    for _ in 0..4 {
        session
            .override_toggle(toggles::REGION_LOCKING, true)
            .unwrap();
    }
    let layers = session.architecture_layers();
    assert_eq!(
        layers.iter().filter(|l| l.as_str() == "Geo-Sharded DB").count(),
        1
    );

    session
        .override_toggle(toggles::REGION_LOCKING, false)
        .unwrap();
    assert!(!session
        .architecture_layers()
        .iter()
        .any(|l| l == "Geo-Sharded DB"));

    session
        .override_toggle(toggles::REGION_LOCKING, true)
        .unwrap();
    assert_eq!(
        session
            .architecture_layers()
            .iter()
            .filter(|l| l.as_str() == "Geo-Sharded DB")
            .count(),
        1
    );
}

#[test]
fn test_merge_overrides_rejects_unknown_keys_atomically() {
    let mut session = chat_session();
    let mut extra = ProfileOverrides::default();
    extra.toggles.insert(toggles::USE_CDN.to_string(), true);
    extra.toggles.insert("Quantum Cache".to_string(), true);

    let err = session.merge_overrides(&extra).unwrap_err();
    assert!(matches!(err, SizingError::UnknownOverrideKey { ref key, .. } if key == "Quantum Cache"));
    assert!(!session.profile().unwrap().toggle(toggles::USE_CDN));
}

#[test]
fn test_summary_and_csv_export() {
    let mut session = chat_session();
    session
        .edit_assumption(AssumptionField::DailyActiveUsers, "2000000")
        .unwrap();
    session.set_service_levels(ServiceLevels {
        consistency: ConsistencyModel::Quorum,
        ..Default::default()
    });

    let summary = session.summary().unwrap();
    assert_eq!(summary.problem_type, "Real-Time Chat");
    assert_eq!(summary.effective_cache_hit_rate_pct, 10.0);
    assert!(!summary
        .tradeoffs
        .iter()
        .any(|t| t == "Lower availability under partition"));

    let csv = to_csv(&summary);
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
    let row = lines.next().unwrap();
    assert!(lines.next().is_none());

    assert!(row.starts_with("Real-Time Chat,2000000,"));
    assert!(row.contains(",99.99%,Quorum,"));
    let expected_layers = format!("\"{}\"", summary.architecture_layers.join(", "));
    assert!(row.contains(&expected_layers));
    assert!(row.ends_with(&format!("\"{}\"", summary.tradeoffs.join("; "))));
}

#[test]
fn test_markdown_walkthrough() {
    let mut session = chat_session();
    session
        .override_param(params::CACHE_HIT_RATE_PCT, 25.0)
        .unwrap();
    let md = session.summary().unwrap().to_markdown(Some("2026-01-01 00:00 UTC"));

    assert!(md.starts_with("# System Design Summary"));
    assert!(md.contains("_Generated 2026-01-01 00:00 UTC_"));
    assert!(md.contains("**Problem Type:** Real-Time Chat"));
    assert!(md.contains("**Cache Hit Rate:** 25%"));
    assert!(md.contains("Geo-Sharded DB"));
    assert!(md.contains("## Failure Modeling"));
    assert!(!md.contains("## Media Assumptions"));
}

proptest! {
    #[test]
    fn prop_read_write_split_sums_to_average(
        dau in 0u64..1_000_000_000,
        rpd in 0u64..10_000,
        hit in 0.0f64..=100.0,
    ) {
        let set = AssumptionSet {
            daily_active_users: dau,
            requests_per_user_per_day: rpd,
            ..Default::default()
        };
        let m = estimate(&set, hit).unwrap();
        let tolerance = 1e-9 * m.average_qps.max(1.0);
        prop_assert!((m.read_qps + m.write_qps - m.average_qps).abs() <= tolerance);
    }

    #[test]
    fn prop_peak_is_average_times_multiplier(
        dau in 0u64..1_000_000_000,
        rpd in 0u64..10_000,
        peak in 0.01f64..50.0,
    ) {
        let set = AssumptionSet {
            daily_active_users: dau,
            requests_per_user_per_day: rpd,
            peak_multiplier: peak,
            ..Default::default()
        };
        let m = estimate(&set, 80.0).unwrap();
        prop_assert_eq!(m.peak_qps, m.average_qps * peak);
    }

    #[test]
    fn prop_metrics_are_finite_and_non_negative(
        dau in 0u64..1_000_000_000,
        rpd in 0u64..10_000,
        object_kb in 0.0f64..100_000.0,
        payload_kb in 0.0f64..100_000.0,
        replication in 1u32..10,
        hit in 0.0f64..=100.0,
    ) {
        let set = AssumptionSet {
            daily_active_users: dau,
            requests_per_user_per_day: rpd,
            object_size_kb: object_kb,
            payload_size_kb: payload_kb,
            replication_factor: replication,
            ..Default::default()
        };
        let m = estimate(&set, hit).unwrap();
        for value in [
            m.total_daily_requests,
            m.average_qps,
            m.peak_qps,
            m.read_qps,
            m.write_qps,
            m.storage_gb,
            m.egress_mb_per_sec,
        ] {
            prop_assert!(value.is_finite() && value >= 0.0);
        }
    }
}
