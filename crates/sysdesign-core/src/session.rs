use std::sync::Arc;

use tracing::{debug, warn};

use crate::assumptions::{AssumptionField, AssumptionSet, ServiceLevels};
use crate::brief::{DesignBrief, MediaAssumptions};
use crate::error::Result;
use crate::estimator::{estimate, DerivedMetrics};
use crate::profile::{params, ProfileCatalog, ProfileDefinition, ProfileOverrides};
use crate::rules;
use crate::summary::DesignSummary;

/// Per-user working state: the active profile, its overrides, the current
/// assumptions and the metrics last computed from them.
///
/// Every mutating operation validates before committing. A rejected edit
/// leaves the previous profile, assumptions and metrics in place.
#[derive(Debug, Clone)]
pub struct DesignSession {
    catalog: Arc<ProfileCatalog>,
    profile: Option<ProfileDefinition>,
    overrides: ProfileOverrides,
    assumptions: AssumptionSet,
    service_levels: ServiceLevels,
    brief: DesignBrief,
    media: MediaAssumptions,
    metrics: Option<DerivedMetrics>,
}

impl DesignSession {
    pub fn new(catalog: Arc<ProfileCatalog>) -> Self {
        Self::with_assumptions(catalog, AssumptionSet::default())
    }

    pub fn with_assumptions(catalog: Arc<ProfileCatalog>, assumptions: AssumptionSet) -> Self {
        Self {
            catalog,
            profile: None,
            overrides: ProfileOverrides::default(),
            assumptions,
            service_levels: ServiceLevels::default(),
            brief: DesignBrief::default(),
            media: MediaAssumptions::default(),
            metrics: None,
        }
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    pub fn profile(&self) -> Option<&ProfileDefinition> {
        self.profile.as_ref()
    }

    pub fn overrides(&self) -> &ProfileOverrides {
        &self.overrides
    }

    pub fn assumptions(&self) -> &AssumptionSet {
        &self.assumptions
    }

    pub fn service_levels(&self) -> &ServiceLevels {
        &self.service_levels
    }

    pub fn brief(&self) -> &DesignBrief {
        &self.brief
    }

    pub fn media(&self) -> &MediaAssumptions {
        &self.media
    }

    pub fn metrics(&self) -> Option<&DerivedMetrics> {
        self.metrics.as_ref()
    }

    /// Cache hit rate used for the QPS split: the active profile's param when
    /// it defines one, otherwise the assumption set's own value.
    pub fn effective_cache_hit_rate(&self) -> f64 {
        self.profile
            .as_ref()
            .and_then(ProfileDefinition::cache_hit_rate)
            .unwrap_or(self.assumptions.cache_hit_rate_pct)
    }

    /// Swap the active profile wholesale. Overrides from the previous profile are dropped.
    pub fn select_profile(&mut self, key: &str) -> Result<&DerivedMetrics> {
        let profile = self.catalog.resolve(key).inspect_err(|e| {
            warn!("Rejected profile selection: {}", e);
        })?;
        debug!(profile = %profile.name, "selected profile");
        self.commit(
            Some(profile),
            ProfileOverrides::default(),
            self.assumptions.clone(),
        )
    }

    pub fn override_toggle(&mut self, name: &str, value: bool) -> Result<&DerivedMetrics> {
        let mut overrides = self.overrides.clone();
        overrides.toggles.insert(name.to_string(), value);
        self.apply_overrides(overrides)
    }

    pub fn override_param(&mut self, name: &str, value: f64) -> Result<&DerivedMetrics> {
        let mut overrides = self.overrides.clone();
        overrides.params.insert(name.to_string(), value);
        self.apply_overrides(overrides)
    }

    /// Merge `extra` into the current overrides and re-resolve the active profile.
    pub fn merge_overrides(&mut self, extra: &ProfileOverrides) -> Result<&DerivedMetrics> {
        let mut overrides = self.overrides.clone();
        overrides
            .toggles
            .extend(extra.toggles.iter().map(|(k, v)| (k.clone(), *v)));
        overrides
            .params
            .extend(extra.params.iter().map(|(k, v)| (k.clone(), *v)));
        self.apply_overrides(overrides)
    }

    /// Drop all overrides and return to the stored profile defaults.
    pub fn reset_overrides(&mut self) -> Result<&DerivedMetrics> {
        self.apply_overrides(ProfileOverrides::default())
    }

    fn apply_overrides(&mut self, overrides: ProfileOverrides) -> Result<&DerivedMetrics> {
        let key = self
            .profile
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| crate::profile::DEFAULT_PROFILE.to_string());
        let profile = self
            .catalog
            .resolve_with(&key, &overrides)
            .inspect_err(|e| warn!("Rejected profile override: {}", e))?;
        self.commit(Some(profile), overrides, self.assumptions.clone())
    }

    /// Edit one assumption from its raw text form.
    pub fn edit_assumption(&mut self, field: AssumptionField, raw: &str) -> Result<&DerivedMetrics> {
        let mut assumptions = self.assumptions.clone();
        assumptions
            .edit(field, raw)
            .inspect_err(|e| warn!("Rejected assumption edit: {}", e))?;
        self.commit_assumptions(assumptions)
    }

    /// Replace the whole assumption set.
    pub fn set_assumptions(&mut self, assumptions: AssumptionSet) -> Result<&DerivedMetrics> {
        self.commit_assumptions(assumptions)
    }

    /// A changed cache hit rate becomes an override of the active profile's
    /// `Cache Hit Rate (%)` param when the profile defines one.
    fn commit_assumptions(&mut self, assumptions: AssumptionSet) -> Result<&DerivedMetrics> {
        let mut profile = self.profile.clone();
        let mut overrides = self.overrides.clone();

        let hit_rate = assumptions.cache_hit_rate_pct;
        if hit_rate != self.assumptions.cache_hit_rate_pct {
            if let Some(active) = profile.as_mut().filter(|p| p.cache_hit_rate().is_some()) {
                active
                    .set_param(params::CACHE_HIT_RATE_PCT, hit_rate)
                    .inspect_err(|e| warn!("Rejected assumption edit: {}", e))?;
                overrides
                    .params
                    .insert(params::CACHE_HIT_RATE_PCT.to_string(), hit_rate);
            }
        }

        self.commit(profile, overrides, assumptions)
    }

    pub fn set_service_levels(&mut self, levels: ServiceLevels) {
        self.service_levels = levels;
    }

    pub fn set_brief(&mut self, brief: DesignBrief) {
        self.brief = brief;
    }

    pub fn set_media(&mut self, media: MediaAssumptions) -> Result<()> {
        media.validate()?;
        self.media = media;
        Ok(())
    }

    /// Recompute metrics for the current state.
    pub fn recompute(&mut self) -> Result<&DerivedMetrics> {
        self.commit(
            self.profile.clone(),
            self.overrides.clone(),
            self.assumptions.clone(),
        )
    }

    /// The stored cache hit rate always mirrors the one the estimate used.
    fn commit(
        &mut self,
        profile: Option<ProfileDefinition>,
        overrides: ProfileOverrides,
        mut assumptions: AssumptionSet,
    ) -> Result<&DerivedMetrics> {
        let hit_rate = profile
            .as_ref()
            .and_then(ProfileDefinition::cache_hit_rate)
            .unwrap_or(assumptions.cache_hit_rate_pct);
        assumptions.cache_hit_rate_pct = hit_rate;
        let metrics = estimate(&assumptions, hit_rate)
            .inspect_err(|e| warn!("Keeping previous estimate: {}", e))?;

        self.profile = profile;
        self.overrides = overrides;
        self.assumptions = assumptions;
        Ok(self.metrics.insert(metrics))
    }

    /// Architecture layers for the active profile and its current toggles.
    pub fn architecture_layers(&self) -> Vec<String> {
        self.profile
            .as_ref()
            .map(rules::architecture_layers)
            .unwrap_or_default()
    }

    pub fn tradeoffs(&self) -> Vec<String> {
        self.profile
            .as_ref()
            .map(|p| rules::tradeoffs(p, self.service_levels.consistency))
            .unwrap_or_default()
    }

    /// Snapshot of everything needed to render or export. `None` until a
    /// profile is active and metrics have been computed.
    pub fn summary(&self) -> Option<DesignSummary> {
        let profile = self.profile.as_ref()?;
        let metrics = self.metrics?;
        Some(DesignSummary {
            problem_type: profile.name.clone(),
            assumptions: self.assumptions.clone(),
            effective_cache_hit_rate_pct: self.effective_cache_hit_rate(),
            metrics,
            service_levels: self.service_levels.clone(),
            toggles: profile.toggles.clone(),
            params: profile.params.clone(),
            architecture_layers: rules::architecture_layers(profile),
            tradeoffs: rules::tradeoffs(profile, self.service_levels.consistency),
            database_recommendation: profile.database_recommendation.clone(),
            rationale: profile.rationale.clone(),
            failure_modeling: profile.failure_modeling.clone(),
            brief: self.brief.clone(),
            media: self.media.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SizingError;
    use crate::profile::toggles;
    use approx::assert_relative_eq;

    fn session() -> DesignSession {
        DesignSession::new(ProfileCatalog::builtin())
    }

    #[test]
    fn test_unknown_profile_computes_nothing() {
        let mut session = session();
        let err = session.select_profile("Ride Sharing").unwrap_err();
        assert!(matches!(err, SizingError::UnknownProfile(_)));
        assert!(session.metrics().is_none());
        assert!(session.profile().is_none());
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_profile_cache_hit_rate_drives_split() {
        let mut session = session();
        let metrics = *session.select_profile("Real-Time Chat").unwrap();
        assert_relative_eq!(metrics.read_qps, metrics.average_qps * 0.1, epsilon = 1e-9);
        assert_eq!(session.effective_cache_hit_rate(), 10.0);

        let metrics = *session
            .override_param(params::CACHE_HIT_RATE_PCT, 50.0)
            .unwrap();
        assert_relative_eq!(metrics.read_qps, metrics.write_qps, epsilon = 1e-9);
    }

    #[test]
    fn test_cache_hit_rate_edit_drives_split() {
        let mut session = session();
        let before = *session.select_profile("General").unwrap();
        assert_eq!(session.assumptions().cache_hit_rate_pct, 80.0);

        let after = *session
            .edit_assumption(AssumptionField::CacheHitRate, "0")
            .unwrap();
        assert_eq!(after.read_qps, 0.0);
        assert_relative_eq!(after.write_qps, after.average_qps, epsilon = 1e-9);
        assert_relative_eq!(
            after.egress_mb_per_sec,
            before.egress_mb_per_sec / 0.2,
            max_relative = 1e-9
        );
        assert_eq!(session.effective_cache_hit_rate(), 0.0);
        assert_eq!(session.assumptions().cache_hit_rate_pct, 0.0);
        assert_eq!(
            session.overrides().params.get(params::CACHE_HIT_RATE_PCT),
            Some(&0.0)
        );

        let mut assumptions = session.assumptions().clone();
        assumptions.cache_hit_rate_pct = 50.0;
        let metrics = *session.set_assumptions(assumptions).unwrap();
        assert_relative_eq!(metrics.read_qps, metrics.write_qps, epsilon = 1e-9);
    }

    #[test]
    fn test_selected_profile_rate_shown_in_assumptions() {
        let mut session = session();
        session.select_profile("Real-Time Chat").unwrap();
        assert_eq!(session.assumptions().cache_hit_rate_pct, 10.0);
        assert_eq!(session.summary().unwrap().assumptions.cache_hit_rate_pct, 10.0);

        assert!(session
            .edit_assumption(AssumptionField::CacheHitRate, "101")
            .is_err());
        assert_eq!(session.effective_cache_hit_rate(), 10.0);
        assert!(session.overrides().is_empty());
    }

    #[test]
    fn test_failed_edit_keeps_last_valid_state() {
        let mut session = session();
        let metrics = *session.select_profile("Social Media Feed").unwrap();

        assert!(session
            .edit_assumption(AssumptionField::PeakMultiplier, "-2")
            .is_err());
        assert!(session.override_toggle("Teleport", true).is_err());
        assert!(session
            .override_param(params::CACHE_HIT_RATE_PCT, 250.0)
            .is_err());
        assert!(session.select_profile("Nope").is_err());

        assert_eq!(session.metrics(), Some(&metrics));
        assert_eq!(session.profile().unwrap().name, "Social Media Feed");
        assert!(session.overrides().is_empty());
    }

    #[test]
    fn test_switching_profile_drops_overrides() {
        let mut session = session();
        session.select_profile("Video Streaming Platform").unwrap();
        session.override_toggle(toggles::STORES_PII, true).unwrap();
        assert!(session.architecture_layers().contains(&"Vault/KMS".to_string()));

        session.select_profile("Social Media Feed").unwrap();
        assert!(session.overrides().is_empty());
        assert!(!session.architecture_layers().contains(&"Vault/KMS".to_string()));
    }

    #[test]
    fn test_overrides_do_not_leak_between_sessions() {
        let catalog = ProfileCatalog::builtin();
        let mut a = DesignSession::new(Arc::clone(&catalog));
        let mut b = DesignSession::new(Arc::clone(&catalog));
        a.select_profile("General").unwrap();
        b.select_profile("General").unwrap();

        a.override_toggle(toggles::USE_CDN, false).unwrap();
        assert!(!a.profile().unwrap().toggle(toggles::USE_CDN));
        assert!(b.profile().unwrap().toggle(toggles::USE_CDN));
        assert!(catalog.resolve("General").unwrap().toggle(toggles::USE_CDN));
    }

    #[test]
    fn test_reset_overrides() {
        let mut session = session();
        session.select_profile("General").unwrap();
        session.override_toggle(toggles::REGION_LOCKING, true).unwrap();
        session.reset_overrides().unwrap();
        assert!(!session.profile().unwrap().toggle(toggles::REGION_LOCKING));
    }
}
