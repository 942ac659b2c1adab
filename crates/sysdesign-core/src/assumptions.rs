use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SizingError};

/// User-editable traffic and storage assumptions.
///
/// Every field starts from a seed value (see [`Default`]) and is replaced
/// field by field through [`AssumptionSet::edit`]. The set is only ever
/// committed when [`AssumptionSet::validate`] accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssumptionSet {
    pub daily_active_users: u64,
    pub requests_per_user_per_day: u64,
    pub payload_size_kb: f64,
    pub object_size_kb: f64,
    pub replication_factor: u32,
    pub peak_multiplier: f64,
    /// Also used as the read ratio when splitting QPS. Inside a session this
    /// tracks the active profile's `Cache Hit Rate (%)` param.
    pub cache_hit_rate_pct: f64,
    pub egress_overhead_factor: f64,
    pub ingress_overhead_factor: f64,
    pub total_users: u64,
    pub retention_days: u32,
    pub session_length_min: f64,
    pub think_time_sec: f64,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            daily_active_users: 1_000_000,
            requests_per_user_per_day: 20,
            payload_size_kb: 10.0,
            object_size_kb: 10.0,
            replication_factor: 3,
            peak_multiplier: 2.0,
            cache_hit_rate_pct: 80.0,
            egress_overhead_factor: 1.0,
            ingress_overhead_factor: 1.0,
            total_users: 10_000_000,
            retention_days: 180,
            session_length_min: 15.0,
            think_time_sec: 5.0,
        }
    }
}

impl AssumptionSet {
    pub fn validate(&self) -> Result<()> {
        if self.replication_factor < 1 {
            return Err(SizingError::invalid(
                AssumptionField::ReplicationFactor.name(),
                "must be at least 1",
            ));
        }
        check_positive(AssumptionField::PeakMultiplier, self.peak_multiplier)?;
        check_percent(AssumptionField::CacheHitRate, self.cache_hit_rate_pct)?;
        check_non_negative(AssumptionField::PayloadSize, self.payload_size_kb)?;
        check_non_negative(AssumptionField::ObjectSize, self.object_size_kb)?;
        check_positive(AssumptionField::EgressOverhead, self.egress_overhead_factor)?;
        check_positive(AssumptionField::IngressOverhead, self.ingress_overhead_factor)?;
        check_non_negative(AssumptionField::SessionLength, self.session_length_min)?;
        check_non_negative(AssumptionField::ThinkTime, self.think_time_sec)?;
        Ok(())
    }

    /// Parse `raw` into `field` and commit it only if the whole set stays valid.
    pub fn edit(&mut self, field: AssumptionField, raw: &str) -> Result<()> {
        let mut candidate = self.clone();
        field.assign(&mut candidate, raw)?;
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

pub(crate) fn check_non_negative(field: impl fmt::Display, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SizingError::invalid(
            field.to_string(),
            format!("must be a finite number >= 0, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(field: impl fmt::Display, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SizingError::invalid(
            field.to_string(),
            format!("must be a finite number > 0, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_percent(field: impl fmt::Display, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(SizingError::invalid(
            field.to_string(),
            format!("must be between 0 and 100, got {value}"),
        ));
    }
    Ok(())
}

/// Addressable fields of an [`AssumptionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionField {
    DailyActiveUsers,
    RequestsPerUser,
    PayloadSize,
    ObjectSize,
    ReplicationFactor,
    PeakMultiplier,
    CacheHitRate,
    EgressOverhead,
    IngressOverhead,
    TotalUsers,
    RetentionDays,
    SessionLength,
    ThinkTime,
}

impl AssumptionField {
    pub const ALL: [AssumptionField; 13] = [
        Self::DailyActiveUsers,
        Self::RequestsPerUser,
        Self::PayloadSize,
        Self::ObjectSize,
        Self::ReplicationFactor,
        Self::PeakMultiplier,
        Self::CacheHitRate,
        Self::EgressOverhead,
        Self::IngressOverhead,
        Self::TotalUsers,
        Self::RetentionDays,
        Self::SessionLength,
        Self::ThinkTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DailyActiveUsers => "dau",
            Self::RequestsPerUser => "requests_per_user",
            Self::PayloadSize => "payload_kb",
            Self::ObjectSize => "object_kb",
            Self::ReplicationFactor => "replication",
            Self::PeakMultiplier => "peak_multiplier",
            Self::CacheHitRate => "cache_hit_rate",
            Self::EgressOverhead => "egress_overhead",
            Self::IngressOverhead => "ingress_overhead",
            Self::TotalUsers => "total_users",
            Self::RetentionDays => "retention_days",
            Self::SessionLength => "session_length_min",
            Self::ThinkTime => "think_time_sec",
        }
    }

    /// Human label used in rendered summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DailyActiveUsers => "Daily Active Users (DAU)",
            Self::RequestsPerUser => "Requests per User per Day",
            Self::PayloadSize => "Payload Size (KB)",
            Self::ObjectSize => "Avg Object Size (KB)",
            Self::ReplicationFactor => "Replication Factor",
            Self::PeakMultiplier => "Peak Traffic Multiplier",
            Self::CacheHitRate => "Cache Hit Rate (%)",
            Self::EgressOverhead => "Egress Overhead Factor",
            Self::IngressOverhead => "Ingress Overhead Factor",
            Self::TotalUsers => "Number of Users",
            Self::RetentionDays => "Retention Period (days)",
            Self::SessionLength => "Avg. Session Length (min)",
            Self::ThinkTime => "Think Time Between Actions (sec)",
        }
    }

    /// Current value of this field, formatted for display.
    pub fn value_of(&self, set: &AssumptionSet) -> String {
        match self {
            Self::DailyActiveUsers => set.daily_active_users.to_string(),
            Self::RequestsPerUser => set.requests_per_user_per_day.to_string(),
            Self::PayloadSize => set.payload_size_kb.to_string(),
            Self::ObjectSize => set.object_size_kb.to_string(),
            Self::ReplicationFactor => set.replication_factor.to_string(),
            Self::PeakMultiplier => set.peak_multiplier.to_string(),
            Self::CacheHitRate => set.cache_hit_rate_pct.to_string(),
            Self::EgressOverhead => set.egress_overhead_factor.to_string(),
            Self::IngressOverhead => set.ingress_overhead_factor.to_string(),
            Self::TotalUsers => set.total_users.to_string(),
            Self::RetentionDays => set.retention_days.to_string(),
            Self::SessionLength => set.session_length_min.to_string(),
            Self::ThinkTime => set.think_time_sec.to_string(),
        }
    }

    fn assign(&self, set: &mut AssumptionSet, raw: &str) -> Result<()> {
        match self {
            Self::DailyActiveUsers => set.daily_active_users = parse_count(*self, raw)?,
            Self::RequestsPerUser => set.requests_per_user_per_day = parse_count(*self, raw)?,
            Self::PayloadSize => set.payload_size_kb = parse_real(*self, raw)?,
            Self::ObjectSize => set.object_size_kb = parse_real(*self, raw)?,
            Self::ReplicationFactor => set.replication_factor = parse_count(*self, raw)?,
            Self::PeakMultiplier => set.peak_multiplier = parse_real(*self, raw)?,
            Self::CacheHitRate => set.cache_hit_rate_pct = parse_real(*self, raw)?,
            Self::EgressOverhead => set.egress_overhead_factor = parse_real(*self, raw)?,
            Self::IngressOverhead => set.ingress_overhead_factor = parse_real(*self, raw)?,
            Self::TotalUsers => set.total_users = parse_count(*self, raw)?,
            Self::RetentionDays => set.retention_days = parse_count(*self, raw)?,
            Self::SessionLength => set.session_length_min = parse_real(*self, raw)?,
            Self::ThinkTime => set.think_time_sec = parse_real(*self, raw)?,
        }
        Ok(())
    }
}

impl fmt::Display for AssumptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssumptionField {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let field = match key.as_str() {
            "dau" | "daily_active_users" => Self::DailyActiveUsers,
            "requests_per_user" | "requests_per_user_per_day" | "rpd" => Self::RequestsPerUser,
            "payload_kb" | "payload_size_kb" => Self::PayloadSize,
            "object_kb" | "object_size_kb" => Self::ObjectSize,
            "replication" | "replication_factor" => Self::ReplicationFactor,
            "peak_multiplier" | "peak" => Self::PeakMultiplier,
            "cache_hit_rate" | "cache_hit_rate_pct" => Self::CacheHitRate,
            "egress_overhead" | "egress_overhead_factor" => Self::EgressOverhead,
            "ingress_overhead" | "ingress_overhead_factor" => Self::IngressOverhead,
            "total_users" | "users" => Self::TotalUsers,
            "retention_days" | "retention" => Self::RetentionDays,
            "session_length_min" | "session_length" => Self::SessionLength,
            "think_time_sec" | "think_time" => Self::ThinkTime,
            _ => {
                return Err(SizingError::invalid(
                    s.trim(),
                    "not a recognized assumption field",
                ))
            }
        };
        Ok(field)
    }
}

/// Thousands separators (`1_000_000`, `1,000,000`) are accepted.
fn normalize_number(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '_' && *c != ',').collect()
}

fn parse_count<T: FromStr>(field: AssumptionField, raw: &str) -> Result<T> {
    normalize_number(raw).parse::<T>().map_err(|_| {
        SizingError::invalid(
            field.name(),
            format!("expected a non-negative integer, got '{}'", raw.trim()),
        )
    })
}

fn parse_real(field: AssumptionField, raw: &str) -> Result<f64> {
    normalize_number(raw)
        .parse::<f64>()
        .map_err(|_| {
            SizingError::invalid(field.name(), format!("expected a number, got '{}'", raw.trim()))
        })
}

/// Availability targets offered by the reliability section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AvailabilityTarget {
    #[serde(rename = "99.0%")]
    TwoNines,
    #[serde(rename = "99.9%")]
    ThreeNines,
    #[serde(rename = "99.99%")]
    FourNines,
    #[serde(rename = "99.999%")]
    FiveNines,
}

impl AvailabilityTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoNines => "99.0%",
            Self::ThreeNines => "99.9%",
            Self::FourNines => "99.99%",
            Self::FiveNines => "99.999%",
        }
    }

    /// Allowed downtime per 30-day month, in minutes.
    pub fn monthly_downtime_minutes(&self) -> f64 {
        let uptime = match self {
            Self::TwoNines => 0.99,
            Self::ThreeNines => 0.999,
            Self::FourNines => 0.9999,
            Self::FiveNines => 0.99999,
        };
        30.0 * 24.0 * 60.0 * (1.0 - uptime)
    }
}

impl fmt::Display for AvailabilityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityTarget {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches('%') {
            "99" | "99.0" => Ok(Self::TwoNines),
            "99.9" => Ok(Self::ThreeNines),
            "99.99" => Ok(Self::FourNines),
            "99.999" => Ok(Self::FiveNines),
            other => Err(SizingError::invalid(
                "sla",
                format!("unsupported availability target '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConsistencyModel {
    Strong,
    Eventual,
    Quorum,
}

impl ConsistencyModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Eventual => "Eventual",
            Self::Quorum => "Quorum",
        }
    }
}

impl fmt::Display for ConsistencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyModel {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(Self::Strong),
            "eventual" => Ok(Self::Eventual),
            "quorum" => Ok(Self::Quorum),
            other => Err(SizingError::invalid(
                "consistency",
                format!("unsupported consistency model '{other}'"),
            )),
        }
    }
}

/// Reliability and availability targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceLevels {
    #[serde(default = "ServiceLevels::default_availability")]
    pub availability: AvailabilityTarget,
    #[serde(default = "ServiceLevels::default_consistency")]
    pub consistency: ConsistencyModel,
    #[serde(default = "ServiceLevels::default_rpo")]
    pub rpo_minutes: u32,
    #[serde(default = "ServiceLevels::default_rto")]
    pub rto_minutes: u32,
}

impl ServiceLevels {
    fn default_availability() -> AvailabilityTarget {
        AvailabilityTarget::FourNines
    }

    fn default_consistency() -> ConsistencyModel {
        ConsistencyModel::Strong
    }

    fn default_rpo() -> u32 {
        5
    }

    fn default_rto() -> u32 {
        10
    }
}

impl Default for ServiceLevels {
    fn default() -> Self {
        Self {
            availability: Self::default_availability(),
            consistency: Self::default_consistency(),
            rpo_minutes: Self::default_rpo(),
            rto_minutes: Self::default_rto(),
        }
    }
}
