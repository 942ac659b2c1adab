use std::collections::BTreeMap;

use serde::Serialize;

use crate::assumptions::{AssumptionField, AssumptionSet, ServiceLevels};
use crate::brief::{DesignBrief, MediaAssumptions};
use crate::estimator::DerivedMetrics;

/// Everything the output surface shows for one session, merged from the
/// active profile and the latest estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignSummary {
    pub problem_type: String,
    pub assumptions: AssumptionSet,
    pub effective_cache_hit_rate_pct: f64,
    pub metrics: DerivedMetrics,
    pub service_levels: ServiceLevels,
    pub toggles: BTreeMap<String, bool>,
    pub params: BTreeMap<String, f64>,
    pub architecture_layers: Vec<String>,
    pub tradeoffs: Vec<String>,
    pub database_recommendation: String,
    pub rationale: String,
    pub failure_modeling: String,
    pub brief: DesignBrief,
    pub media: MediaAssumptions,
}

/// `1234567.8` → `1,234,568`
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Two decimals with thousands separators.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let whole = whole.parse::<f64>().map(format_count).unwrap_or_default();
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{whole}.{frac}")
}

impl DesignSummary {
    pub fn architecture_line(&self) -> String {
        self.architecture_layers.join(", ")
    }

    pub fn tradeoff_line(&self) -> String {
        self.tradeoffs.join("; ")
    }

    /// Label/value rows for the derived metrics, formatted for display.
    pub fn metric_rows(&self) -> Vec<(&'static str, String)> {
        let m = &self.metrics;
        vec![
            ("Total Daily Requests", format_count(m.total_daily_requests)),
            ("Average QPS", format_count(m.average_qps)),
            ("Peak QPS", format_count(m.peak_qps)),
            ("Read QPS (estimated)", format_count(m.read_qps)),
            ("Write QPS (estimated)", format_count(m.write_qps)),
            ("Estimated Storage (GB)", format_decimal(m.storage_gb)),
            ("Egress (MB/sec)", format_decimal(m.egress_mb_per_sec)),
        ]
    }

    /// Label/value rows for every assumption field.
    pub fn assumption_rows(&self) -> Vec<(&'static str, String)> {
        AssumptionField::ALL
            .iter()
            .map(|f| (f.label(), f.value_of(&self.assumptions)))
            .collect()
    }

    /// Render the Markdown walkthrough document. `generated_at` is printed
    /// verbatim under the title when given.
    pub fn to_markdown(&self, generated_at: Option<&str>) -> String {
        let mut md = String::new();
        let a = &self.assumptions;
        let m = &self.metrics;
        let sl = &self.service_levels;

        line(&mut md, "# System Design Summary");
        if let Some(ts) = generated_at {
            line(&mut md, format!("\n_Generated {ts}_"));
        }
        line(&mut md, format!("\n**Problem Type:** {}", self.problem_type));
        if !self.brief.problem_statement.trim().is_empty() {
            line(
                &mut md,
                format!("\n**Problem Statement:** {}", self.brief.problem_statement),
            );
        }

        line(&mut md, "\n## General Assumptions\n");
        for (label, value) in self.brief.entries() {
            line(&mut md, format!("- {label}: {value}"));
        }

        line(&mut md, "\n## Capacity Inputs\n");
        line(
            &mut md,
            format!(
                "- **DAU:** {}, **Requests/User/Day:** {}, **Peak Multiplier:** {}",
                format_count(a.daily_active_users as f64),
                a.requests_per_user_per_day,
                a.peak_multiplier
            ),
        );
        line(
            &mut md,
            format!(
                "- **Payload:** {} KB, **Object Size:** {} KB",
                a.payload_size_kb, a.object_size_kb
            ),
        );
        line(
            &mut md,
            format!(
                "- **Replication Factor:** {}, **Retention:** {} days",
                a.replication_factor, a.retention_days
            ),
        );
        line(
            &mut md,
            format!(
                "- **Cache Hit Rate:** {}% (also used as the read ratio)",
                self.effective_cache_hit_rate_pct
            ),
        );

        line(&mut md, "\n## Capacity Estimation\n");
        line(&mut md, "| Metric | Value |\n|---|---|");
        for (label, value) in self.metric_rows() {
            line(&mut md, format!("| {label} | {value} |"));
        }
        line(&mut md, format!("\n- **Storage Estimate:** ~{:.2} GB", m.storage_gb));
        line(
            &mut md,
            format!(
                "- **Peak QPS:** ~{}, **Egress:** ~{:.2} MB/s",
                format_count(m.peak_qps),
                m.egress_mb_per_sec
            ),
        );

        line(&mut md, "\n## Reliability & Availability\n");
        line(
            &mut md,
            format!(
                "- **Consistency Model:** {}, **SLA Target:** {}",
                sl.consistency, sl.availability
            ),
        );
        line(
            &mut md,
            format!(
                "- **Downtime Budget:** ~{:.1} min/month",
                sl.availability.monthly_downtime_minutes()
            ),
        );
        line(
            &mut md,
            format!("- **RPO:** {} min, **RTO:** {} min", sl.rpo_minutes, sl.rto_minutes),
        );

        line(&mut md, "\n## Architecture & Trade-offs\n");
        line(&mut md, format!("- **Key Layers:** {}", self.architecture_line()));
        line(&mut md, format!("- **Recommended DBs:** {}", self.database_recommendation));
        line(&mut md, format!("- **Why:** {}", self.rationale));
        line(&mut md, "- **Trade-offs:**");
        for note in &self.tradeoffs {
            line(&mut md, format!("    - {note}"));
        }

        if !self.failure_modeling.trim().is_empty() {
            line(&mut md, "\n## Failure Modeling\n");
            for mode in self.failure_modeling.split(';').map(str::trim) {
                if !mode.is_empty() {
                    line(&mut md, format!("- {mode}"));
                }
            }
        }

        if self.media.enabled() {
            line(&mut md, "\n## Media Assumptions\n");
            for (label, value) in self.media.entries() {
                line(&mut md, format!("- {label}: {value}"));
            }
        }

        md
    }
}

/// Append `text` and a line break.
fn line(md: &mut String, text: impl AsRef<str>) {
    md.push_str(text.as_ref());
    md.push('\n');
}
