//! One-row CSV export of a [`DesignSummary`].

use std::io::{self, Write};

use crate::summary::DesignSummary;

/// Column order of the export. Downstream consumers depend on it.
pub const CSV_COLUMNS: [&str; 10] = [
    "Problem Type",
    "DAU",
    "Average QPS",
    "Peak QPS",
    "Storage Estimate (GB)",
    "Egress MB/sec",
    "SLA",
    "Consistency",
    "Architecture",
    "Trade-offs",
];

pub const DEFAULT_CSV_FILE: &str = "system_design_summary.csv";
pub const DEFAULT_MARKDOWN_FILE: &str = "system_design_summary.md";

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Data row values in [`CSV_COLUMNS`] order.
pub fn csv_record(summary: &DesignSummary) -> [String; 10] {
    let m = &summary.metrics;
    [
        summary.problem_type.clone(),
        summary.assumptions.daily_active_users.to_string(),
        m.average_qps.to_string(),
        m.peak_qps.to_string(),
        m.storage_gb.to_string(),
        m.egress_mb_per_sec.to_string(),
        summary.service_levels.availability.to_string(),
        summary.service_levels.consistency.to_string(),
        summary.architecture_line(),
        summary.tradeoff_line(),
    ]
}

/// Header plus one data row, each terminated by `\n`.
pub fn to_csv(summary: &DesignSummary) -> String {
    let mut out = csv_line(CSV_COLUMNS);
    out.push('\n');
    out.push_str(&csv_line(csv_record(summary)));
    out.push('\n');
    out
}

pub fn write_csv<W: Write>(mut writer: W, summary: &DesignSummary) -> io::Result<()> {
    writer.write_all(to_csv(summary).as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("Strong"), "Strong");
        assert_eq!(escape_field("CDN, API Gateway"), "\"CDN, API Gateway\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_header_line() {
        assert_eq!(
            csv_line(CSV_COLUMNS),
            "Problem Type,DAU,Average QPS,Peak QPS,Storage Estimate (GB),Egress MB/sec,SLA,Consistency,Architecture,Trade-offs"
        );
    }
}
