use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use sysdesign_core::DesignSummary;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
    Table,
}

pub enum CommandOutput {
    Data(serde_json::Value),
    Summary(Box<DesignSummary>),
    /// Printed verbatim regardless of the output format.
    Raw(String),
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Field")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl Row {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

pub fn print_output(format: OutputFormat, output: &CommandOutput) -> Result<()> {
    match (output, format) {
        (CommandOutput::Raw(text), _) => print!("{text}"),
        (CommandOutput::Data(value), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        (CommandOutput::Data(value), OutputFormat::Pretty) => print_pretty(value, 0),
        (CommandOutput::Data(value), OutputFormat::Table) => print_table(value),
        (CommandOutput::Summary(summary), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        (CommandOutput::Summary(summary), OutputFormat::Pretty) => print_summary_pretty(summary),
        (CommandOutput::Summary(summary), OutputFormat::Table) => print_summary_tables(summary),
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{indent}{}: {}", key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{indent}{}: {}", key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b {
                            "true".green()
                        } else {
                            "false".red()
                        };
                        println!("{indent}{}: {}", key_colored, val_colored);
                    }
                    serde_json::Value::Null => {}
                    nested => {
                        println!("{indent}{}:", key_colored);
                        print_pretty(nested, depth + 1);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) if arr.iter().all(|v| !v.is_object()) => {
            for item in arr {
                println!("{indent}- {}", scalar(item));
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{indent}{}{}:", "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item, depth);
            }
        }
        other => println!("{indent}{}", scalar(other)),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Arrays of objects become one table with a column per key; anything else
/// is flattened to field/value rows.
fn print_table(value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) if items.iter().all(|v| v.is_object()) => {
            let Some(serde_json::Value::Object(first)) = items.first() else {
                println!("{}", "(empty)".dimmed());
                return;
            };
            let columns: Vec<String> = first.keys().cloned().collect();
            let mut builder = Builder::default();
            builder.push_record(columns.clone());
            for item in items {
                builder.push_record(
                    columns
                        .iter()
                        .map(|c| item.get(c).map(scalar).unwrap_or_default()),
                );
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{table}");
        }
        serde_json::Value::Object(map) => {
            let rows: Vec<Row> = map
                .iter()
                .map(|(k, v)| {
                    let value = match v {
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            serde_json::to_string(v).unwrap_or_default()
                        }
                        other => scalar(other),
                    };
                    Row::new(k.as_str(), value)
                })
                .collect();
            print_rows(rows);
        }
        other => println!("{}", scalar(other)),
    }
}

fn print_rows(rows: Vec<Row>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn heading(title: &str) {
    println!("\n{}", title.cyan().bold());
}

fn print_summary_pretty(summary: &DesignSummary) {
    println!(
        "{} {}",
        "Problem Type:".bold(),
        summary.problem_type.green().bold()
    );
    if !summary.brief.problem_statement.is_empty() {
        println!("{}", summary.brief.problem_statement);
    }

    heading("Capacity Inputs");
    for (label, value) in summary.assumption_rows() {
        println!("  {}: {}", label, value.yellow());
    }
    println!(
        "  Effective Cache Hit Rate (%): {}",
        format!("{} (read ratio)", summary.effective_cache_hit_rate_pct).yellow()
    );

    heading("Capacity Estimation");
    for (label, value) in summary.metric_rows() {
        println!("  {}: {}", label, value.yellow().bold());
    }

    let sl = &summary.service_levels;
    heading("Reliability & Availability");
    println!(
        "  SLA: {} ({:.1} min/month downtime)",
        sl.availability.to_string().yellow(),
        sl.availability.monthly_downtime_minutes()
    );
    println!("  Consistency: {}", sl.consistency.to_string().yellow());
    println!("  RPO: {} min", sl.rpo_minutes);
    println!("  RTO: {} min", sl.rto_minutes);

    heading("Architecture");
    println!("  {}", summary.architecture_layers.join(" → ").green());

    heading("Database");
    println!("  {}", summary.database_recommendation.green());
    println!("  {}", summary.rationale.dimmed());

    heading("Trade-offs");
    for note in &summary.tradeoffs {
        println!("  - {note}");
    }

    let failures: Vec<&str> = summary
        .failure_modeling
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !failures.is_empty() {
        heading("Failure Modeling");
        for failure in failures {
            println!("  - {}", failure.red());
        }
    }

    let media = summary.media.entries();
    if !media.is_empty() {
        heading("Media Assumptions");
        for (label, value) in media {
            println!("  {}: {}", label, value.yellow());
        }
    }
}

fn print_summary_tables(summary: &DesignSummary) {
    println!(
        "{} {}",
        "Problem Type:".bold(),
        summary.problem_type.green().bold()
    );

    heading("Capacity Inputs");
    let mut inputs: Vec<Row> = summary
        .assumption_rows()
        .into_iter()
        .map(|(label, value)| Row::new(label, value))
        .collect();
    inputs.push(Row::new(
        "Effective Cache Hit Rate (%)",
        summary.effective_cache_hit_rate_pct.to_string(),
    ));
    print_rows(inputs);

    heading("Capacity Estimation");
    print_rows(
        summary
            .metric_rows()
            .into_iter()
            .map(|(label, value)| Row::new(label, value))
            .collect(),
    );

    let sl = &summary.service_levels;
    heading("Design");
    print_rows(vec![
        Row::new("SLA", sl.availability.to_string()),
        Row::new("Consistency", sl.consistency.to_string()),
        Row::new("RPO (min)", sl.rpo_minutes.to_string()),
        Row::new("RTO (min)", sl.rto_minutes.to_string()),
        Row::new("Architecture", summary.architecture_line()),
        Row::new("Database", summary.database_recommendation.as_str()),
        Row::new("Trade-offs", summary.tradeoff_line()),
    ]);
}
