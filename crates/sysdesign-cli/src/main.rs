use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use sysdesign_core::{
    export, AssumptionField, AssumptionSet, ConfigManager, DesignSession, ProfileOverrides,
    LOCAL_CONFIG_FILE,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod output;

use output::{print_output, CommandOutput, OutputFormat};

#[derive(Parser)]
#[command(name = "sysdesign")]
#[command(about = "System design sizing assistant - capacity estimates and architecture profiles", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty, table)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Config file (defaults to ./.sysdesign.toml, then ~/.sysdesign/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available problem types
    Profiles,

    /// Show the stored definition of a problem type
    Show {
        /// Problem type name
        profile: String,
    },

    /// List editable assumption fields and their seed values
    Fields,

    /// Compute capacity estimates and the design summary
    Estimate(DesignArgs),

    /// Write the design summary to a CSV or Markdown file
    Export {
        #[command(flatten)]
        design: DesignArgs,

        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Destination file (defaults to the configured export location)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the export instead of writing a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a config file populated with defaults
    Init {
        /// Destination path
        #[arg(default_value = LOCAL_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the JSON schema of the config file
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Markdown,
}

/// Inputs shared by `estimate` and `export`.
#[derive(Args, Clone, Default)]
struct DesignArgs {
    /// Problem type (defaults to the configured default profile)
    #[arg(short, long)]
    profile: Option<String>,

    /// Assumption edit, e.g. --set dau=2000000 (repeatable)
    #[arg(short = 's', long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Toggle override, e.g. --toggle "Stores PII=true" (repeatable)
    #[arg(short = 't', long = "toggle", value_name = "NAME=BOOL")]
    toggles: Vec<String>,

    /// Param override, e.g. --param "Cache Hit Rate (%)=85" (repeatable)
    #[arg(long = "param", value_name = "NAME=NUMBER")]
    params: Vec<String>,

    /// Availability target (99.0%, 99.9%, 99.99%, 99.999%)
    #[arg(long)]
    sla: Option<String>,

    /// Consistency model (strong, eventual, quorum)
    #[arg(long)]
    consistency: Option<String>,

    /// Recovery point objective in minutes
    #[arg(long)]
    rpo: Option<u32>,

    /// Recovery time objective in minutes
    #[arg(long)]
    rto: Option<u32>,

    /// Problem statement shown in the walkthrough
    #[arg(long)]
    problem: Option<String>,

    /// Include photo upload assumptions
    #[arg(long)]
    photos: bool,

    /// Include video upload assumptions
    #[arg(long)]
    videos: bool,
}

#[derive(Serialize)]
struct ProfileListing {
    name: String,
    database: String,
    cache_hit_rate: String,
    layers: usize,
}

#[derive(Serialize)]
struct FieldListing {
    field: &'static str,
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct ExportResult {
    path: String,
    format: String,
    status: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match ConfigManager::load(cli.config.as_deref()) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    init_tracing(&manager, cli.verbose)?;
    debug!(
        config = ?manager.config_path(),
        profiles = manager.catalog().len(),
        "configuration ready"
    );

    // Execute command
    match execute_command(&cli, &manager) {
        Ok(output) => {
            print_output(cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(manager: &ConfigManager, verbose: bool) -> Result<()> {
    let logging = &manager.config().logging;
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if logging.format == "pretty" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")
}

fn execute_command(cli: &Cli, manager: &ConfigManager) -> Result<CommandOutput> {
    match &cli.command {
        Commands::Profiles => execute_profiles_command(manager),
        Commands::Show { profile } => execute_show_command(manager, profile),
        Commands::Fields => execute_fields_command(manager),
        Commands::Estimate(args) => {
            let session = build_session(manager, args)?;
            let summary = session
                .summary()
                .ok_or_else(|| anyhow!("No estimate available"))?;
            Ok(CommandOutput::Summary(Box::new(summary)))
        }
        Commands::Export {
            design,
            format,
            out,
            stdout,
        } => execute_export_command(manager, design, *format, out.as_deref(), *stdout),
        Commands::Config(cmd) => execute_config_command(cmd, manager),
    }
}

fn execute_profiles_command(manager: &ConfigManager) -> Result<CommandOutput> {
    let catalog = manager.catalog();
    let results: Vec<_> = catalog
        .profiles()
        .iter()
        .map(|p| ProfileListing {
            name: p.name.clone(),
            database: p.database_recommendation.clone(),
            cache_hit_rate: p
                .cache_hit_rate()
                .map(|r| format!("{r}%"))
                .unwrap_or_else(|| "-".to_string()),
            layers: p.architecture_layers.len(),
        })
        .collect();

    Ok(CommandOutput::Data(serde_json::to_value(results)?))
}

fn execute_show_command(manager: &ConfigManager, key: &str) -> Result<CommandOutput> {
    let profile = manager
        .catalog()
        .resolve(key)
        .with_context(|| format!("Failed to look up problem type '{key}'"))?;
    Ok(CommandOutput::Data(serde_json::to_value(profile)?))
}

fn execute_fields_command(manager: &ConfigManager) -> Result<CommandOutput> {
    let seed = &manager.config().assumptions;
    let results: Vec<_> = AssumptionField::ALL
        .iter()
        .map(|f| FieldListing {
            field: f.name(),
            label: f.label(),
            value: f.value_of(seed),
        })
        .collect();
    Ok(CommandOutput::Data(serde_json::to_value(results)?))
}

fn execute_export_command(
    manager: &ConfigManager,
    design: &DesignArgs,
    format: ExportFormat,
    out: Option<&Path>,
    to_stdout: bool,
) -> Result<CommandOutput> {
    let session = build_session(manager, design)?;
    let summary = session
        .summary()
        .ok_or_else(|| anyhow!("No estimate available"))?;

    let (content, default_name, label) = match format {
        ExportFormat::Csv => (
            export::to_csv(&summary),
            manager.config().export.csv_file_name.clone(),
            "csv",
        ),
        ExportFormat::Markdown => {
            let generated = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
            (
                summary.to_markdown(Some(&generated)),
                export::DEFAULT_MARKDOWN_FILE.to_string(),
                "markdown",
            )
        }
    };

    if to_stdout {
        return Ok(CommandOutput::Raw(content));
    }

    let path = match out {
        Some(path) => path.to_path_buf(),
        None => manager.config().export.resolve(&default_name),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let written = match format {
        ExportFormat::Csv => std::fs::File::create(&path)
            .and_then(|file| export::write_csv(BufWriter::new(file), &summary)),
        ExportFormat::Markdown => std::fs::write(&path, content),
    };
    written.with_context(|| format!("Failed to write {}", path.display()))?;

    let result = ExportResult {
        path: path.display().to_string(),
        format: label.to_string(),
        status: "written".to_string(),
    };
    Ok(CommandOutput::Data(serde_json::to_value(result)?))
}

fn execute_config_command(cmd: &ConfigCommands, manager: &ConfigManager) -> Result<CommandOutput> {
    match cmd {
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                return Err(anyhow!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            ConfigManager::create_default_config(path)
                .context("Failed to write default configuration")?;
            Ok(CommandOutput::Data(serde_json::json!({
                "path": path.display().to_string(),
                "status": "created"
            })))
        }
        ConfigCommands::Show => {
            let mut value = serde_json::to_value(manager.config())?;
            if let serde_json::Value::Object(map) = &mut value {
                map.insert(
                    "loaded_from".to_string(),
                    serde_json::Value::String(
                        manager
                            .config_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "defaults".to_string()),
                    ),
                );
            }
            Ok(CommandOutput::Data(value))
        }
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(sysdesign_core::SysDesignConfig);
            Ok(CommandOutput::Raw(serde_json::to_string_pretty(&schema)?))
        }
    }
}

/// Seed a session from the config, then apply the command-line edits in
/// form order: profile, assumptions, overrides.
fn build_session(manager: &ConfigManager, args: &DesignArgs) -> Result<DesignSession> {
    let config = manager.config();
    let mut session = manager.new_session()?;

    if let Some(problem) = &args.problem {
        let mut brief = config.brief.clone();
        brief.problem_statement = problem.clone();
        session.set_brief(brief);
    }

    if args.photos || args.videos {
        let mut media = config.media.clone();
        media.photos |= args.photos;
        media.videos |= args.videos;
        session.set_media(media)?;
    }

    let mut levels = config.service_levels.clone();
    if let Some(sla) = &args.sla {
        levels.availability = sla.parse()?;
    }
    if let Some(consistency) = &args.consistency {
        levels.consistency = consistency.parse()?;
    }
    if let Some(rpo) = args.rpo {
        levels.rpo_minutes = rpo;
    }
    if let Some(rto) = args.rto {
        levels.rto_minutes = rto;
    }
    session.set_service_levels(levels);

    let profile = args
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile.clone());
    session
        .select_profile(&profile)
        .with_context(|| format!("Failed to select problem type '{profile}'"))?;

    let assumptions = apply_edits(session.assumptions(), &args.set)?;
    session.set_assumptions(assumptions)?;

    let mut overrides = ProfileOverrides::default();
    for assignment in &args.toggles {
        let (name, value) = ProfileOverrides::parse_toggle(assignment)?;
        overrides.toggles.insert(name, value);
    }
    for assignment in &args.params {
        let (name, value) = ProfileOverrides::parse_param(assignment)?;
        overrides.params.insert(name, value);
    }
    if !overrides.is_empty() {
        session
            .merge_overrides(&overrides)
            .context("Failed to apply profile overrides")?;
    }

    Ok(session)
}

fn apply_edits(seed: &AssumptionSet, edits: &[String]) -> Result<AssumptionSet> {
    let mut assumptions = seed.clone();
    for edit in edits {
        let (field, raw) = edit
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid --set '{edit}': expected FIELD=VALUE"))?;
        let field: AssumptionField = field.parse()?;
        assumptions.edit(field, raw)?;
    }
    Ok(assumptions)
}
