use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, Level};

use tres_usage::config::{self, Config};
use tres_usage::display::DisplayManager;
use tres_usage::models::{AccountKey, LimitSummary};
use tres_usage::report::{
    aggregate_by_account, aggregate_usage, collect_limits, parse_association_report,
    parse_usage_report, summarize_usage,
};
use tres_usage::{cycle_span, logging, ScalarCodec};

#[derive(Parser)]
#[command(name = "tres-usage")]
#[command(about = "Translate accounting reports into TRES usage and limits")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to tres-usage.toml lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a usage report (account|pairs|duration|user per line)
    Usage {
        /// Report file, or - for stdin
        file: PathBuf,
        /// Break totals down per user
        #[arg(long)]
        per_user: bool,
    },
    /// Convert association limits into the target taxonomy
    Limits {
        /// Report file, or - for stdin
        file: PathBuf,
    },
    /// Attribute target usage back to source components
    Reverse {
        /// Target usage as COMPONENT=VALUE
        #[arg(required = true, value_parser = parse_component_value)]
        values: Vec<(String, f64)>,
    },
    /// Show the configured component mapping
    Mapping,
    /// Decode duration strings into minutes
    Duration {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_error(e, cli.json),
    };
    let _guard = logging::init_logging(&config.logging, &config.paths.log_directory);
    config::set_config(config);

    if let Err(e) = run(cli.command, cli.json) {
        handle_error(e, cli.json);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_with_path(path),
        None => Config::load(),
    }
}

fn run(command: Commands, json: bool) -> Result<()> {
    let config = config::get_config();
    let display = DisplayManager::new(json);

    let span = cycle_span!(Level::INFO, "tres_usage");
    let _entered = span.enter();

    match command {
        Commands::Usage { file, per_user } => {
            let text = read_report(&file)?;
            let report = parse_usage_report(&text, &config.tres_keys());
            display.display_parse_errors(&report);

            let totals = if per_user {
                aggregate_usage(&report.records)
            } else {
                aggregate_by_account(&report.records)
            };
            info!(accounts = totals.len(), "Aggregated usage");
            display.display_usage(&summarize_usage(totals))
        }
        Commands::Limits { file } => {
            let text = read_report(&file)?;
            let report = parse_association_report(&text, &config.tres_keys());
            display.display_parse_errors(&report);

            let mapper = config.build_mapper()?;
            let summaries: Vec<LimitSummary> = collect_limits(&report.records)
                .into_iter()
                .map(|(AccountKey { account, user }, source_limits)| LimitSummary {
                    target_limits: mapper.convert_limits_to_target(&source_limits),
                    account,
                    user,
                    source_limits,
                })
                .collect();
            display.display_limits(&summaries)
        }
        Commands::Reverse { values } => {
            let mapper = config.build_mapper()?;
            let mut target_usage: BTreeMap<String, f64> = BTreeMap::new();
            for (component, value) in values {
                *target_usage.entry(component).or_insert(0.0) += value;
            }
            display.display_reverse(&mapper.convert_usage_from_target(&target_usage))
        }
        Commands::Mapping => display.display_mapping(&config.build_mapper()?),
        Commands::Duration { inputs } => {
            let durations = inputs
                .into_iter()
                .map(|input| -> Result<(String, f64)> {
                    let minutes = ScalarCodec::parse_duration_minutes(&input)?;
                    Ok((input, minutes))
                })
                .collect::<Result<Vec<_>>>()?;
            display.display_durations(&durations)
        }
    }
}

fn read_report(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read report from stdin")?;
        return Ok(text);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read report: {}", path.display()))
}

fn parse_component_value(arg: &str) -> std::result::Result<(String, f64), String> {
    let (component, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected COMPONENT=VALUE, got {arg:?}"))?;
    let value = value
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {component}: {e}"))?;
    Ok((component.to_string(), value))
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
