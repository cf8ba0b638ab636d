//! Output Formatting
//!
//! Human-readable terminal output with colors, or structured JSON for
//! programmatic consumption. Every report type goes through [`DisplayManager`].
//!
//! ### JSON Output
//! ```json
//! {
//!   "usage": [
//!     { "account": "acctA", "lineCount": 3, "tresUsage": { "cpu": 110.0 } }
//!   ]
//! }
//! ```

use crate::codec::ScalarCodec;
use crate::mapper::ComponentMapper;
use crate::models::{LimitSummary, TresTotals, UsageSummary};
use crate::report::ParsedReport;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

pub struct DisplayManager {
    json_output: bool,
}

impl DisplayManager {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    fn print_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let output = serde_json::json!({ key: value });
        let json_str =
            serde_json::to_string_pretty(&output).context("Failed to serialize report to JSON")?;
        println!("{}", json_str);
        Ok(())
    }

    fn print_header(&self, title: &str) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());
    }

    /// Warn about lines that were skipped while parsing
    pub fn display_parse_errors<T>(&self, report: &ParsedReport<T>) {
        for (line, error) in &report.errors {
            eprintln!(
                "{} line {}: {}",
                "warning:".bright_yellow().bold(),
                line,
                error
            );
        }
    }

    pub fn display_usage(&self, summaries: &[UsageSummary]) -> Result<()> {
        if self.json_output {
            return self.print_json("usage", summaries);
        }

        self.print_header("TRES Usage Report");

        let total_lines: usize = summaries.iter().map(|s| s.line_count).sum();
        println!(
            "\n{} {} accounts • {} records\n",
            "📊".bright_yellow(),
            summaries.len().to_string().bright_white().bold(),
            total_lines.to_string().bright_white().bold()
        );

        for summary in summaries {
            let who = if summary.user.is_empty() {
                summary.account.clone()
            } else {
                format!("{}/{}", summary.account, summary.user)
            };
            println!(
                "{} {} ({} records)",
                "📁".bright_blue(),
                who.bright_white().bold(),
                summary.line_count.to_string().bright_white()
            );
            self.print_totals(&summary.tres_usage);
            println!();
        }

        Ok(())
    }

    fn print_totals(&self, totals: &TresTotals) {
        for (component, value) in totals {
            println!(
                "   {}: {}",
                component.bright_cyan(),
                format!("{:.2}", value).bright_green()
            );
        }
    }

    pub fn display_limits(&self, summaries: &[LimitSummary]) -> Result<()> {
        if self.json_output {
            return self.print_json("limits", summaries);
        }

        self.print_header("TRES Limits (source → target)");

        for summary in summaries {
            let who = if summary.user.is_empty() {
                summary.account.clone()
            } else {
                format!("{}/{}", summary.account, summary.user)
            };
            println!("{} {}", "📁".bright_blue(), who.bright_white().bold());
            for (component, value) in &summary.source_limits {
                println!(
                    "   {} {}: {}",
                    "src".dimmed(),
                    component.bright_cyan(),
                    value.to_string().bright_white()
                );
            }
            for (component, value) in &summary.target_limits {
                println!(
                    "   {} {}: {}",
                    "dst".dimmed(),
                    component.bright_cyan(),
                    value.to_string().bright_green()
                );
            }
            println!();
        }

        Ok(())
    }

    pub fn display_reverse(&self, source_usage: &TresTotals) -> Result<()> {
        if self.json_output {
            return self.print_json("sourceUsage", source_usage);
        }

        self.print_header("Usage attributed to source components");
        self.print_totals(source_usage);
        Ok(())
    }

    pub fn display_mapping(&self, mapper: &ComponentMapper) -> Result<()> {
        if self.json_output {
            let forward: std::collections::BTreeMap<&str, _> = mapper
                .source_components()
                .map(|source| (source, mapper.forward_mappings(source)))
                .collect();
            let reverse: std::collections::BTreeMap<&str, _> = mapper
                .target_components()
                .map(|target| (target, mapper.reverse_mappings(target)))
                .collect();
            let output = serde_json::json!({
                "passthrough": mapper.is_passthrough(),
                "forward": forward,
                "reverse": reverse,
            });
            return self.print_json("mapping", &output);
        }

        self.print_header("Component Mapping");
        if mapper.is_passthrough() {
            println!("{}", "All components are passthrough".bright_yellow());
        }

        for source in mapper.source_components() {
            for mapping in mapper.forward_mappings(source) {
                println!(
                    "   {} → {} × {}",
                    source.bright_cyan(),
                    mapping.target_component.bright_white().bold(),
                    mapping.factor.to_string().bright_green()
                );
            }
        }

        Ok(())
    }

    pub fn display_durations(&self, durations: &[(String, f64)]) -> Result<()> {
        if self.json_output {
            let output: Vec<_> = durations
                .iter()
                .map(|(input, minutes)| serde_json::json!({ "input": input, "minutes": minutes }))
                .collect();
            return self.print_json("durations", &output);
        }

        for (input, minutes) in durations {
            println!(
                "{} → {} min ({})",
                input.bright_white(),
                format!("{:.4}", minutes).bright_green(),
                ScalarCodec::format_duration(*minutes).dimmed()
            );
        }

        Ok(())
    }
}
