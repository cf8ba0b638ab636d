//! Whole-report parsing and aggregation
//!
//! A report is parsed line by line. Blank lines are ignored and lines with
//! the wrong shape are collected with their 1-based line number instead of
//! aborting the batch, so the caller decides whether a partial report is
//! acceptable. With the `parallel` feature lines are parsed on the rayon pool;
//! record order always follows input order.

use crate::error::LineError;
use crate::models::{AccountKey, TresLimits, TresTotals, UsageSummary};
use crate::parser::{AssociationLine, ReportRecord, TresKeys, UsageLine};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parsed records plus the lines that could not be parsed
#[derive(Debug, Clone)]
pub struct ParsedReport<T> {
    pub records: Vec<T>,
    pub errors: Vec<(usize, LineError)>,
}

impl<T> ParsedReport<T> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse every usage line of a report
pub fn parse_usage_report(text: &str, keys: &TresKeys) -> ParsedReport<UsageLine> {
    parse_report(text, |line| UsageLine::parse(line, keys))
}

/// Parse every association line of a report
pub fn parse_association_report(text: &str, keys: &TresKeys) -> ParsedReport<AssociationLine> {
    parse_report(text, |line| AssociationLine::parse(line, keys))
}

fn parse_report<T, F>(text: &str, parse_line: F) -> ParsedReport<T>
where
    T: Send,
    F: Fn(&str) -> Result<T, LineError> + Sync,
{
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
        .collect();

    #[cfg(feature = "parallel")]
    let results: Vec<(usize, Result<T, LineError>)> = lines
        .into_par_iter()
        .map(|(number, line)| (number, parse_line(line)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<(usize, Result<T, LineError>)> = lines
        .into_iter()
        .map(|(number, line)| (number, parse_line(line)))
        .collect();

    let mut report = ParsedReport {
        records: Vec::with_capacity(results.len()),
        errors: Vec::new(),
    };

    for (number, result) in results {
        match result {
            Ok(record) => report.records.push(record),
            Err(e) => {
                warn!(line = number, error = %e, "Skipping malformed report line");
                report.errors.push((number, e));
            }
        }
    }

    debug!(
        records = report.records.len(),
        errors = report.errors.len(),
        "Parsed report"
    );

    report
}

/// Running usage totals for one aggregation key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageAccumulator {
    pub line_count: usize,
    pub tres_usage: TresTotals,
}

impl UsageAccumulator {
    pub fn add(&mut self, line: &UsageLine) {
        self.line_count += 1;
        for (key, value) in line.tres_usage() {
            *self.tres_usage.entry(key.clone()).or_insert(0.0) += value;
        }
    }
}

/// Sum usage per account and user
pub fn aggregate_usage(lines: &[UsageLine]) -> BTreeMap<AccountKey, UsageAccumulator> {
    aggregate_with(lines, |line| AccountKey::new(line.account(), line.user()))
}

/// Sum usage per account, folding all users together
pub fn aggregate_by_account(lines: &[UsageLine]) -> BTreeMap<AccountKey, UsageAccumulator> {
    aggregate_with(lines, |line| AccountKey::account_only(line.account()))
}

fn aggregate_with<F>(lines: &[UsageLine], key_of: F) -> BTreeMap<AccountKey, UsageAccumulator>
where
    F: Fn(&UsageLine) -> AccountKey,
{
    let mut totals: BTreeMap<AccountKey, UsageAccumulator> = BTreeMap::new();
    for line in lines {
        totals.entry(key_of(line)).or_default().add(line);
    }
    totals
}

/// Flatten aggregated usage into serializable summaries
pub fn summarize_usage(totals: BTreeMap<AccountKey, UsageAccumulator>) -> Vec<UsageSummary> {
    totals
        .into_iter()
        .map(|(key, acc)| UsageSummary {
            account: key.account,
            user: key.user,
            line_count: acc.line_count,
            tres_usage: acc.tres_usage,
        })
        .collect()
}

/// Limits per account (empty user) and per account/user.
/// A later line for the same key replaces the earlier one.
pub fn collect_limits(lines: &[AssociationLine]) -> BTreeMap<AccountKey, TresLimits> {
    let mut limits = BTreeMap::new();
    for line in lines {
        let key = AccountKey::new(line.account(), line.user());
        if limits.insert(key, line.tres_limits().clone()).is_some() {
            debug!(
                account = line.account(),
                user = line.user(),
                "Association repeated, keeping the later limits"
            );
        }
    }
    limits
}
