//! Accounting report line parsing
//!
//! Report lines are pipe-delimited with fixed field positions:
//!
//! ```text
//! usage:        account|key=value,key=value|duration|user
//! association:  account|key=value,key=value[|user]
//! ```
//!
//! Both variants share account and resource-pair decoding through
//! [`ReportRecord`]; each computes its derived fields eagerly, so a parsed
//! record is immutable and its accessors are plain reads.
//!
//! Only keys in the caller's [`TresKeys`] contribute to `tres_usage` and
//! `tres_limits`. Every well-formed pair stays visible through
//! [`ReportRecord::resources`].

use crate::codec::ScalarCodec;
use crate::error::LineError;
use crate::models::{TresLimits, TresTotals};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

/// Resource key reported in bytes and normalized to megabytes
pub const MEM_KEY: &str = "mem";

const BYTES_PER_MEGABYTE: u64 = 1 << 20;

const USAGE_FIELD_COUNT: usize = 4;
const ASSOCIATION_FIELD_COUNT: usize = 2;

static DEFAULT_TRES_KEYS: Lazy<TresKeys> = Lazy::new(|| {
    TresKeys::new(["cpu", "mem", "node", "gres/gpu", "billing", "energy"])
});

/// Set of resource keys that contribute to usage and limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TresKeys(BTreeSet<String>);

impl TresKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// The built-in key set used when no configuration overrides it
    pub fn default_keys() -> &'static TresKeys {
        &DEFAULT_TRES_KEYS
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TresKeys {
    fn default() -> Self {
        DEFAULT_TRES_KEYS.clone()
    }
}

/// Fields common to both line variants
pub trait ReportRecord {
    fn account(&self) -> &str;

    /// Empty when the line carries no user
    fn user(&self) -> &str;

    /// Raw `key=value` pairs; the last occurrence of a duplicate key wins
    fn resources(&self) -> &BTreeMap<String, String>;
}

/// A usage line: consumption over an elapsed duration
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLine {
    account: String,
    user: String,
    duration_minutes: f64,
    resources: BTreeMap<String, String>,
    tres_usage: TresTotals,
}

impl UsageLine {
    /// Parse `account|pairs|duration|user`
    pub fn parse(line: &str, keys: &TresKeys) -> Result<Self, LineError> {
        let fields = split_fields(line, USAGE_FIELD_COUNT)?;

        let resources = parse_resource_pairs(fields[1]);
        let duration_minutes = ScalarCodec::decode_duration_minutes(fields[2]);

        let tres_usage = resources
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(key, value)| {
                let mut usage = ScalarCodec::decode_unit_integer(value) as f64 * duration_minutes;
                if key == MEM_KEY {
                    usage = (usage / BYTES_PER_MEGABYTE as f64).floor();
                }
                (key.clone(), usage)
            })
            .collect();

        Ok(Self {
            account: fields[0].to_string(),
            user: fields[3].to_string(),
            duration_minutes,
            resources,
            tres_usage,
        })
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    /// Quantity times duration for every recognized key on the line
    pub fn tres_usage(&self) -> &TresTotals {
        &self.tres_usage
    }
}

impl ReportRecord for UsageLine {
    fn account(&self) -> &str {
        &self.account
    }

    fn user(&self) -> &str {
        &self.user
    }

    fn resources(&self) -> &BTreeMap<String, String> {
        &self.resources
    }
}

/// An association line: configured limits, no duration
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationLine {
    account: String,
    user: String,
    resources: BTreeMap<String, String>,
    tres_limits: TresLimits,
}

impl AssociationLine {
    /// Parse `account|pairs[|user]`
    pub fn parse(line: &str, keys: &TresKeys) -> Result<Self, LineError> {
        let fields = split_fields(line, ASSOCIATION_FIELD_COUNT)?;

        let resources = parse_resource_pairs(fields[1]);
        let tres_limits = resources
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(key, value)| {
                let mut limit = ScalarCodec::decode_unit_integer(value);
                if key == MEM_KEY {
                    limit /= BYTES_PER_MEGABYTE;
                }
                (key.clone(), i64::try_from(limit).unwrap_or(i64::MAX))
            })
            .collect();

        Ok(Self {
            account: fields[0].to_string(),
            user: fields.get(2).map(|user| user.to_string()).unwrap_or_default(),
            resources,
            tres_limits,
        })
    }

    /// Associations carry no duration
    pub fn duration_minutes(&self) -> f64 {
        0.0
    }

    pub fn tres_limits(&self) -> &TresLimits {
        &self.tres_limits
    }
}

impl ReportRecord for AssociationLine {
    fn account(&self) -> &str {
        &self.account
    }

    fn user(&self) -> &str {
        &self.user
    }

    fn resources(&self) -> &BTreeMap<String, String> {
        &self.resources
    }
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, LineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(LineError::TooFewFields { expected, found: 0 });
    }

    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < expected {
        return Err(LineError::TooFewFields {
            expected,
            found: fields.len(),
        });
    }

    Ok(fields)
}

/// Decode `key=value,key=value`, splitting each token on its first `=`.
/// Tokens without `=` are skipped.
pub fn parse_resource_pairs(field: &str) -> BTreeMap<String, String> {
    field
        .split(',')
        .filter_map(|token| token.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .collect()
}
