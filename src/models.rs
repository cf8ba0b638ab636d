//! Core Data Models
//!
//! This module defines the plain data structures shared between the report
//! parser, the component mapper and the output layer.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: report lines are parsed into [`crate::parser::UsageLine`] and
//!    [`crate::parser::AssociationLine`] records
//! 2. **Aggregation**: usage is summed into [`TresTotals`] keyed by [`AccountKey`]
//! 3. **Translation**: totals and limits cross taxonomies through
//!    [`crate::mapper::ComponentMapper`], which is built from [`ComponentConfig`]
//! 4. **Output**: [`UsageSummary`] and [`LimitSummary`] are the serializable reports
//!
//! ## Mapping Types
//!
//! - [`TargetMapping`] - one forward edge, source component to target component
//! - [`ReverseMapping`] - the inverse edge, target component back to source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-component usage totals, e.g. cpu-minutes
pub type TresTotals = BTreeMap<String, f64>;

/// Per-component integer limits
pub type TresLimits = BTreeMap<String, i64>;

/// Aggregation key for usage and limits. An empty user means the account itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub account: String,
    pub user: String,
}

impl AccountKey {
    pub fn new(account: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
        }
    }

    pub fn account_only(account: impl Into<String>) -> Self {
        Self::new(account, "")
    }

    pub fn is_account_level(&self) -> bool {
        self.user.is_empty()
    }
}

impl std::fmt::Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.user.is_empty() {
            write!(f, "{}", self.account)
        } else {
            write!(f, "{}/{}", self.account, self.user)
        }
    }
}

/// Forward edge: a source component funds `factor` units of `target_component`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMapping {
    #[serde(rename = "targetComponent")]
    pub target_component: String,
    pub factor: f64,
}

/// Reverse edge: usage of a target component is attributed back to `source_component`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseMapping {
    #[serde(rename = "sourceComponent")]
    pub source_component: String,
    pub factor: f64,
}

/// Factor for one configured target component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetComponentConfig {
    pub factor: f64,
}

/// Configuration of one source component. Without `target_components` it is passthrough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub target_components: BTreeMap<String, TargetComponentConfig>,
}

impl ComponentConfig {
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Add a target component with its factor
    pub fn with_target(mut self, target: impl Into<String>, factor: f64) -> Self {
        self.target_components
            .insert(target.into(), TargetComponentConfig { factor });
        self
    }
}

/// Serializable usage report for one account or account/user pair
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub account: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(rename = "lineCount")]
    pub line_count: usize,
    #[serde(rename = "tresUsage")]
    pub tres_usage: TresTotals,
}

/// Serializable limit report in both taxonomies
#[derive(Debug, Clone, Serialize)]
pub struct LimitSummary {
    pub account: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(rename = "sourceLimits")]
    pub source_limits: TresLimits,
    #[serde(rename = "targetLimits")]
    pub target_limits: TresLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_key_display() {
        assert_eq!(AccountKey::new("acctA", "userX").to_string(), "acctA/userX");
        assert_eq!(AccountKey::account_only("acctA").to_string(), "acctA");
        assert!(AccountKey::account_only("acctA").is_account_level());
    }

    #[test]
    fn test_component_config_deserialize() {
        let config: BTreeMap<String, ComponentConfig> = toml::from_str(
            r#"
[cpu]

[node_hours.target_components.gpu_hours]
factor = 5.0
"#,
        )
        .unwrap();

        assert!(config["cpu"].target_components.is_empty());
        assert_eq!(
            config["node_hours"].target_components["gpu_hours"].factor,
            5.0
        );
    }

    #[test]
    fn test_component_config_builder() {
        let config = ComponentConfig::passthrough()
            .with_target("gpu_hours", 5.0)
            .with_target("storage_gb_hours", 10.0);
        assert_eq!(config.target_components.len(), 2);
    }
}
