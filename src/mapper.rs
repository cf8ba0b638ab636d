//! Component Taxonomy Mapping
//!
//! Translates values between the source component space (what the accounting
//! backend measures) and the target component space (what the remote side
//! budgets in).
//!
//! ## Modes
//!
//! - **Passthrough**: a component without `target_components` maps to itself
//!   with factor 1.0.
//! - **Factor conversion**: a component maps to one or more target components,
//!   each with its own factor. Several sources may share a target.
//!
//! ## Numeric Contract
//!
//! Forward conversion is `target = source * factor`, summed over every source
//! feeding the same target and truncated toward zero.
//!
//! Reverse conversion is `source = Σ target_i / factor_i` over every target
//! `i` the source maps to. The two directions are exact inverses only when
//! each source maps to exactly one target and that target maps back only to
//! that source. With many-to-many mappings the round trip depends on the
//! caller feeding every target consistently: one source unit can fund several
//! differently priced target units, and usage reported against those targets
//! is attributed back by adding up each target's share.
//!
//! The mapper is immutable once built and can be shared across threads.

use crate::error::MapperError;
use crate::models::{ComponentConfig, ReverseMapping, TargetMapping};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Bidirectional source/target component mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMapper {
    forward_map: BTreeMap<String, Vec<TargetMapping>>,
    reverse_map: BTreeMap<String, Vec<ReverseMapping>>,
    passthrough_components: BTreeSet<String>,
}

impl ComponentMapper {
    /// An empty mapper. Every limit passes through unchanged and every usage value is dropped.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Build both maps from per-component configuration.
    ///
    /// Factors must be finite and non-negative. A zero factor is accepted and
    /// contributes nothing on the reverse path.
    pub fn from_config(config: &BTreeMap<String, ComponentConfig>) -> Result<Self, MapperError> {
        let mut mapper = Self::default();

        for (source, component) in config {
            if component.target_components.is_empty() {
                mapper.register(source, source, 1.0);
                mapper.passthrough_components.insert(source.clone());
                continue;
            }

            for (target, target_config) in &component.target_components {
                let factor = target_config.factor;
                if !factor.is_finite() || factor < 0.0 {
                    return Err(MapperError::InvalidFactor {
                        source_component: source.clone(),
                        target_component: target.clone(),
                        factor,
                    });
                }
                mapper.register(source, target, factor);
            }
        }

        debug!(
            sources = mapper.forward_map.len(),
            targets = mapper.reverse_map.len(),
            passthrough = mapper.passthrough_components.len(),
            "Built component mapper"
        );

        Ok(mapper)
    }

    fn register(&mut self, source: &str, target: &str, factor: f64) {
        self.forward_map
            .entry(source.to_string())
            .or_default()
            .push(TargetMapping {
                target_component: target.to_string(),
                factor,
            });
        self.reverse_map
            .entry(target.to_string())
            .or_default()
            .push(ReverseMapping {
                source_component: source.to_string(),
                factor,
            });
    }

    /// Convert source-taxonomy limits into target-taxonomy limits.
    ///
    /// Components unknown to the mapper pass through under their own name.
    pub fn convert_limits_to_target(
        &self,
        source_limits: &BTreeMap<String, i64>,
    ) -> BTreeMap<String, i64> {
        let mut accumulated: BTreeMap<String, f64> = BTreeMap::new();

        for (component, &value) in source_limits {
            match self.forward_map.get(component) {
                Some(mappings) => {
                    for mapping in mappings {
                        *accumulated
                            .entry(mapping.target_component.clone())
                            .or_insert(0.0) += value as f64 * mapping.factor;
                    }
                }
                None => {
                    warn!(
                        component = %component,
                        value,
                        "No forward mapping for component, passing limit through"
                    );
                    *accumulated.entry(component.clone()).or_insert(0.0) += value as f64;
                }
            }
        }

        accumulated
            .into_iter()
            .map(|(component, value)| (component, value.trunc() as i64))
            .collect()
    }

    /// Convert target-taxonomy usage back into source-taxonomy usage.
    ///
    /// Components unknown to the mapper are dropped.
    pub fn convert_usage_from_target(
        &self,
        target_usage: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, f64> {
        let mut accumulated: BTreeMap<String, f64> = BTreeMap::new();

        for (component, &value) in target_usage {
            let Some(mappings) = self.reverse_map.get(component) else {
                warn!(
                    component = %component,
                    value,
                    "No reverse mapping for component, dropping usage"
                );
                continue;
            };

            for mapping in mappings {
                let contribution = if mapping.factor == 0.0 {
                    0.0
                } else {
                    value / mapping.factor
                };
                *accumulated
                    .entry(mapping.source_component.clone())
                    .or_insert(0.0) += contribution;
            }
        }

        accumulated
    }

    /// True when every registered source component is passthrough
    pub fn is_passthrough(&self) -> bool {
        self.forward_map
            .keys()
            .all(|source| self.passthrough_components.contains(source))
    }

    pub fn is_passthrough_component(&self, component: &str) -> bool {
        self.passthrough_components.contains(component)
    }

    pub fn source_components(&self) -> impl Iterator<Item = &str> {
        self.forward_map.keys().map(String::as_str)
    }

    pub fn target_components(&self) -> impl Iterator<Item = &str> {
        self.reverse_map.keys().map(String::as_str)
    }

    pub fn forward_mappings(&self, source: &str) -> &[TargetMapping] {
        self.forward_map
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reverse_mappings(&self, target: &str) -> &[ReverseMapping] {
        self.reverse_map
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
