//! Frozen enablement tables.
//!
//! Built once from a [`GenConfig`] and read-only afterwards. A missing or
//! `false` entry means "emit nothing" and is never an error.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::GenConfig;
use crate::descriptor::{NumericType, OPEN_GENERIC};
use crate::error::GenError;

#[derive(Clone, Debug, Default)]
struct OperatorEntry {
    enabled: bool,
    /// Source names the operator mentions, in configuration order.
    supported: Vec<String>,
    unary: FxHashMap<String, bool>,
    binary: FxHashMap<(String, String), bool>,
}

impl OperatorEntry {
    fn mention(&mut self, name: &str) {
        if !self.supported.iter().any(|s| s == name) {
            self.supported.push(name.to_owned());
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnablementMatrix {
    enabled_sources: FxHashSet<String>,
    operators: FxHashMap<String, OperatorEntry>,
    numeric_types: Vec<NumericType>,
}

impl EnablementMatrix {
    /// Validate and freeze `config`.
    ///
    /// Fails on unknown numeric types and on enabled names that were never
    /// declared.
    pub fn from_config(config: &GenConfig) -> Result<Self, GenError> {
        let declared: FxHashSet<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
        let mut enabled_sources = FxHashSet::default();
        for name in &config.enabled_sources {
            if !declared.contains(name.as_str()) {
                return Err(GenError::config(format!(
                    "enabled source `{name}` is not declared"
                )));
            }
            enabled_sources.insert(name.clone());
        }

        let mut operators = FxHashMap::default();
        for (name, cfg) in &config.operators {
            let mut entry = OperatorEntry {
                enabled: cfg.enabled,
                ..OperatorEntry::default()
            };
            for (source, on) in &cfg.unary {
                entry.mention(source);
                entry.unary.insert(source.clone(), *on);
            }
            for (first, row) in &cfg.binary {
                entry.mention(first);
                for (second, on) in row {
                    entry.mention(second);
                    entry.binary.insert((first.clone(), second.clone()), *on);
                }
            }
            operators.insert(name.clone(), entry);
        }

        let mut numeric_types = Vec::with_capacity(config.numeric_types.len());
        for name in &config.numeric_types {
            let t: NumericType = name.parse()?;
            if !numeric_types.contains(&t) {
                numeric_types.push(t);
            }
        }

        Ok(Self {
            enabled_sources,
            operators,
            numeric_types,
        })
    }

    pub fn is_operator_enabled(&self, operator: &str) -> bool {
        self.operators.get(operator).is_some_and(|e| e.enabled)
    }

    pub fn is_source_enabled(&self, name: &str) -> bool {
        self.enabled_sources.contains(name)
    }

    /// Names enabled globally and supported by `operator`, in the
    /// operator's configuration order. The open-generic placeholder is not
    /// a source and never a candidate.
    pub fn candidates(&self, operator: &str) -> Vec<&str> {
        self.operators
            .get(operator)
            .map(|e| {
                e.supported
                    .iter()
                    .map(String::as_str)
                    .filter(|n| *n != OPEN_GENERIC && self.is_source_enabled(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Per-source toggle of a unary operator.
    pub fn is_enabled(&self, operator: &str, source: &str) -> bool {
        self.operators
            .get(operator)
            .and_then(|e| e.unary.get(source))
            .copied()
            .unwrap_or(false)
    }

    /// Per-ordered-pair toggle of a binary operator.
    pub fn is_pair_enabled(&self, operator: &str, first: &str, second: &str) -> bool {
        self.operators
            .get(operator)
            .and_then(|e| e.binary.get(&(first.to_owned(), second.to_owned())))
            .copied()
            .unwrap_or(false)
    }

    pub fn numeric_types(&self) -> &[NumericType] {
        &self.numeric_types
    }

    pub fn has_numeric_type(&self, t: NumericType) -> bool {
        self.numeric_types.contains(&t)
    }
}

#[cfg(test)]
mod tests;
