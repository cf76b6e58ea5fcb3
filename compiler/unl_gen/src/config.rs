//! Generation configuration.
//!
//! A [`GenConfig`] is plain data: which source names exist and whether they
//! are special, which of them are enabled for this run, and per-operator
//! toggles. It is either built in code ([`GenConfig::standard`]) or read
//! from JSON ([`GenConfig::from_json_str`]). It is validated and frozen
//! into an [`EnablementMatrix`](crate::EnablementMatrix) before any
//! generator runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unl_protocol::names;

use crate::descriptor::{op, NumericType, OPEN_GENERIC};
use crate::error::GenError;

/// One declared source name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    /// Special sources are `T[]` and `NativeArray<T>`; every other name is
    /// a stub struct in the template module.
    #[serde(default)]
    pub special: bool,
}

impl SourceDecl {
    pub fn special(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            special: true,
        }
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            special: false,
        }
    }
}

/// Toggles for one operator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub enabled: bool,
    /// Per-source toggles of a unary operator.
    pub unary: BTreeMap<String, bool>,
    /// Per-ordered-pair toggles of a binary operator: `binary[a][b]`.
    pub binary: BTreeMap<String, BTreeMap<String, bool>>,
}

impl OperatorConfig {
    /// Enabled for each of `names`.
    pub fn unary_all<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            enabled: true,
            unary: names.into_iter().map(|n| (n.to_owned(), true)).collect(),
            binary: BTreeMap::new(),
        }
    }

    /// Enabled for every ordered pair drawn from `names`.
    pub fn binary_all<'a>(names: impl IntoIterator<Item = &'a str> + Clone) -> Self {
        let binary = names
            .clone()
            .into_iter()
            .map(|a| {
                let row = names
                    .clone()
                    .into_iter()
                    .map(|b| (b.to_owned(), true))
                    .collect();
                (a.to_owned(), row)
            })
            .collect();
        Self {
            enabled: true,
            unary: BTreeMap::new(),
            binary,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenConfig {
    pub sources: Vec<SourceDecl>,
    /// Names enabled for this run. A declared but not enabled name is
    /// never a candidate.
    pub enabled_sources: Vec<String>,
    pub operators: BTreeMap<String, OperatorConfig>,
    /// Element types for `TryGetAverage` and key types for `MinBy`/`MaxBy`,
    /// by name (`Int32`, `UInt32`, `Int64`, `UInt64`, `Single`, `Double`).
    pub numeric_types: Vec<String>,
}

impl GenConfig {
    /// Sources shipped with the runtime library.
    const STANDARD_GENERIC_SOURCES: &'static [&'static str] = &[
        names::REPEAT_ENUMERABLE,
        names::WHERE_ENUMERABLE,
        names::SELECT_ENUMERABLE,
        names::CONCAT_ENUMERABLE,
    ];

    /// Every operator enabled for both special sources and the standard
    /// stub sources, with all six numeric types.
    pub fn standard() -> Self {
        let mut sources = vec![
            SourceDecl::special(names::ARRAY_SOURCE),
            SourceDecl::special(names::NATIVE_ARRAY_SOURCE),
        ];
        sources.extend(
            Self::STANDARD_GENERIC_SOURCES
                .iter()
                .map(|n| SourceDecl::generic(*n)),
        );
        let enabled_sources: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
        let source_names = || enabled_sources.iter().map(String::as_str);

        let mut operators = BTreeMap::new();
        for &name in op::ALL {
            let toggles = if op::is_binary(name) {
                OperatorConfig::binary_all(source_names())
            } else {
                let mut unary = OperatorConfig::unary_all(source_names());
                if is_aggregate(name) {
                    unary.unary.insert(OPEN_GENERIC.to_owned(), true);
                }
                unary
            };
            operators.insert(name.to_owned(), toggles);
        }

        Self {
            sources,
            enabled_sources: enabled_sources.clone(),
            operators,
            numeric_types: NumericType::ALL.iter().map(|t| t.name().to_owned()).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, GenError> {
        serde_json::from_str(json)
            .map_err(|e| GenError::config(format!("malformed configuration: {e}")))
    }

    pub fn to_json_string(&self) -> Result<String, GenError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GenError::config(format!("cannot serialize configuration: {e}")))
    }

    /// Switch an operator off entirely, keeping its tables.
    pub fn disable_operator(&mut self, name: &str) {
        if let Some(cfg) = self.operators.get_mut(name) {
            cfg.enabled = false;
        }
    }

    /// Switch one source off for a unary operator.
    pub fn disable_source(&mut self, operator: &str, source: &str) {
        if let Some(cfg) = self.operators.get_mut(operator) {
            cfg.unary.insert(source.to_owned(), false);
        }
    }

    /// Switch one ordered pair off for a binary operator.
    pub fn disable_pair(&mut self, operator: &str, first: &str, second: &str) {
        if let Some(cfg) = self.operators.get_mut(operator) {
            cfg.binary
                .entry(first.to_owned())
                .or_default()
                .insert(second.to_owned(), false);
        }
    }
}

fn is_aggregate(name: &str) -> bool {
    matches!(
        name,
        op::AGGREGATE_REF_VALUE_1_REF | op::AGGREGATE_VALUE_1_FUNC | op::AGGREGATE_REF_VALUE_2_REFS
    )
}
