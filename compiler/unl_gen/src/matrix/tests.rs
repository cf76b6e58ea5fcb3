use pretty_assertions::assert_eq;

use crate::config::{OperatorConfig, SourceDecl};
use crate::descriptor::op;

use super::*;

fn small_config() -> GenConfig {
    let mut cfg = GenConfig {
        sources: vec![
            SourceDecl::special("T[]"),
            SourceDecl::special("NativeArray<T>"),
            SourceDecl::generic("RepeatEnumerable"),
        ],
        enabled_sources: vec!["T[]".to_owned(), "RepeatEnumerable".to_owned()],
        numeric_types: vec!["Int32".to_owned(), "Double".to_owned()],
        ..GenConfig::default()
    };
    cfg.operators.insert(
        op::WHERE.to_owned(),
        OperatorConfig::unary_all(["T[]", "NativeArray<T>", "RepeatEnumerable"]),
    );
    cfg.operators.insert(
        op::CONCAT.to_owned(),
        OperatorConfig::binary_all(["T[]", "RepeatEnumerable"]),
    );
    cfg
}

#[test]
fn candidates_intersect_global_enablement() {
    let m = EnablementMatrix::from_config(&small_config()).unwrap_or_else(|e| panic!("{e}"));
    // NativeArray<T> is supported by Where but not enabled for the run.
    assert_eq!(m.candidates(op::WHERE), vec!["RepeatEnumerable", "T[]"]);
    assert!(m.candidates(op::SELECT).is_empty());
}

#[test]
fn unknown_entries_read_as_disabled() {
    let m = EnablementMatrix::from_config(&small_config()).unwrap_or_else(|e| panic!("{e}"));
    assert!(m.is_operator_enabled(op::WHERE));
    assert!(!m.is_operator_enabled(op::UNION));
    assert!(!m.is_enabled(op::WHERE, "NoSuchSource"));
    assert!(m.is_pair_enabled(op::CONCAT, "T[]", "RepeatEnumerable"));
    assert!(!m.is_pair_enabled(op::CONCAT, "T[]", "NativeArray<T>"));
}

#[test]
fn disabled_pair_is_directional() {
    let mut cfg = small_config();
    cfg.disable_pair(op::CONCAT, "RepeatEnumerable", "T[]");
    let m = EnablementMatrix::from_config(&cfg).unwrap_or_else(|e| panic!("{e}"));
    assert!(m.is_pair_enabled(op::CONCAT, "T[]", "RepeatEnumerable"));
    assert!(!m.is_pair_enabled(op::CONCAT, "RepeatEnumerable", "T[]"));
}

#[test]
fn numeric_types_are_parsed_and_deduplicated() {
    let mut cfg = small_config();
    cfg.numeric_types.push("Int32".to_owned());
    let m = EnablementMatrix::from_config(&cfg).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(m.numeric_types(), &[NumericType::Int32, NumericType::Double]);
    assert!(!m.has_numeric_type(NumericType::UInt64));
}

#[test]
fn unknown_numeric_type_is_rejected() {
    let mut cfg = small_config();
    cfg.numeric_types.push("Half".to_owned());
    assert!(matches!(
        EnablementMatrix::from_config(&cfg),
        Err(GenError::Configuration { .. })
    ));
}

#[test]
fn undeclared_enabled_source_is_rejected() {
    let mut cfg = small_config();
    cfg.enabled_sources.push("Mystery".to_owned());
    assert!(matches!(
        EnablementMatrix::from_config(&cfg),
        Err(GenError::Configuration { .. })
    ));
}
