use pretty_assertions::assert_eq;
use unl_ir::{Op, ParamMode, ScalarType, TypeRef};

use crate::config::{GenConfig, SourceDecl};
use crate::descriptor::{op, OPEN_GENERIC};
use crate::module::{ExtendedModule, GeneratedMethod, TemplateModule};

fn run(config: &GenConfig) -> ExtendedModule {
    crate::generate(config, &TemplateModule::standard()).unwrap_or_else(|e| panic!("{e}"))
}

fn method<'m>(module: &'m ExtendedModule, holder: &str, sources: &[&str]) -> &'m GeneratedMethod {
    module
        .holder(holder)
        .and_then(|h| h.method_for(sources))
        .unwrap_or_else(|| panic!("no {holder} method for {sources:?}"))
}

fn throws(m: &GeneratedMethod) -> Vec<&str> {
    m.body
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::ThrowArgumentNull(p) => Some(p.as_str()),
            _ => None,
        })
        .collect()
}

// ── Lazy views ──────────────────────────────────────────────────────

#[test]
fn where_over_array_wraps_then_builds_view() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "WhereFuncHelper", &["T[]"]);
    assert_eq!(
        m.return_type.to_string(),
        "WhereEnumerable<ArrayEnumerable<T>, ArrayEnumerable<T>.Enumerator, T, DelegateFuncToStructOperatorFunc<T, bool>>"
    );
    assert_eq!(m.body.ops.len(), 12);
    assert_eq!(m.body.ops[0], Op::LdArg(0));
    // Both the wrapper and the strategy are passed by address.
    assert_eq!(&m.body.ops[6..8], &[Op::LdLocA(0), Op::LdLocA(1)]);
    assert_eq!(m.body.ops[11], Op::Ret);
    assert_eq!(m.body.max_stack, 2);
}

#[test]
fn generic_source_is_taken_by_readonly_reference() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "WhereFuncHelper", &["RepeatEnumerable"]);
    assert_eq!(m.params[0].mode, ParamMode::In);
    assert_eq!(m.params[0].ty.to_string(), "RepeatEnumerable<T>");
    // The `in` argument already is the address the View constructor takes.
    assert!(m.body.ops.contains(&Op::LdArg(0)));
    assert!(!m.body.ops.iter().any(|op| matches!(op, Op::LdArgA(_))));
}

#[test]
fn select_adds_result_and_source_generics() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "SelectFuncHelper", &["WhereEnumerable"]);
    let names: Vec<&str> = m.generics.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["T", "TResult", "TEnumerable0", "TEnumerator0", "TPredicate0"]
    );
}

#[test]
fn concat_emits_every_ordered_pair() {
    let module = run(&GenConfig::standard());
    let concat = module.holder("ConcatNoneHelper").unwrap_or_else(|| panic!("no concat"));
    assert_eq!(concat.len(), 36);
    assert!(concat.method_for(&["T[]", "NativeArray<T>"]).is_some());
    assert!(concat.method_for(&["NativeArray<T>", "T[]"]).is_some());
}

#[test]
fn distinct_defaults_allocator_to_temp() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "DistinctNoneHelper", &["NativeArray<T>"]);
    let allocator = m.param("allocator").unwrap_or_else(|| panic!("no allocator"));
    assert_eq!(allocator.default, Some(unl_ir::Const::I32(2)));
    assert!(m.to_string().contains("where T : unmanaged, IEquatable<T>"));
}

#[test]
fn union_nests_concat_inside_distinct() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "UnionNoneHelper", &["T[]", "RepeatEnumerable"]);
    assert!(m
        .return_type
        .to_string()
        .starts_with("DistinctEnumerable<ConcatEnumerable<ArrayEnumerable<T>, "));
    assert!(m.body.calls(".ctor"));
    let params: Vec<&str> = m.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["this", "second", "allocator"]);
}

#[test]
fn union_requires_distinct() {
    let mut cfg = GenConfig::standard();
    cfg.disable_operator(op::DISTINCT);
    let module = run(&cfg);
    assert!(module.holder("UnionNoneHelper").is_none());
    assert!(module.holder("ConcatNoneHelper").is_some());
}

#[test]
fn union_follows_concat_pair_toggles() {
    let mut cfg = GenConfig::standard();
    cfg.disable_pair(op::CONCAT, "T[]", "RepeatEnumerable");
    let module = run(&cfg);
    let union = module.holder("UnionNoneHelper").unwrap_or_else(|| panic!("no union"));
    assert_eq!(union.len(), 35);
    assert!(union.method_for(&["T[]", "RepeatEnumerable"]).is_none());
    assert!(union.method_for(&["RepeatEnumerable", "T[]"]).is_some());
}

#[test]
fn min_and_max_by_get_one_holder_per_key_type() {
    let mut cfg = GenConfig::standard();
    cfg.numeric_types = vec!["Int32".to_owned(), "Double".to_owned()];
    let module = run(&cfg);
    assert!(module.holder("MinByRefFuncInt32Helper").is_some());
    assert!(module.holder("MaxByRefFuncDoubleHelper").is_some());
    assert!(module.holder("MaxByRefFuncInt64Helper").is_none());

    let min = method(&module, "MinByRefFuncInt32Helper", &["T[]"]);
    let max = method(&module, "MaxByRefFuncInt32Helper", &["T[]"]);
    assert!(min.body.ops.contains(&Op::LdcI4(0)));
    assert!(max.body.ops.contains(&Op::LdcI4(1)));
}

// ── Eager operators ─────────────────────────────────────────────────

#[test]
fn average_int32_over_array_widens_and_narrows() {
    let module = run(&GenConfig::standard());
    let holder = module
        .holder("TryGetAverageNoneInt32Helper")
        .unwrap_or_else(|| panic!("no average holder"));
    let methods: Vec<_> = holder
        .methods()
        .iter()
        .filter(|m| m.is_for(&["T[]"]))
        .collect();
    assert_eq!(methods.len(), 1);

    let m = methods[0];
    assert_eq!(m.params[0].ty.to_string(), "int[]");
    assert_eq!(m.params[1].mode, ParamMode::Out);
    assert!(m.generics.is_empty());
    let ops = &m.body.ops;
    assert!(ops.contains(&Op::Conv(ScalarType::I64)));
    assert!(ops.contains(&Op::Conv(ScalarType::I32)));
    assert!(ops.contains(&Op::Div));
    assert!(ops.contains(&Op::InitObj(ScalarType::I32.into())));
    assert!(!m.body.calls("GetEnumerator"));
}

#[test]
fn average_over_generic_source_pulls_and_disposes() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "TryGetAverageNoneUInt64Helper", &["SelectEnumerable"]);
    for name in ["GetEnumerator", "TryMoveNext", "get_Current", "Dispose"] {
        assert!(m.body.calls(name), "missing {name}");
    }
    assert!(m.body.ops.contains(&Op::DivUn));
    let disposes = m
        .body
        .ops
        .iter()
        .filter(|op| matches!(op, Op::Call(mr) if mr.name == "Dispose"))
        .count();
    assert_eq!(disposes, 2);
}

#[test]
fn average_respects_numeric_types() {
    let mut cfg = GenConfig::standard();
    cfg.numeric_types = vec!["Single".to_owned()];
    let module = run(&cfg);
    assert!(module.holder("TryGetAverageNoneSingleHelper").is_some());
    assert!(module.holder("TryGetAverageNoneInt32Helper").is_none());
}

#[test]
fn try_get_last_picks_scan_by_capability() {
    let module = run(&GenConfig::standard());
    let repeat = method(&module, "TryGetLastRefFuncHelper", &["RepeatEnumerable"]);
    assert!(repeat.body.calls("get_Item"));
    assert!(repeat.body.calls("LongCount"));
    assert!(!repeat.body.calls("GetEnumerator"));

    let filtered = method(&module, "TryGetLastRefFuncHelper", &["WhereEnumerable"]);
    assert!(filtered.body.calls("GetEnumerator"));
    assert!(filtered.body.calls("Dispose"));
    assert!(!filtered.body.calls("get_Item"));

    let array = method(&module, "TryGetLastRefFuncHelper", &["T[]"]);
    assert!(array
        .body
        .ops
        .iter()
        .any(|op| matches!(op, Op::LdElemA(_))));
}

#[test]
fn try_get_first_and_long_count_are_generated() {
    let module = run(&GenConfig::standard());
    let first = method(&module, "TryGetFirstRefFuncHelper", &["ConcatEnumerable"]);
    assert_eq!(first.return_type, ScalarType::Bool.into());
    assert!(first.body.calls("Invoke"));
    let count = method(&module, "LongCountRefFuncHelper", &["NativeArray<T>"]);
    assert_eq!(count.return_type, ScalarType::I64.into());
    assert!(count.body.calls("get_Item"));
}

#[test]
fn aggregate_checks_arguments_before_looping() {
    let module = run(&GenConfig::standard());
    let array = method(&module, "AggregateRefValue2RefsHelper", &["T[]"]);
    assert_eq!(throws(array), vec!["this", "func", "resultFunc"]);
    let generic = method(&module, "AggregateRefValue1RefHelper", &["WhereEnumerable"]);
    assert_eq!(throws(generic), vec!["func"]);
    assert_eq!(generic.return_type, TypeRef::Void);
}

#[test]
fn aggregate_value_seed_is_returned() {
    let module = run(&GenConfig::standard());
    let m = method(&module, "AggregateValue1FuncHelper", &["NativeArray<T>"]);
    assert_eq!(m.return_type, TypeRef::param("TAccumulate"));
    assert_eq!(m.params[1].mode, ParamMode::Value);
    assert!(m.body.calls("TryGetNext"));
}

#[test]
fn aggregate_open_generic_overload() {
    let module = run(&GenConfig::standard());
    let holder = module
        .holder("AggregateRefValue1RefHelper")
        .unwrap_or_else(|| panic!("no aggregate holder"));
    assert_eq!(holder.len(), 7);
    let m = method(&module, "AggregateRefValue1RefHelper", &[OPEN_GENERIC]);
    assert_eq!(m.params[0].mode, ParamMode::In);
    assert_eq!(m.params[0].ty, TypeRef::param("TEnumerable"));
    let names: Vec<&str> = m.generics.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["T", "TEnumerator", "TEnumerable", "TAccumulate"]);
    assert!(m.body.ops.iter().any(|op| matches!(
        op,
        Op::Call(mr) | Op::CallVirt(mr)
            if mr.name == "GetEnumerator" && mr.owner == TypeRef::param("TEnumerable")
    )));
}

// ── Gating and errors ───────────────────────────────────────────────

#[test]
fn disabled_sources_and_operators_emit_nothing() {
    let mut cfg = GenConfig::standard();
    cfg.disable_operator(op::WHERE);
    for name in ["T[]", "NativeArray<T>", "RepeatEnumerable", "WhereEnumerable", "SelectEnumerable", "ConcatEnumerable"] {
        cfg.disable_source(op::LONG_COUNT, name);
    }
    cfg.disable_source(op::SELECT, "T[]");
    let module = run(&cfg);
    assert!(module.holder("WhereFuncHelper").is_none());
    assert!(module.holder("LongCountRefFuncHelper").is_none());
    let select = module.holder("SelectFuncHelper").unwrap_or_else(|| panic!("no select"));
    assert_eq!(select.len(), 5);
}

#[test]
fn unknown_special_source_aborts_the_run() {
    let mut cfg = GenConfig::standard();
    cfg.sources.push(SourceDecl::special("Span<T>"));
    cfg.enabled_sources.push("Span<T>".to_owned());
    cfg.operators
        .get_mut(op::WHERE)
        .unwrap_or_else(|| panic!("no where"))
        .unary
        .insert("Span<T>".to_owned(), false);
    // Classified before its toggle is read, so even a disabled entry fails.
    let err = crate::generate(&cfg, &TemplateModule::standard());
    assert!(matches!(
        err,
        Err(crate::GenError::UnsupportedCombination { ref operator, .. }) if operator == "Where"
    ));
}

#[test]
fn whole_standard_run_is_deterministic() {
    let a = run(&GenConfig::standard()).to_string();
    let b = run(&GenConfig::standard()).to_string();
    assert_eq!(a, b);
}
