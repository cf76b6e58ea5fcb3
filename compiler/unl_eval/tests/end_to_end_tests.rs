#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Generated operator bodies, executed.
//!
//! Every test generates the standard module once, picks one specialized
//! method and runs it on the machine:
//! 1. Lazy operators return Views whose contents are checked
//! 2. Eager operators return their result and write their `out`/`ref` slots
//! 3. Every enumerator a body opens is disposed on every exit

use std::sync::OnceLock;

use pretty_assertions::assert_eq;
use unl_eval::{EvalError, Machine, Outcome, Value};
use unl_gen::{generate, ExtendedModule, GenConfig, GeneratedMethod, TemplateModule, OPEN_GENERIC};

fn module() -> &'static ExtendedModule {
    static MODULE: OnceLock<ExtendedModule> = OnceLock::new();
    MODULE.get_or_init(|| {
        generate(&GenConfig::standard(), &TemplateModule::standard()).expect("standard run")
    })
}

fn method(holder: &str, sources: &[&str]) -> &'static GeneratedMethod {
    module()
        .holder(holder)
        .and_then(|h| h.method_for(sources))
        .unwrap_or_else(|| panic!("no {holder} method for {sources:?}"))
}

fn call(vm: &mut Machine, m: &GeneratedMethod, args: Vec<Value>) -> Outcome {
    let out = vm
        .run(&m.function, &m.body, args)
        .unwrap_or_else(|e| panic!("{}: {e}", m.name));
    assert_eq!(vm.live_enumerators(), 0, "{} leaked an enumerator", m.name);
    out
}

fn ints(xs: &[i32]) -> Vec<Value> {
    xs.iter().copied().map(Value::I32).collect()
}

fn int(v: &Value) -> i32 {
    match v {
        Value::I32(x) => *x,
        other => panic!("expected int, found {other:?}"),
    }
}

fn is_even(vm: &mut Machine) -> Value {
    vm.func(|x| Value::Bool(int(x) % 2 == 0))
}

fn is_odd(vm: &mut Machine) -> Value {
    vm.func(|x| Value::Bool(int(x) % 2 != 0))
}

/// `RefAction<int, int>` adding the element into the accumulator.
fn add(vm: &mut Machine) -> Value {
    vm.action(|acc, x| *acc = Value::I32(int(acc) + int(x)))
}

const ALLOCATOR_TEMP: Value = Value::I32(2);

// ── Lazy operators ──────────────────────────────────────────────────

#[test]
fn where_over_array() {
    let m = method("WhereFuncHelper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[1, 2, 3, 4, 5, 6]));
    let even = is_even(&mut vm);
    let out = call(&mut vm, m, vec![xs, even]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[2, 4, 6]));
}

#[test]
fn where_over_a_view() {
    let m = method("WhereFuncHelper", &["SelectEnumerable"]);
    let mut vm = Machine::new();
    let source = vm.sequence(ints(&[5, 8, 11]));
    let odd = is_odd(&mut vm);
    let out = call(&mut vm, m, vec![source, odd]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[5, 11]));
}

#[test]
fn select_over_native_buffer() {
    let m = method("SelectFuncHelper", &["NativeArray<T>"]);
    let mut vm = Machine::new();
    let buffer = vm.array(ints(&[1, 2, 3]));
    let square = vm.func(|x| Value::I64(i64::from(int(x)).pow(2)));
    let out = call(&mut vm, m, vec![buffer, square]);
    assert_eq!(
        vm.items(out.value).unwrap(),
        vec![Value::I64(1), Value::I64(4), Value::I64(9)]
    );
}

#[test]
fn concat_keeps_operand_order() {
    let mut vm = Machine::new();
    let forward = method("ConcatNoneHelper", &["T[]", "RepeatEnumerable"]);
    let xs = vm.array(ints(&[1, 2]));
    let repeat = vm.sequence(ints(&[9, 9]));
    let out = call(&mut vm, forward, vec![xs, repeat]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[1, 2, 9, 9]));

    let backward = method("ConcatNoneHelper", &["RepeatEnumerable", "T[]"]);
    let out = call(&mut vm, backward, vec![repeat, xs]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[9, 9, 1, 2]));
}

#[test]
fn distinct_keeps_first_occurrences() {
    let m = method("DistinctNoneHelper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[3, 1, 3, 2, 1]));
    let out = call(&mut vm, m, vec![xs, ALLOCATOR_TEMP]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[3, 1, 2]));
}

#[test]
fn union_of_array_and_native_buffer() {
    let m = method("UnionNoneHelper", &["T[]", "NativeArray<T>"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[1, 2, 2]));
    let buffer = vm.array(ints(&[2, 3, 1, 4]));
    let out = call(&mut vm, m, vec![xs, buffer, ALLOCATOR_TEMP]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[1, 2, 3, 4]));
}

#[test]
fn min_and_max_by_yield_every_tie() {
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[4, -1, 7, 1, -7]));
    let magnitude = vm.func(|x| Value::I32(int(x).abs()));

    let min = method("MinByRefFuncInt32Helper", &["T[]"]);
    let out = call(&mut vm, min, vec![xs, magnitude, ALLOCATOR_TEMP]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[-1, 1]));

    let max = method("MaxByRefFuncInt32Helper", &["T[]"]);
    let out = call(&mut vm, max, vec![xs, magnitude, ALLOCATOR_TEMP]);
    assert_eq!(vm.items(out.value).unwrap(), ints(&[7, -7]));
}

#[test]
fn nan_key_is_the_minimum_wherever_it_appears() {
    let mut vm = Machine::new();
    let key = vm.func(|x| *x);
    let min = method("MinByRefFuncDoubleHelper", &["T[]"]);
    let max = method("MaxByRefFuncDoubleHelper", &["T[]"]);
    let is_nan = |v: &Value| matches!(v, Value::F64(x) if x.is_nan());

    for xs in [[f64::NAN, 1.0, 2.0], [1.0, 2.0, f64::NAN]] {
        let source = vm.array(xs.map(Value::F64));
        let out = call(&mut vm, min, vec![source, key, ALLOCATOR_TEMP]);
        let items = vm.items(out.value).unwrap();
        assert_eq!(items.len(), 1);
        assert!(is_nan(&items[0]));

        let out = call(&mut vm, max, vec![source, key, ALLOCATOR_TEMP]);
        assert_eq!(vm.items(out.value).unwrap(), vec![Value::F64(2.0)]);
    }
}

// ── Average ─────────────────────────────────────────────────────────

#[test]
fn average_int32_truncates_toward_zero() {
    let m = method("TryGetAverageNoneInt32Helper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[1, 2, 4]));
    let out = call(&mut vm, m, vec![xs, Value::I32(0)]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::I32(2)));

    let negative = vm.array(ints(&[-1, -2, -4]));
    let out = call(&mut vm, m, vec![negative, Value::I32(0)]);
    assert_eq!(out.param(1), Some(Value::I32(-2)));
}

#[test]
fn average_int32_does_not_overflow_the_sum() {
    let m = method("TryGetAverageNoneInt32Helper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[i32::MAX, i32::MAX, i32::MAX]));
    let out = call(&mut vm, m, vec![xs, Value::I32(0)]);
    assert_eq!(out.param(1), Some(Value::I32(i32::MAX)));
}

#[test]
fn average_of_empty_source_fails_with_default() {
    let m = method("TryGetAverageNoneInt32Helper", &["T[]"]);
    let mut vm = Machine::new();
    let empty = vm.array(Vec::<Value>::new());
    let out = call(&mut vm, m, vec![empty, Value::I32(99)]);
    assert_eq!(out.value, Value::Bool(false));
    assert_eq!(out.param(1), Some(Value::I32(0)));
}

#[test]
fn average_double_over_native_buffer() {
    let m = method("TryGetAverageNoneDoubleHelper", &["NativeArray<T>"]);
    let mut vm = Machine::new();
    let buffer = vm.array([1.0, 2.0].map(Value::F64));
    let out = call(&mut vm, m, vec![buffer, Value::F64(0.0)]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::F64(1.5)));
}

#[test]
fn average_uint64_pulls_from_a_view() {
    let m = method("TryGetAverageNoneUInt64Helper", &["SelectEnumerable"]);
    let mut vm = Machine::new();
    let view = vm.sequence([1, 2, 4].map(Value::U64));
    let out = call(&mut vm, m, vec![view, Value::U64(0)]);
    assert_eq!(out.param(1), Some(Value::U64(2)));

    let empty = vm.sequence(Vec::<Value>::new());
    let out = call(&mut vm, m, vec![empty, Value::U64(7)]);
    assert_eq!(out.value, Value::Bool(false));
    assert_eq!(out.param(1), Some(Value::U64(0)));
}

#[test]
fn average_int64_over_repeat() {
    let m = method("TryGetAverageNoneInt64Helper", &["RepeatEnumerable"]);
    let mut vm = Machine::new();
    let repeat = vm.sequence([Value::I64(-5); 4]);
    let out = call(&mut vm, m, vec![repeat, Value::I64(0)]);
    assert_eq!(out.param(1), Some(Value::I64(-5)));
}

// ── Predicate searches ──────────────────────────────────────────────

#[test]
fn try_get_last_reverse_scan_over_array() {
    let m = method("TryGetLastRefFuncHelper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[2, 3, 4, 5]));
    let even = is_even(&mut vm);
    let out = call(&mut vm, m, vec![xs, Value::Null, even]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::I32(4)));

    let odd_only = vm.array(ints(&[1, 3]));
    let out = call(&mut vm, m, vec![odd_only, Value::I32(8), even]);
    assert_eq!(out.value, Value::Bool(false));
}

#[test]
fn try_get_last_reverse_scan_over_repeat() {
    let m = method("TryGetLastRefFuncHelper", &["RepeatEnumerable"]);
    let mut vm = Machine::new();
    let repeat = vm.sequence(ints(&[6, 6, 6]));
    let even = is_even(&mut vm);
    let out = call(&mut vm, m, vec![repeat, Value::Null, even]);
    assert_eq!(out.param(1), Some(Value::I32(6)));
}

#[test]
fn try_get_last_forward_scan_over_filtered_view() {
    let m = method("TryGetLastRefFuncHelper", &["WhereEnumerable"]);
    let mut vm = Machine::new();
    let view = vm.sequence(ints(&[1, 3, 4, 7, 8]));
    let odd = is_odd(&mut vm);
    let out = call(&mut vm, m, vec![view, Value::Null, odd]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::I32(7)));
}

#[test]
fn try_get_first_stops_at_the_first_match() {
    let m = method("TryGetFirstRefFuncHelper", &["ConcatEnumerable"]);
    let mut vm = Machine::new();
    let view = vm.sequence(ints(&[1, 2, 3, 4]));
    let even = is_even(&mut vm);
    let out = call(&mut vm, m, vec![view, Value::Null, even]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::I32(2)));

    let none = vm.sequence(ints(&[1, 3]));
    let out = call(&mut vm, m, vec![none, Value::Null, even]);
    assert_eq!(out.value, Value::Bool(false));
}

#[test]
fn try_get_first_over_array() {
    let m = method("TryGetFirstRefFuncHelper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[7, 9, 10, 12]));
    let even = is_even(&mut vm);
    let out = call(&mut vm, m, vec![xs, Value::Null, even]);
    assert_eq!(out.param(1), Some(Value::I32(10)));
}

#[test]
fn long_count_by_index_and_by_pull() {
    let mut vm = Machine::new();
    let even = is_even(&mut vm);

    let indexed = method("LongCountRefFuncHelper", &["NativeArray<T>"]);
    let buffer = vm.array(ints(&[1, 2, 4, 5, 6]));
    let out = call(&mut vm, indexed, vec![buffer, even]);
    assert_eq!(out.value, Value::I64(3));

    let pulled = method("LongCountRefFuncHelper", &["SelectEnumerable"]);
    let view = vm.sequence(ints(&[2, 2, 1]));
    let out = call(&mut vm, pulled, vec![view, even]);
    assert_eq!(out.value, Value::I64(2));
}

// ── Aggregate ───────────────────────────────────────────────────────

#[test]
fn aggregate_into_referenced_accumulator() {
    let m = method("AggregateRefValue1RefHelper", &["T[]"]);
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[1, 2, 3, 4]));
    let func = add(&mut vm);
    let out = call(&mut vm, m, vec![xs, Value::I32(10), func]);
    assert_eq!(out.value, Value::Unit);
    assert_eq!(out.param(1), Some(Value::I32(20)));
}

#[test]
fn aggregate_returns_the_folded_seed() {
    let m = method("AggregateValue1FuncHelper", &["NativeArray<T>"]);
    let mut vm = Machine::new();
    let buffer = vm.array(ints(&[5, 6]));
    let func = add(&mut vm);
    let out = call(&mut vm, m, vec![buffer, Value::I32(0), func]);
    assert_eq!(out.value, Value::I32(11));
}

#[test]
fn aggregate_projects_through_result_func() {
    let m = method("AggregateRefValue2RefsHelper", &["WhereEnumerable"]);
    let mut vm = Machine::new();
    let view = vm.sequence(ints(&[1, 2, 3]));
    let func = add(&mut vm);
    let describe = vm.func(|acc| Value::Bool(int(acc) > 5));
    let out = call(&mut vm, m, vec![view, Value::I32(0), func, describe]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(1), Some(Value::I32(6)));
}

#[test]
fn aggregate_over_open_generic_source() {
    let m = method("AggregateRefValue1RefHelper", &[OPEN_GENERIC]);
    let mut vm = Machine::new();
    let source = vm.sequence(ints(&[4, 4, 4]));
    let func = add(&mut vm);
    let out = call(&mut vm, m, vec![source, Value::I32(0), func]);
    assert_eq!(out.param(1), Some(Value::I32(12)));
}

#[test]
fn aggregate_over_empty_source_leaves_accumulator() {
    let m = method("AggregateRefValue1RefHelper", &["RepeatEnumerable"]);
    let mut vm = Machine::new();
    let empty = vm.sequence(Vec::<Value>::new());
    let func = add(&mut vm);
    let out = call(&mut vm, m, vec![empty, Value::I32(3), func]);
    assert_eq!(out.param(1), Some(Value::I32(3)));
}

#[test]
fn aggregate_rejects_null_arguments_before_looping() {
    let mut vm = Machine::new();
    let xs = vm.array(ints(&[1]));
    let func = add(&mut vm);

    let m = method("AggregateRefValue1RefHelper", &["T[]"]);
    assert_eq!(
        vm.run(&m.function, &m.body, vec![Value::Null, Value::I32(0), func]),
        Err(EvalError::ArgumentNull {
            param: "this".to_owned()
        })
    );
    assert_eq!(
        vm.run(&m.function, &m.body, vec![xs, Value::I32(0), Value::Null]),
        Err(EvalError::ArgumentNull {
            param: "func".to_owned()
        })
    );

    let m = method("AggregateRefValue2RefsHelper", &["T[]"]);
    let err = vm
        .run(&m.function, &m.body, vec![xs, Value::I32(0), func, Value::Null])
        .unwrap_err();
    assert_eq!(err.to_string(), "Value cannot be null. (Parameter 'resultFunc')");
    assert_eq!(vm.live_enumerators(), 0);
}
