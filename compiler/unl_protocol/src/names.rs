//! Member and type names generated code binds to.
//!
//! The generator emits calls by these names and the evaluator dispatches on
//! them, so both sides agree on one list.

// ── Enumerator members ──────────────────────────────────────────────

pub const TRY_MOVE_NEXT: &str = "TryMoveNext";
pub const TRY_GET_NEXT: &str = "TryGetNext";
pub const GET_CURRENT: &str = "get_Current";
pub const DISPOSE: &str = "Dispose";

// ── Enumerable members ──────────────────────────────────────────────

pub const GET_ENUMERATOR: &str = "GetEnumerator";
pub const LONG_COUNT: &str = "LongCount";
pub const GET_ITEM: &str = "get_Item";
pub const CTOR: &str = ".ctor";

/// Nested enumerator type of every enumerable, by convention.
pub const ENUMERATOR: &str = "Enumerator";

// ── Strategies and delegates ────────────────────────────────────────

pub const INVOKE: &str = "Invoke";

pub const FUNC: &str = "Func";
pub const REF_FUNC: &str = "RefFunc";
pub const REF_ACTION: &str = "RefAction";
pub const DELEGATE_FUNC_TO_STRUCT_OPERATOR_FUNC: &str = "DelegateFuncToStructOperatorFunc";
pub const DELEGATE_FUNC_TO_ACTION: &str = "DelegateFuncToAction";
pub const DELEGATE_REF_FUNC_TO_STRUCT_OPERATOR_FUNC: &str = "DelegateRefFuncToStructOperatorFunc";
pub const DEFAULT_EQUALITY_COMPARER: &str = "DefaultEqualityComparer";
pub const ALLOCATOR: &str = "Allocator";
pub const EQUATABLE: &str = "IEquatable";
pub const REF_ENUMERATOR_INTERFACE: &str = "IRefEnumerator";
pub const REF_ENUMERABLE_INTERFACE: &str = "IRefEnumerable";

// ── Sources and views ───────────────────────────────────────────────

pub const ARRAY_SOURCE: &str = "T[]";
pub const NATIVE_ARRAY_SOURCE: &str = "NativeArray<T>";
pub const NATIVE_ARRAY: &str = "NativeArray";
pub const ARRAY_ENUMERABLE: &str = "ArrayEnumerable";
pub const NATIVE_ENUMERABLE: &str = "NativeEnumerable";
pub const WHERE_ENUMERABLE: &str = "WhereEnumerable";
pub const SELECT_ENUMERABLE: &str = "SelectEnumerable";
pub const CONCAT_ENUMERABLE: &str = "ConcatEnumerable";
pub const DISTINCT_ENUMERABLE: &str = "DistinctEnumerable";
pub const MIN_MAX_BY_ENUMERABLE: &str = "MinMaxByEnumerable";
pub const REPEAT_ENUMERABLE: &str = "RepeatEnumerable";
