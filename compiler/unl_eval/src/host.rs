//! The runtime library, as far as generated bodies call into it.
//!
//! Calls dispatch on the member name alone (`GetEnumerator`, `TryMoveNext`,
//! `Invoke`, ...), since every stub type implements the protocol members
//! the same way. Constructors dispatch on the owner's root name.
//!
//! Views are materialized when constructed: `new WhereEnumerable(...)`
//! filters immediately into a sequence object. Results match lazy
//! evaluation as long as the delegates are pure, which is all a harness for
//! generated bodies needs.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use unl_ir::MethodRef;
use unl_protocol::names;

use crate::error::{invalid_place, mismatch, EvalError};
use crate::heap::{Delegate, Heap, HeapObject, ObjId};
use crate::machine::Frame;
use crate::value::{Place, Value};

fn arg(args: &[Value], index: usize) -> Result<Value, EvalError> {
    args.get(index).copied().ok_or(EvalError::BadSlot {
        kind: "argument",
        index,
    })
}

fn unknown(method: &MethodRef) -> EvalError {
    EvalError::UnknownMethod {
        method: method.to_string(),
    }
}

fn seq(heap: &mut Heap, items: Vec<Value>) -> Value {
    Value::Obj(heap.alloc(HeapObject::Seq(items)))
}

/// Apply a `Func`-shaped delegate.
fn apply(heap: &Heap, delegate: Value, item: &Value) -> Result<Value, EvalError> {
    match heap.delegate(delegate.as_obj()?)? {
        Delegate::Func(f) => Ok(f(item)),
        other => Err(mismatch("Func delegate", &other)),
    }
}

// ── Constructors ────────────────────────────────────────────────────

/// `newobj`: build a source wrapper, View or strategy.
pub(crate) fn construct(
    heap: &mut Heap,
    frame: &Frame<'_>,
    ctor: &MethodRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let owner = ctor.owner.root_name().ok_or_else(|| unknown(ctor))?;
    tracing::trace!(owner, arity = args.len(), "construct");
    match owner {
        names::ARRAY_ENUMERABLE | names::NATIVE_ENUMERABLE => {
            let source = frame.object(heap, arg(args, 0)?)?;
            let items = heap.items(source)?.to_vec();
            Ok(seq(heap, items))
        }
        names::REPEAT_ENUMERABLE => {
            let element = frame.deref(heap, arg(args, 0)?)?;
            let count = frame.deref(heap, arg(args, 1)?)?.as_i64()?;
            let count = usize::try_from(count).unwrap_or(0);
            Ok(seq(heap, vec![element; count]))
        }
        names::WHERE_ENUMERABLE => {
            let (items, predicate) = source_and_strategy(heap, frame, args)?;
            let mut kept = Vec::new();
            for x in items {
                if apply(heap, predicate, &x)?.truthy()? {
                    kept.push(x);
                }
            }
            Ok(seq(heap, kept))
        }
        names::SELECT_ENUMERABLE => {
            let (items, selector) = source_and_strategy(heap, frame, args)?;
            let mapped = items
                .iter()
                .map(|x| apply(heap, selector, x))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(seq(heap, mapped))
        }
        names::CONCAT_ENUMERABLE => {
            let first = frame.object(heap, arg(args, 0)?)?;
            let second = frame.object(heap, arg(args, 1)?)?;
            let mut items = heap.items(first)?.to_vec();
            items.extend_from_slice(heap.items(second)?);
            Ok(seq(heap, items))
        }
        names::DISTINCT_ENUMERABLE => {
            let source = frame.object(heap, arg(args, 0)?)?;
            let mut seen = FxHashSet::default();
            let items: Vec<Value> = heap
                .items(source)?
                .iter()
                .copied()
                .filter(|x| seen.insert(x.key()))
                .collect();
            Ok(seq(heap, items))
        }
        names::MIN_MAX_BY_ENUMERABLE => {
            let (items, selector) = source_and_strategy(heap, frame, args)?;
            let is_max = frame.deref(heap, arg(args, 2)?)?.truthy()?;
            let extremes = extremes(heap, &items, selector, is_max)?;
            Ok(seq(heap, extremes))
        }
        names::DELEGATE_FUNC_TO_STRUCT_OPERATOR_FUNC
        | names::DELEGATE_FUNC_TO_ACTION
        | names::DELEGATE_REF_FUNC_TO_STRUCT_OPERATOR_FUNC => frame.deref(heap, arg(args, 0)?),
        _ => Err(unknown(ctor)),
    }
}

/// Arguments `(ref source, ref strategy, ...)` of a View constructor.
fn source_and_strategy(
    heap: &Heap,
    frame: &Frame<'_>,
    args: &[Value],
) -> Result<(Vec<Value>, Value), EvalError> {
    let source = frame.object(heap, arg(args, 0)?)?;
    let strategy = frame.deref(heap, arg(args, 1)?)?;
    Ok((heap.items(source)?.to_vec(), strategy))
}

/// Every element whose key is the extreme key, in source order.
fn extremes(
    heap: &Heap,
    items: &[Value],
    selector: Value,
    is_max: bool,
) -> Result<Vec<Value>, EvalError> {
    let better = if is_max {
        Ordering::Greater
    } else {
        Ordering::Less
    };
    let mut best: Option<Value> = None;
    let mut out = Vec::new();
    for &x in items {
        let key = apply(heap, selector, &x)?;
        let ord = match best {
            None => better,
            Some(b) => key.key_order(b)?,
        };
        if ord == better {
            best = Some(key);
            out.clear();
            out.push(x);
        } else if ord == Ordering::Equal {
            out.push(x);
        }
    }
    Ok(out)
}

// ── Calls ───────────────────────────────────────────────────────────

/// `call`/`callvirt` on a protocol member or delegate. Void members
/// return [`Value::Unit`].
pub(crate) fn call(
    heap: &mut Heap,
    frame: &mut Frame<'_>,
    method: &MethodRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    tracing::trace!(method = %method.name, "host call");
    match method.name.as_str() {
        names::GET_ENUMERATOR => {
            let source = frame.object(heap, arg(args, 0)?)?;
            Ok(Value::Obj(heap.open(source)?))
        }
        names::LONG_COUNT => {
            let source = frame.object(heap, arg(args, 0)?)?;
            let len = heap.items(source)?.len();
            Ok(Value::I64(i64::try_from(len).unwrap_or(i64::MAX)))
        }
        names::GET_ITEM => {
            let source = frame.object(heap, arg(args, 0)?)?;
            let i = frame.deref(heap, arg(args, 1)?)?.as_i64()?;
            let len = heap.items(source)?.len();
            let index = usize::try_from(i)
                .ok()
                .filter(|&i| i < len)
                .ok_or(EvalError::IndexOutOfRange { index: i, len })?;
            Ok(Value::Ref(Place::Element { obj: source, index }))
        }
        names::TRY_MOVE_NEXT => {
            let e = frame.object(heap, arg(args, 0)?)?;
            Ok(Value::Bool(advance(heap, e)?.is_some()))
        }
        names::GET_CURRENT => {
            let e = frame.object(heap, arg(args, 0)?)?;
            let cursor = heap.cursor(e)?;
            let index = cursor
                .current()
                .ok_or_else(|| invalid_place("Current read outside an active enumeration"))?;
            Ok(Value::Ref(Place::Element {
                obj: cursor.seq(),
                index,
            }))
        }
        names::TRY_GET_NEXT => {
            let e = frame.object(heap, arg(args, 0)?)?;
            let Value::Ref(ok) = arg(args, 1)? else {
                return Err(mismatch("reference to bool", &arg(args, 1)?));
            };
            let found = advance(heap, e)?;
            frame.store(heap, ok, Value::Bool(found.is_some()))?;
            Ok(match found {
                Some(place) => Value::Ref(place),
                None => Value::Ref(Place::Cell(heap.alloc(HeapObject::Cell(Value::Null)))),
            })
        }
        names::DISPOSE => {
            let e = frame.object(heap, arg(args, 0)?)?;
            heap.cursor_mut(e)?.dispose();
            Ok(Value::Unit)
        }
        names::INVOKE => invoke(heap, frame, method, args),
        // Constructor run on existing storage: `call .ctor(&target, args)`.
        names::CTOR => {
            let Value::Ref(target) = arg(args, 0)? else {
                return Err(mismatch("reference to constructed storage", &arg(args, 0)?));
            };
            let rest = args.get(1..).unwrap_or_default();
            let value = construct(heap, frame, method, rest)?;
            frame.store(heap, target, value)?;
            Ok(Value::Unit)
        }
        _ => Err(unknown(method)),
    }
}

/// Advance `e`; the element reached, if any.
fn advance(heap: &mut Heap, e: ObjId) -> Result<Option<Place>, EvalError> {
    let seq = heap.cursor(e)?.seq();
    let len = heap.items(seq)?.len();
    let cursor = heap.cursor_mut(e)?;
    Ok(cursor
        .advance(len)
        .then(|| cursor.current())
        .flatten()
        .map(|index| Place::Element { obj: seq, index }))
}

/// `Invoke` on `Func`/`RefFunc` (one argument, by value or reference) or
/// `RefAction` (accumulator reference plus element).
fn invoke(
    heap: &mut Heap,
    frame: &mut Frame<'_>,
    method: &MethodRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let target = frame.object(heap, arg(args, 0)?)?;
    match (heap.delegate(target)?, method.arity) {
        (Delegate::Func(f), 1) => {
            let x = frame.deref(heap, arg(args, 1)?)?;
            Ok(f(&x))
        }
        (Delegate::Action(f), 2) => {
            let Value::Ref(acc) = arg(args, 1)? else {
                return Err(mismatch("accumulator reference", &arg(args, 1)?));
            };
            let x = frame.deref(heap, arg(args, 2)?)?;
            let mut value = frame.load(heap, acc)?;
            f(&mut value, &x);
            frame.store(heap, acc, value)?;
            Ok(Value::Unit)
        }
        _ => Err(unknown(method)),
    }
}
