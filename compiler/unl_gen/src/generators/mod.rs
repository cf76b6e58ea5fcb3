//! Per-operator generators.
//!
//! Every generator follows the same shape: intersect the globally enabled
//! sources with the ones it supports, classify each candidate (each ordered
//! pair for binary operators), pick the lowering strategy for its kind and
//! write exactly one method per enabled combination through the shared
//! [`SeqBuilder`]. The helpers in this module are that shared shape; the
//! submodules only decide what each method body does.

mod aggregate;
mod average;
mod concat;
mod distinct;
mod filter;
mod long_count;
mod min_max_by;
mod select;
mod try_get_first;
mod try_get_last;
mod union;

use unl_ir::{
    lower, BinOp, Const, GenericParam, MethodRef, Operand, ScalarType, SeqBuilder,
    SeqValue, TypeRef, VarId,
};
use unl_protocol::names;

use crate::context::GenContext;
use crate::descriptor::{NumericType, OperatorSpec};
use crate::error::GenError;
use crate::module::{ref_enumerable, ref_enumerator, GeneratedMethod, HolderType};
use crate::registry::{ResolvedSource, SourceKind};

pub use aggregate::{AggregateGenerator, AggregateShape};
pub use average::AverageGenerator;
pub use concat::ConcatGenerator;
pub use distinct::DistinctGenerator;
pub use filter::WhereGenerator;
pub use long_count::LongCountGenerator;
pub use min_max_by::{Direction, MinMaxByGenerator};
pub use select::SelectGenerator;
pub use try_get_first::TryGetFirstGenerator;
pub use try_get_last::TryGetLastGenerator;
pub use union::UnionGenerator;

/// One operator unit: a descriptor plus the code that fills its holder.
pub trait OperatorGenerator {
    fn spec(&self) -> &OperatorSpec;

    /// Build the holder for this unit, or `None` when nothing is enabled.
    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError>;
}

/// Every generator the runtime library ships, in emission order.
pub fn standard_generators() -> Vec<Box<dyn OperatorGenerator>> {
    let mut generators: Vec<Box<dyn OperatorGenerator>> = vec![
        Box::new(WhereGenerator::new()),
        Box::new(SelectGenerator::new()),
        Box::new(ConcatGenerator::new()),
        Box::new(DistinctGenerator::new()),
        Box::new(UnionGenerator::new()),
        Box::new(AggregateGenerator::new(AggregateShape::RefValue1Ref)),
        Box::new(AggregateGenerator::new(AggregateShape::Value1Func)),
        Box::new(AggregateGenerator::new(AggregateShape::RefValue2Refs)),
    ];
    for ty in NumericType::ALL {
        generators.push(Box::new(AverageGenerator::new(ty)));
    }
    generators.push(Box::new(TryGetLastGenerator::new()));
    generators.push(Box::new(TryGetFirstGenerator::new()));
    generators.push(Box::new(LongCountGenerator::new()));
    for direction in [Direction::Min, Direction::Max] {
        for key in NumericType::ALL {
            generators.push(Box::new(MinMaxByGenerator::new(direction, key)));
        }
    }
    generators
}

// ── Candidate enumeration ───────────────────────────────────────────

fn non_empty(holder: HolderType) -> Option<HolderType> {
    (!holder.is_empty()).then_some(holder)
}

/// Push one method per enabled single-source combination into `holder`.
///
/// A candidate is classified before its per-operator toggle is consulted,
/// so a misconfigured source aborts the unit even when it is switched off.
pub(crate) fn collect_unary(
    cx: &GenContext<'_>,
    spec: &OperatorSpec,
    holder: &mut HolderType,
    element: &TypeRef,
    mut build: impl FnMut(&ResolvedSource) -> Result<GeneratedMethod, GenError>,
) -> Result<(), GenError> {
    for name in cx.matrix().candidates(spec.name) {
        let kind = cx.registry().classify(spec.name, name)?;
        spec.check_kind(&kind, name)?;
        if !cx.matrix().is_enabled(spec.name, name) {
            tracing::trace!(operator = spec.name, source = name, "source disabled");
            continue;
        }
        let src = cx.registry().resolve(spec.name, name, element, "0")?;
        holder.push(build(&src)?);
    }
    Ok(())
}

pub(crate) fn generate_unary(
    cx: &GenContext<'_>,
    spec: &OperatorSpec,
    element: &TypeRef,
    build: impl FnMut(&ResolvedSource) -> Result<GeneratedMethod, GenError>,
) -> Result<Option<HolderType>, GenError> {
    if !spec.is_active(cx.matrix()) {
        return Ok(None);
    }
    let mut holder = HolderType::new(spec.holder.clone(), spec.name);
    collect_unary(cx, spec, &mut holder, element, build)?;
    Ok(non_empty(holder))
}

/// One method per enabled ordered pair. `(A, B)` and `(B, A)` are distinct
/// combinations. Each operator in `also` must enable the same pair.
pub(crate) fn generate_binary(
    cx: &GenContext<'_>,
    spec: &OperatorSpec,
    also: &[&str],
    mut build: impl FnMut(&ResolvedSource, &ResolvedSource) -> Result<GeneratedMethod, GenError>,
) -> Result<Option<HolderType>, GenError> {
    if !spec.is_active(cx.matrix()) {
        return Ok(None);
    }
    let matrix = cx.matrix();
    let candidates = matrix.candidates(spec.name);
    for name in &candidates {
        let kind = cx.registry().classify(spec.name, name)?;
        spec.check_kind(&kind, name)?;
    }

    let t = element();
    let mut holder = HolderType::new(spec.holder.clone(), spec.name);
    for first in &candidates {
        for second in &candidates {
            let enabled = matrix.is_pair_enabled(spec.name, first, second)
                && also.iter().all(|o| matrix.is_pair_enabled(o, first, second));
            if !enabled {
                continue;
            }
            let a = cx.registry().resolve(spec.name, first, &t, "0")?;
            let b = cx.registry().resolve(spec.name, second, &t, "1")?;
            holder.push(build(&a, &b)?);
        }
    }
    Ok(non_empty(holder))
}

// ── Signatures ──────────────────────────────────────────────────────

/// The element type parameter every generic operator is written over.
pub(crate) fn element() -> TypeRef {
    TypeRef::param("T")
}

pub(crate) fn element_param() -> GenericParam {
    GenericParam::unmanaged("T")
}

/// `T : unmanaged, IEquatable<T>`.
pub(crate) fn equatable_element_param() -> GenericParam {
    element_param().with_constraint(TypeRef::named(names::EQUATABLE, vec![element()]))
}

pub(crate) fn long() -> TypeRef {
    ScalarType::I64.into()
}

pub(crate) fn boolean() -> TypeRef {
    ScalarType::Bool.into()
}

pub(crate) fn allocator() -> TypeRef {
    TypeRef::named(names::ALLOCATOR, Vec::new())
}

/// `Func<A, R>`, `RefFunc<A, R>` and `RefAction<A, B>` all take two
/// arguments.
pub(crate) fn delegate(name: &str, a: TypeRef, b: TypeRef) -> TypeRef {
    TypeRef::named(name, vec![a, b])
}

/// Leading generics followed by those the sources contribute.
pub(crate) fn method_generics(
    leading: impl IntoIterator<Item = GenericParam>,
    sources: &[&ResolvedSource],
) -> Vec<GenericParam> {
    let mut generics: Vec<GenericParam> = leading.into_iter().collect();
    for src in sources {
        generics.extend(src.generics.iter().cloned());
    }
    generics
}

/// Declare a source parameter with the mode its kind requires.
pub(crate) fn source_param(b: &mut SeqBuilder, src: &ResolvedSource, name: &str) -> VarId {
    b.param(name, src.base.clone(), src.param_mode())
}

/// `allocator = Allocator.Temp`.
pub(crate) fn allocator_param(b: &mut SeqBuilder) -> VarId {
    let temp = unl_protocol::Allocator::Temp.raw();
    b.param_with_default("allocator", allocator(), Const::I32(temp))
}

/// Finish, lower and package one method.
pub(crate) fn finish(
    b: SeqBuilder,
    name: &str,
    return_type: TypeRef,
    sources: &[&ResolvedSource],
    generics: Vec<GenericParam>,
) -> Result<GeneratedMethod, GenError> {
    let function = b.finish(name, return_type)?;
    let body = lower(&function)?;
    Ok(GeneratedMethod::new(
        sources.iter().map(|s| s.name.clone()).collect(),
        generics,
        function,
        body,
    ))
}

// ── Emission helpers ────────────────────────────────────────────────

pub(crate) fn konst(b: &mut SeqBuilder, ty: TypeRef, c: Const) -> VarId {
    b.emit_let(ty, SeqValue::Const(c))
}

pub(crate) fn binary(b: &mut SeqBuilder, ty: TypeRef, op: BinOp, lhs: VarId, rhs: VarId) -> VarId {
    b.emit_let(ty, SeqValue::Binary { op, lhs, rhs })
}

/// `var = var + step`.
pub(crate) fn increment(b: &mut SeqBuilder, var: VarId, step: VarId) {
    b.emit_assign(
        var,
        SeqValue::Binary {
            op: BinOp::Add,
            lhs: var,
            rhs: step,
        },
    );
}

/// `return <bool>`.
pub(crate) fn return_bool(b: &mut SeqBuilder, value: bool) {
    let v = konst(b, boolean(), Const::Bool(value));
    b.terminate_return(Some(v));
}

/// `new Ty(args)` into a fresh local.
pub(crate) fn construct(
    b: &mut SeqBuilder,
    cx: &GenContext<'_>,
    ty: &TypeRef,
    args: Vec<Operand>,
) -> Result<VarId, GenError> {
    let ctor = cx.template().find_method(ty, names::CTOR, args.len())?;
    Ok(b.emit_construct(ctor, args))
}

/// `delegate.Invoke(args)`.
pub(crate) fn invoke_method(
    cx: &GenContext<'_>,
    delegate_ty: &TypeRef,
    arity: usize,
) -> Result<MethodRef, GenError> {
    cx.template().find_method(delegate_ty, names::INVOKE, arity)
}

/// Throw `ArgumentNullException(name)` when `var` is null, continuing in a
/// fresh block otherwise.
pub(crate) fn null_check(b: &mut SeqBuilder, var: VarId, name: &str) {
    let is_null = b.emit_let(boolean(), SeqValue::IsNull(var));
    let throw = b.new_block();
    let next = b.new_block();
    b.terminate_branch(is_null, throw, next);
    b.position_at(throw);
    b.terminate_throw_argument_null(name);
    b.position_at(next);
}

/// The value to iterate: special sources are wrapped into their
/// protocol-implementing View, generic sources are used as they are.
pub(crate) fn adapt(
    b: &mut SeqBuilder,
    cx: &GenContext<'_>,
    src: &ResolvedSource,
    param: VarId,
) -> Result<VarId, GenError> {
    if src.kind.is_special() {
        construct(b, cx, &src.enumerable, vec![Operand::Var(param)])
    } else {
        Ok(param)
    }
}

// ── Protocol calls ──────────────────────────────────────────────────

/// How protocol members are bound for one source: on the concrete stub
/// types, or through interface constraints for an open-generic source.
pub(crate) struct Protocol {
    enumerable: TypeRef,
    enumerator: TypeRef,
    interfaces: Option<(TypeRef, TypeRef)>,
}

impl Protocol {
    pub(crate) fn of(src: &ResolvedSource) -> Self {
        Self {
            enumerable: src.enumerable.clone(),
            enumerator: src.enumerator.clone(),
            interfaces: None,
        }
    }

    pub(crate) fn open_generic(enumerable: TypeRef, enumerator: TypeRef, item: TypeRef) -> Self {
        let interfaces = (
            ref_enumerable(enumerator.clone(), item.clone()),
            ref_enumerator(item),
        );
        Self {
            enumerable,
            enumerator,
            interfaces: Some(interfaces),
        }
    }

    fn on_enumerable(
        &self,
        cx: &GenContext<'_>,
        name: &str,
        arity: usize,
    ) -> Result<MethodRef, GenError> {
        match &self.interfaces {
            Some((iface, _)) => cx
                .template()
                .find_constrained(&self.enumerable, iface, name, arity),
            None => cx.template().find_method(&self.enumerable, name, arity),
        }
    }

    fn on_enumerator(
        &self,
        cx: &GenContext<'_>,
        name: &str,
        arity: usize,
    ) -> Result<MethodRef, GenError> {
        match &self.interfaces {
            Some((_, iface)) => cx
                .template()
                .find_constrained(&self.enumerator, iface, name, arity),
            None => cx.template().find_method(&self.enumerator, name, arity),
        }
    }

    pub(crate) fn open(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        enumerable: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerable(cx, names::GET_ENUMERATOR, 0)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(enumerable)])?)
    }

    pub(crate) fn move_next(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        e: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerator(cx, names::TRY_MOVE_NEXT, 0)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(e)])?)
    }

    /// Reference to the current element.
    pub(crate) fn current(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        e: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerator(cx, names::GET_CURRENT, 0)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(e)])?)
    }

    /// Advance and return a reference to the element; `ok` receives whether
    /// there was one.
    pub(crate) fn try_get_next(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        e: VarId,
        ok: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerator(cx, names::TRY_GET_NEXT, 1)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(e), Operand::Addr(ok)])?)
    }

    pub(crate) fn dispose(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        e: VarId,
    ) -> Result<(), GenError> {
        let m = self.on_enumerator(cx, names::DISPOSE, 0)?;
        b.emit_call_void(m, vec![Operand::Addr(e)]);
        Ok(())
    }

    fn long_count(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        enumerable: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerable(cx, names::LONG_COUNT, 0)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(enumerable)])?)
    }

    fn get_item(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        enumerable: VarId,
        index: VarId,
    ) -> Result<VarId, GenError> {
        let m = self.on_enumerable(cx, names::GET_ITEM, 1)?;
        Ok(b.emit_call_value(m, vec![Operand::Addr(enumerable), Operand::Var(index)])?)
    }
}

// ── Indexed access ──────────────────────────────────────────────────

/// Random access to a source that knows its length: arrays directly,
/// everything else through `LongCount` and `get_Item` on its enumerable.
pub(crate) enum Indexed {
    Array { array: VarId },
    Items { enumerable: VarId, protocol: Protocol },
}

/// One element reached by index.
pub(crate) enum Element {
    InArray { array: VarId, index: VarId },
    Ref(VarId),
}

impl Element {
    /// A reference to the element, for strategies taking `ref T`.
    pub(crate) fn operand(&self) -> Operand {
        match *self {
            Self::InArray { array, index } => Operand::ElementAddr { array, index },
            Self::Ref(r) => Operand::Var(r),
        }
    }

    /// A copy of the element.
    pub(crate) fn value(&self) -> SeqValue {
        match *self {
            Self::InArray { array, index } => SeqValue::Element { array, index },
            Self::Ref(r) => SeqValue::Deref(r),
        }
    }
}

impl Indexed {
    pub(crate) fn for_source(
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        src: &ResolvedSource,
        param: VarId,
    ) -> Result<Self, GenError> {
        Ok(match src.kind {
            SourceKind::Contiguous => Self::Array { array: param },
            SourceKind::ExternalBuffer | SourceKind::Generic(_) => Self::Items {
                enumerable: adapt(b, cx, src, param)?,
                protocol: Protocol::of(src),
            },
        })
    }

    pub(crate) fn len(&self, b: &mut SeqBuilder, cx: &GenContext<'_>) -> Result<VarId, GenError> {
        match self {
            Self::Array { array } => Ok(b.emit_let(long(), SeqValue::Length(*array))),
            Self::Items {
                enumerable,
                protocol,
            } => protocol.long_count(cx, b, *enumerable),
        }
    }

    pub(crate) fn element(
        &self,
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        index: VarId,
    ) -> Result<Element, GenError> {
        match self {
            Self::Array { array } => Ok(Element::InArray {
                array: *array,
                index,
            }),
            Self::Items {
                enumerable,
                protocol,
            } => Ok(Element::Ref(protocol.get_item(cx, b, *enumerable, index)?)),
        }
    }
}

#[cfg(test)]
mod tests;
