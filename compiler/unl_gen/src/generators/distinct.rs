//! `Distinct`: lazy de-duplication with the default comparer.

use unl_ir::{Operand, SeqBuilder, TypeRef, VarId};
use unl_protocol::names;

use super::{
    adapt, allocator_param, construct, element, equatable_element_param, finish, generate_unary,
    method_generics, source_param, OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

/// `DistinctEnumerable<E, En, T, DefaultEqualityComparer<T>>`.
pub(crate) fn distinct_type(enumerable: TypeRef) -> TypeRef {
    let enumerator = enumerable.clone().nested(names::ENUMERATOR);
    TypeRef::named(
        names::DISTINCT_ENUMERABLE,
        vec![
            enumerable,
            enumerator,
            element(),
            TypeRef::named(names::DEFAULT_EQUALITY_COMPARER, vec![element()]),
        ],
    )
}

/// Wrap the enumerable in `source` into a Distinct View.
pub(crate) fn emit_distinct(
    b: &mut SeqBuilder,
    cx: &GenContext<'_>,
    view_ty: &TypeRef,
    source: VarId,
    allocator: VarId,
) -> Result<VarId, GenError> {
    construct(
        b,
        cx,
        view_ty,
        vec![Operand::Addr(source), Operand::Var(allocator)],
    )
}

pub struct DistinctGenerator {
    spec: OperatorSpec,
}

impl Default for DistinctGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DistinctGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::DISTINCT, "Distinct", "DistinctNoneHelper")
                .describe("Lazily drop elements equal to one already yielded"),
        }
    }

    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let view_ty = distinct_type(src.enumerable.clone());
        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let allocator = allocator_param(&mut b);
        let enumerable = adapt(&mut b, cx, src, this)?;
        let view = emit_distinct(&mut b, cx, &view_ty, enumerable, allocator)?;
        b.terminate_return(Some(view));
        finish(
            b,
            self.spec.method,
            view_ty,
            &[src],
            method_generics([equatable_element_param()], &[src]),
        )
    }
}

impl OperatorGenerator for DistinctGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
