//! `Where`: lazy filtering by a predicate delegate.

use unl_ir::{Operand, ParamMode, SeqBuilder, TypeRef};
use unl_protocol::names;

use super::{
    adapt, boolean, construct, delegate, element, element_param, finish, generate_unary,
    method_generics, source_param, OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct WhereGenerator {
    spec: OperatorSpec,
}

impl Default for WhereGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WhereGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::WHERE, "Where", "WhereFuncHelper")
                .describe("Lazily keep the elements a predicate accepts"),
        }
    }

    /// ```text
    /// WhereEnumerable<E, En, T, DelegateFuncToStructOperatorFunc<T, bool>>
    ///     Where<T>(this S source, Func<T, bool> predicate)
    /// ```
    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let t = element();
        let strategy_ty = delegate(names::DELEGATE_FUNC_TO_STRUCT_OPERATOR_FUNC, t.clone(), boolean());
        let view_ty = TypeRef::named(
            names::WHERE_ENUMERABLE,
            vec![
                src.enumerable.clone(),
                src.enumerator.clone(),
                t.clone(),
                strategy_ty.clone(),
            ],
        );

        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let predicate = b.param(
            "predicate",
            delegate(names::FUNC, t, boolean()),
            ParamMode::Value,
        );
        let enumerable = adapt(&mut b, cx, src, this)?;
        let strategy = construct(&mut b, cx, &strategy_ty, vec![Operand::Var(predicate)])?;
        let view = construct(
            &mut b,
            cx,
            &view_ty,
            vec![Operand::Addr(enumerable), Operand::Addr(strategy)],
        )?;
        b.terminate_return(Some(view));

        finish(
            b,
            self.spec.method,
            view_ty,
            &[src],
            method_generics([element_param()], &[src]),
        )
    }
}

impl OperatorGenerator for WhereGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
