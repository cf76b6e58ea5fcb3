//! `Select`: lazy projection through a selector delegate.

use unl_ir::{GenericParam, Operand, ParamMode, SeqBuilder, TypeRef};
use unl_protocol::names;

use super::{
    adapt, construct, delegate, element, element_param, finish, generate_unary, method_generics,
    source_param, OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct SelectGenerator {
    spec: OperatorSpec,
}

impl Default for SelectGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::SELECT, "Select", "SelectFuncHelper")
                .describe("Lazily map each element through a selector"),
        }
    }

    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let t = element();
        let result = TypeRef::param("TResult");
        let action_ty = delegate(names::DELEGATE_FUNC_TO_ACTION, t.clone(), result.clone());
        let view_ty = TypeRef::named(
            names::SELECT_ENUMERABLE,
            vec![
                src.enumerable.clone(),
                src.enumerator.clone(),
                t.clone(),
                result.clone(),
                action_ty.clone(),
            ],
        );

        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let selector = b.param("selector", delegate(names::FUNC, t, result), ParamMode::Value);
        let enumerable = adapt(&mut b, cx, src, this)?;
        let action = construct(&mut b, cx, &action_ty, vec![Operand::Var(selector)])?;
        let view = construct(
            &mut b,
            cx,
            &view_ty,
            vec![Operand::Addr(enumerable), Operand::Addr(action)],
        )?;
        b.terminate_return(Some(view));

        finish(
            b,
            self.spec.method,
            view_ty,
            &[src],
            method_generics([element_param(), GenericParam::unmanaged("TResult")], &[src]),
        )
    }
}

impl OperatorGenerator for SelectGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
