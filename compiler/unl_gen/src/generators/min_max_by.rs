//! `MinBy` / `MaxBy`: lazy selection of every element with the extreme key.

use unl_ir::{Const, Operand, ParamMode, SeqBuilder, TypeRef};
use unl_protocol::names;

use super::{
    adapt, allocator_param, construct, delegate, element, element_param, finish, generate_unary,
    method_generics, source_param, OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, NumericType, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Min,
    Max,
}

impl Direction {
    fn operator(self) -> &'static str {
        match self {
            Self::Min => op::MIN_BY,
            Self::Max => op::MAX_BY,
        }
    }

    #[inline]
    fn is_max(self) -> bool {
        matches!(self, Self::Max)
    }
}

/// One generator per (direction, key type).
pub struct MinMaxByGenerator {
    spec: OperatorSpec,
    direction: Direction,
    key: NumericType,
}

impl MinMaxByGenerator {
    pub fn new(direction: Direction, key: NumericType) -> Self {
        let name = direction.operator();
        Self {
            spec: OperatorSpec::new(name, name, format!("{name}RefFunc{}Helper", key.name()))
                .describe("Lazily yield every element whose key is the extreme key"),
            direction,
            key,
        }
    }

    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let t = element();
        let key = self.key.ty();
        let selector_ty = delegate(
            names::DELEGATE_REF_FUNC_TO_STRUCT_OPERATOR_FUNC,
            t.clone(),
            key.clone(),
        );
        let view_ty = TypeRef::named(
            names::MIN_MAX_BY_ENUMERABLE,
            vec![
                src.enumerable.clone(),
                src.enumerator.clone(),
                t.clone(),
                key.clone(),
                selector_ty.clone(),
            ],
        );

        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let key_selector = b.param(
            "keySelector",
            delegate(names::REF_FUNC, t, key),
            ParamMode::Value,
        );
        let allocator = allocator_param(&mut b);
        let enumerable = adapt(&mut b, cx, src, this)?;
        let selector = construct(&mut b, cx, &selector_ty, vec![Operand::Var(key_selector)])?;
        let view = construct(
            &mut b,
            cx,
            &view_ty,
            vec![
                Operand::Addr(enumerable),
                Operand::Addr(selector),
                Operand::Const(Const::Bool(self.direction.is_max())),
                Operand::Var(allocator),
            ],
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

impl OperatorGenerator for MinMaxByGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        if !cx.matrix().has_numeric_type(self.key) {
            return Ok(None);
        }
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
