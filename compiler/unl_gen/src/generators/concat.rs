//! `Concat`: lazy two-source concatenation.

use unl_ir::{Operand, SeqBuilder, TypeRef, VarId};
use unl_protocol::names;

use super::{
    adapt, construct, element, element_param, finish, generate_binary, method_generics,
    source_param, OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

/// `ConcatEnumerable<Ea, Ena, Eb, Enb, T>` over two resolved sources.
pub(crate) fn concat_type(first: &ResolvedSource, second: &ResolvedSource) -> TypeRef {
    TypeRef::named(
        names::CONCAT_ENUMERABLE,
        vec![
            first.enumerable.clone(),
            first.enumerator.clone(),
            second.enumerable.clone(),
            second.enumerator.clone(),
            element(),
        ],
    )
}

/// Declare both source parameters, adapt them and build the concatenation
/// View. Returns the View's local.
pub(crate) fn emit_concat(
    b: &mut SeqBuilder,
    cx: &GenContext<'_>,
    first: &ResolvedSource,
    second: &ResolvedSource,
) -> Result<VarId, GenError> {
    let this = source_param(b, first, "this");
    let other = source_param(b, second, "second");
    let a = adapt(b, cx, first, this)?;
    let c = adapt(b, cx, second, other)?;
    construct(
        b,
        cx,
        &concat_type(first, second),
        vec![Operand::Addr(a), Operand::Addr(c)],
    )
}

pub struct ConcatGenerator {
    spec: OperatorSpec,
}

impl Default for ConcatGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcatGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::CONCAT, "Concat", "ConcatNoneHelper")
                .describe("Lazily yield the first source, then the second"),
        }
    }

    fn method(
        &self,
        cx: &GenContext<'_>,
        first: &ResolvedSource,
        second: &ResolvedSource,
    ) -> Result<GeneratedMethod, GenError> {
        let mut b = SeqBuilder::new();
        let concat = emit_concat(&mut b, cx, first, second)?;
        b.terminate_return(Some(concat));
        finish(
            b,
            self.spec.method,
            concat_type(first, second),
            &[first, second],
            method_generics([element_param()], &[first, second]),
        )
    }
}

impl OperatorGenerator for ConcatGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_binary(cx, &self.spec, &[], |a, b| self.method(cx, a, b))
    }
}
