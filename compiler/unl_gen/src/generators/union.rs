//! `Union`: `Distinct(Concat(first, second))` as nested Views.

use unl_ir::SeqBuilder;

use super::concat::{concat_type, emit_concat};
use super::distinct::{distinct_type, emit_distinct};
use super::{
    allocator_param, equatable_element_param, finish, generate_binary, method_generics,
    OperatorGenerator,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct UnionGenerator {
    spec: OperatorSpec,
}

impl Default for UnionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UnionGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::UNION, "Union", "UnionNoneHelper")
                .describe("Lazily yield the distinct elements of both sources")
                .requires(&[op::CONCAT, op::DISTINCT]),
        }
    }

    fn method(
        &self,
        cx: &GenContext<'_>,
        first: &ResolvedSource,
        second: &ResolvedSource,
    ) -> Result<GeneratedMethod, GenError> {
        let view_ty = distinct_type(concat_type(first, second));
        let mut b = SeqBuilder::new();
        let concat = emit_concat(&mut b, cx, first, second)?;
        let allocator = allocator_param(&mut b);
        let view = emit_distinct(&mut b, cx, &view_ty, concat, allocator)?;
        b.terminate_return(Some(view));
        finish(
            b,
            self.spec.method,
            view_ty,
            &[first, second],
            method_generics([equatable_element_param()], &[first, second]),
        )
    }
}

impl OperatorGenerator for UnionGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    /// Only pairs Concat also enables are emitted.
    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_binary(cx, &self.spec, &[op::CONCAT], |a, b| self.method(cx, a, b))
    }
}
