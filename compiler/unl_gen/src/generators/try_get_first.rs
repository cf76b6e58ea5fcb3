//! `TryGetFirst`: eager search for the first element a predicate accepts.

use unl_ir::{BinOp, Const, Operand, ParamMode, SeqBuilder, SeqValue, VarId};
use unl_protocol::names;

use super::{
    binary, boolean, delegate, element, element_param, finish, generate_unary, increment,
    invoke_method, konst, long, method_generics, return_bool, source_param, Indexed,
    OperatorGenerator, Protocol,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct TryGetFirstGenerator {
    spec: OperatorSpec,
}

impl Default for TryGetFirstGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TryGetFirstGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::TRY_GET_FIRST, "TryGetFirst", "TryGetFirstRefFuncHelper")
                .describe("Eagerly find the first element a predicate accepts"),
        }
    }

    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let predicate_ty = delegate(names::REF_FUNC, element(), boolean());
        let invoke = invoke_method(cx, &predicate_ty, 1)?;
        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let value = b.param("value", element(), ParamMode::Out);
        let predicate = b.param("predicate", predicate_ty, ParamMode::Value);

        if src.supports_reverse_scan() {
            let items = Indexed::for_source(&mut b, cx, src, this)?;
            let len = items.len(&mut b, cx)?;
            let i = konst(&mut b, long(), Const::I64(0));
            let one = konst(&mut b, long(), Const::I64(1));
            let header = b.new_block();
            let body = b.new_block();
            let next = b.new_block();
            let found = b.new_block();
            let fail = b.new_block();
            b.terminate_jump(header);

            b.position_at(header);
            let more = binary(&mut b, boolean(), BinOp::Lt, i, len);
            b.terminate_branch(more, body, fail);

            b.position_at(body);
            let el = items.element(&mut b, cx, i)?;
            let hit = b.emit_call_value(invoke, vec![Operand::Var(predicate), el.operand()])?;
            b.terminate_branch(hit, found, next);

            b.position_at(next);
            increment(&mut b, i, one);
            b.terminate_jump(header);

            b.position_at(found);
            b.emit_assign(value, el.value());
            return_bool(&mut b, true);

            b.position_at(fail);
            b.emit_init_default(value);
            return_bool(&mut b, false);
        } else {
            forward(&mut b, cx, src, this, value, predicate)?;
        }

        finish(
            b,
            self.spec.method,
            boolean(),
            &[src],
            method_generics([element_param()], &[src]),
        )
    }
}

/// Pull until the first match; dispose on both exits.
fn forward(
    b: &mut SeqBuilder,
    cx: &GenContext<'_>,
    src: &ResolvedSource,
    this: VarId,
    value: VarId,
    predicate: VarId,
) -> Result<(), GenError> {
    let invoke = invoke_method(cx, &delegate(names::REF_FUNC, element(), boolean()), 1)?;
    let proto = Protocol::of(src);
    let e = proto.open(cx, b, this)?;
    let header = b.new_block();
    let body = b.new_block();
    let found = b.new_block();
    let miss = b.new_block();
    b.terminate_jump(header);

    b.position_at(header);
    let more = proto.move_next(cx, b, e)?;
    b.terminate_branch(more, body, miss);

    b.position_at(body);
    let p = proto.current(cx, b, e)?;
    let hit = b.emit_call_value(invoke, vec![Operand::Var(predicate), Operand::Var(p)])?;
    b.terminate_branch(hit, found, header);

    b.position_at(found);
    b.emit_assign(value, SeqValue::Deref(p));
    proto.dispose(cx, b, e)?;
    return_bool(b, true);

    b.position_at(miss);
    proto.dispose(cx, b, e)?;
    b.emit_init_default(value);
    return_bool(b, false);
    Ok(())
}

impl OperatorGenerator for TryGetFirstGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
