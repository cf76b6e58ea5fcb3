//! `LongCount`: eager 64-bit count of the elements a predicate accepts.

use unl_ir::{BinOp, Const, Operand, ParamMode, SeqBuilder};
use unl_protocol::names;

use super::{
    binary, boolean, delegate, element, element_param, finish, generate_unary, increment,
    invoke_method, konst, long, method_generics, source_param, Indexed, OperatorGenerator,
    Protocol,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct LongCountGenerator {
    spec: OperatorSpec,
}

impl Default for LongCountGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LongCountGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::LONG_COUNT, "LongCount", "LongCountRefFuncHelper")
                .describe("Eagerly count the elements a predicate accepts"),
        }
    }

    /// `long LongCount<T>(this S source, RefFunc<T, bool> predicate)`
    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let predicate_ty = delegate(names::REF_FUNC, element(), boolean());
        let invoke = invoke_method(cx, &predicate_ty, 1)?;
        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let predicate = b.param("predicate", predicate_ty, ParamMode::Value);
        let count = konst(&mut b, long(), Const::I64(0));
        let one = konst(&mut b, long(), Const::I64(1));

        if src.supports_reverse_scan() {
            let items = Indexed::for_source(&mut b, cx, src, this)?;
            let len = items.len(&mut b, cx)?;
            let i = konst(&mut b, long(), Const::I64(0));
            let header = b.new_block();
            let body = b.new_block();
            let hit_block = b.new_block();
            let next = b.new_block();
            let exit = b.new_block();
            b.terminate_jump(header);

            b.position_at(header);
            let more = binary(&mut b, boolean(), BinOp::Lt, i, len);
            b.terminate_branch(more, body, exit);

            b.position_at(body);
            let el = items.element(&mut b, cx, i)?;
            let hit = b.emit_call_value(invoke, vec![Operand::Var(predicate), el.operand()])?;
            b.terminate_branch(hit, hit_block, next);

            b.position_at(hit_block);
            increment(&mut b, count, one);
            b.terminate_jump(next);

            b.position_at(next);
            increment(&mut b, i, one);
            b.terminate_jump(header);

            b.position_at(exit);
            b.terminate_return(Some(count));
        } else {
            let proto = Protocol::of(src);
            let e = proto.open(cx, &mut b, this)?;
            let header = b.new_block();
            let body = b.new_block();
            let hit_block = b.new_block();
            let exit = b.new_block();
            b.terminate_jump(header);

            b.position_at(header);
            let more = proto.move_next(cx, &mut b, e)?;
            b.terminate_branch(more, body, exit);

            b.position_at(body);
            let p = proto.current(cx, &mut b, e)?;
            let hit = b.emit_call_value(invoke, vec![Operand::Var(predicate), Operand::Var(p)])?;
            b.terminate_branch(hit, hit_block, header);

            b.position_at(hit_block);
            increment(&mut b, count, one);
            b.terminate_jump(header);

            b.position_at(exit);
            proto.dispose(cx, &mut b, e)?;
            b.terminate_return(Some(count));
        }

        finish(
            b,
            self.spec.method,
            long(),
            &[src],
            method_generics([element_param()], &[src]),
        )
    }
}

impl OperatorGenerator for LongCountGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}
