//! `TryGetLast`: eager search for the last element a predicate accepts.

use unl_ir::{BinOp, Const, Operand, ParamMode, SeqBuilder, SeqValue, VarId};
use unl_protocol::names;

use super::{
    binary, boolean, delegate, element, element_param, finish, generate_unary, invoke_method,
    konst, long, method_generics, return_bool, source_param, Indexed, OperatorGenerator, Protocol,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::ResolvedSource;

pub struct TryGetLastGenerator {
    spec: OperatorSpec,
}

impl Default for TryGetLastGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TryGetLastGenerator {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec::new(op::TRY_GET_LAST, "TryGetLast", "TryGetLastRefFuncHelper")
                .describe("Eagerly find the last element a predicate accepts"),
        }
    }

    /// `bool TryGetLast<T>(this S source, out T value, RefFunc<T, bool> predicate)`
    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let value = b.param("value", element(), ParamMode::Out);
        let predicate = b.param(
            "predicate",
            delegate(names::REF_FUNC, element(), boolean()),
            ParamMode::Value,
        );
        let scan = Scan { value, predicate };
        if src.supports_reverse_scan() {
            scan.reverse(&mut b, cx, src, this)?;
        } else {
            scan.forward(&mut b, cx, src, this)?;
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

impl OperatorGenerator for TryGetLastGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        generate_unary(cx, &self.spec, &element(), |src| self.method(cx, src))
    }
}

struct Scan {
    value: VarId,
    predicate: VarId,
}

impl Scan {
    /// Indices `len - 1` down to `0`; the first match is the last element.
    fn reverse(
        &self,
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        src: &ResolvedSource,
        this: VarId,
    ) -> Result<(), GenError> {
        let invoke = invoke_method(cx, &delegate(names::REF_FUNC, element(), boolean()), 1)?;
        let items = Indexed::for_source(b, cx, src, this)?;
        let len = items.len(b, cx)?;
        let zero = konst(b, long(), Const::I64(0));
        let one = konst(b, long(), Const::I64(1));
        let i = b.emit_let(long(), SeqValue::Var(len));
        let header = b.new_block();
        let body = b.new_block();
        let found = b.new_block();
        let fail = b.new_block();
        b.terminate_jump(header);

        b.position_at(header);
        let more = binary(b, boolean(), BinOp::Gt, i, zero);
        b.terminate_branch(more, body, fail);

        b.position_at(body);
        b.emit_assign(
            i,
            SeqValue::Binary {
                op: BinOp::Sub,
                lhs: i,
                rhs: one,
            },
        );
        let el = items.element(b, cx, i)?;
        let hit = b.emit_call_value(invoke, vec![Operand::Var(self.predicate), el.operand()])?;
        b.terminate_branch(hit, found, header);

        b.position_at(found);
        b.emit_assign(self.value, el.value());
        return_bool(b, true);

        b.position_at(fail);
        b.emit_init_default(self.value);
        return_bool(b, false);
        Ok(())
    }

    /// One forward pass remembering the latest match.
    fn forward(
        &self,
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        src: &ResolvedSource,
        this: VarId,
    ) -> Result<(), GenError> {
        let invoke = invoke_method(cx, &delegate(names::REF_FUNC, element(), boolean()), 1)?;
        let proto = Protocol::of(src);
        b.emit_init_default(self.value);
        let found = konst(b, boolean(), Const::Bool(false));
        let e = proto.open(cx, b, this)?;
        let header = b.new_block();
        let body = b.new_block();
        let take = b.new_block();
        let exit = b.new_block();
        b.terminate_jump(header);

        b.position_at(header);
        let more = proto.move_next(cx, b, e)?;
        b.terminate_branch(more, body, exit);

        b.position_at(body);
        let p = proto.current(cx, b, e)?;
        let hit = b.emit_call_value(invoke, vec![Operand::Var(self.predicate), Operand::Var(p)])?;
        b.terminate_branch(hit, take, header);

        b.position_at(take);
        b.emit_assign(self.value, SeqValue::Deref(p));
        b.emit_assign(found, SeqValue::Const(Const::Bool(true)));
        b.terminate_jump(header);

        b.position_at(exit);
        proto.dispose(cx, b, e)?;
        b.terminate_return(Some(found));
        Ok(())
    }
}
