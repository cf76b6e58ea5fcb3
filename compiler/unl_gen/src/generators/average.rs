//! `TryGetAverage`: eager arithmetic mean, one generator per element type.
//!
//! Arrays and native buffers know their length up front, so the mean is an
//! index loop divided by that length. Every other source is pulled once for
//! its first element (failing when empty) and then counted as it is summed.

use unl_ir::{BinOp, Const, ParamMode, SeqBuilder, SeqValue, VarId};

use super::{
    binary, boolean, finish, generate_unary, increment, konst, long, method_generics,
    return_bool, source_param, Indexed, OperatorGenerator, Protocol,
};
use crate::context::GenContext;
use crate::descriptor::{op, AveragePolicy, NumericType, OperatorSpec};
use crate::error::GenError;
use crate::module::{GeneratedMethod, HolderType};
use crate::registry::{ResolvedSource, SourceKind};

pub struct AverageGenerator {
    spec: OperatorSpec,
    ty: NumericType,
}

impl AverageGenerator {
    pub fn new(ty: NumericType) -> Self {
        Self {
            spec: OperatorSpec::new(
                op::TRY_GET_AVERAGE,
                "TryGetAverage",
                format!("TryGetAverageNone{}Helper", ty.name()),
            )
            .describe("Eagerly compute the mean, failing on an empty source"),
            ty,
        }
    }

    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let mut b = SeqBuilder::new();
        let this = source_param(&mut b, src, "this");
        let value = b.param("value", self.ty.ty(), ParamMode::Out);
        let acc = Accumulator {
            policy: self.ty.average_policy(),
            elem: self.ty,
            value,
        };
        match src.kind {
            SourceKind::Contiguous | SourceKind::ExternalBuffer => {
                acc.indexed(&mut b, cx, src, this)?;
            }
            SourceKind::Generic(_) => acc.pulled(&mut b, cx, src, this)?,
        }
        finish(
            b,
            self.spec.method,
            boolean(),
            &[src],
            method_generics([], &[src]),
        )
    }
}

impl OperatorGenerator for AverageGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        if !cx.matrix().has_numeric_type(self.ty) {
            return Ok(None);
        }
        generate_unary(cx, &self.spec, &self.ty.ty(), |src| self.method(cx, src))
    }
}

/// Body emission for one element type.
struct Accumulator {
    policy: AveragePolicy,
    elem: NumericType,
    /// The `out` parameter.
    value: VarId,
}

impl Accumulator {
    /// Element converted to the accumulator type.
    fn widen(&self, b: &mut SeqBuilder, x: VarId) -> VarId {
        match self.policy.widen {
            Some(to) => b.emit_let(to.into(), SeqValue::Convert { src: x, to }),
            None => x,
        }
    }

    /// `value = narrow(sum / convert(count))`, then `return true`.
    fn divide_and_succeed(&self, b: &mut SeqBuilder, sum: VarId, count: VarId) {
        let count = match self.policy.count {
            Some(to) => b.emit_let(to.into(), SeqValue::Convert { src: count, to }),
            None => count,
        };
        let q = binary(b, self.policy.acc.into(), self.policy.div, sum, count);
        let result = match self.policy.narrow {
            Some(to) => SeqValue::Convert { src: q, to },
            None => SeqValue::Var(q),
        };
        b.emit_assign(self.value, result);
        return_bool(b, true);
    }

    fn fail(&self, b: &mut SeqBuilder) {
        b.emit_init_default(self.value);
        return_bool(b, false);
    }

    /// ```text
    /// len = Length; if len == 0 fail
    /// sum = widen(src[0]); i = 1
    /// while i < len { sum += widen(src[i]); i += 1 }
    /// value = sum / len
    /// ```
    fn indexed(
        &self,
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        src: &ResolvedSource,
        this: VarId,
    ) -> Result<(), GenError> {
        let items = Indexed::for_source(b, cx, src, this)?;
        let len = items.len(b, cx)?;
        let zero = konst(b, long(), Const::I64(0));
        let empty = binary(b, boolean(), BinOp::Eq, len, zero);
        let init = b.new_block();
        let fail = b.new_block();
        let header = b.new_block();
        let body = b.new_block();
        let exit = b.new_block();
        b.terminate_branch(empty, fail, init);

        b.position_at(init);
        let first = items.element(b, cx, zero)?;
        let x = b.emit_let(self.elem.ty(), first.value());
        let widened = self.widen(b, x);
        let sum = b.emit_let(self.policy.acc.into(), SeqValue::Var(widened));
        let one = konst(b, long(), Const::I64(1));
        let i = b.emit_let(long(), SeqValue::Var(one));
        b.terminate_jump(header);

        b.position_at(fail);
        self.fail(b);

        b.position_at(header);
        let more = binary(b, boolean(), BinOp::Lt, i, len);
        b.terminate_branch(more, body, exit);

        b.position_at(body);
        let el = items.element(b, cx, i)?;
        let x = b.emit_let(self.elem.ty(), el.value());
        let widened = self.widen(b, x);
        increment(b, sum, widened);
        increment(b, i, one);
        b.terminate_jump(header);

        b.position_at(exit);
        self.divide_and_succeed(b, sum, len);
        Ok(())
    }

    /// ```text
    /// e = GetEnumerator; if !e.TryMoveNext { e.Dispose; fail }
    /// sum = widen(e.Current); count = 1
    /// while e.TryMoveNext { sum += widen(e.Current); count += 1 }
    /// e.Dispose; value = sum / count
    /// ```
    fn pulled(
        &self,
        b: &mut SeqBuilder,
        cx: &GenContext<'_>,
        src: &ResolvedSource,
        this: VarId,
    ) -> Result<(), GenError> {
        let proto = Protocol::of(src);
        let e = proto.open(cx, b, this)?;
        let has_first = proto.move_next(cx, b, e)?;
        let init = b.new_block();
        let empty = b.new_block();
        let header = b.new_block();
        let body = b.new_block();
        let exit = b.new_block();
        b.terminate_branch(has_first, init, empty);

        b.position_at(init);
        let p = proto.current(cx, b, e)?;
        let x = b.emit_let(self.elem.ty(), SeqValue::Deref(p));
        let widened = self.widen(b, x);
        let sum = b.emit_let(self.policy.acc.into(), SeqValue::Var(widened));
        let one = konst(b, long(), Const::I64(1));
        let count = b.emit_let(long(), SeqValue::Var(one));
        b.terminate_jump(header);

        b.position_at(empty);
        proto.dispose(cx, b, e)?;
        self.fail(b);

        b.position_at(header);
        let more = proto.move_next(cx, b, e)?;
        b.terminate_branch(more, body, exit);

        b.position_at(body);
        let p = proto.current(cx, b, e)?;
        let x = b.emit_let(self.elem.ty(), SeqValue::Deref(p));
        let widened = self.widen(b, x);
        increment(b, sum, widened);
        increment(b, count, one);
        b.terminate_jump(header);

        b.position_at(exit);
        proto.dispose(cx, b, e)?;
        self.divide_and_succeed(b, sum, count);
        Ok(())
    }
}
