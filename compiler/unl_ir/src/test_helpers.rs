//! Shared test utilities for builder and lowering tests.

use crate::ir::{BinOp, BlockId, Const, SeqFunction, SeqValue, VarId};
use crate::types::{MethodRef, ParamMode, ScalarType, TypeRef};
use crate::SeqBuilder;

/// Shorthand for `VarId::new(n)`.
pub(crate) fn v(n: u32) -> VarId {
    VarId::new(n)
}

/// Shorthand for `BlockId::new(n)`.
pub(crate) fn b(n: u32) -> BlockId {
    BlockId::new(n)
}

pub(crate) fn long() -> TypeRef {
    ScalarType::I64.into()
}

pub(crate) fn boolean() -> TypeRef {
    ScalarType::Bool.into()
}

/// Instance method on `owner`.
pub(crate) fn instance(owner: TypeRef, name: &str, arity: usize, ret: TypeRef) -> MethodRef {
    MethodRef {
        owner,
        name: name.to_owned(),
        arity,
        has_this: true,
        is_virtual: false,
        ret,
    }
}

/// `long Sum(long[] xs)` as an index loop:
///
/// ```text
/// bb0: sum = 0; i = 0; len = xs.Length; jump bb1
/// bb1: c = i < len; branch c bb2 bb3
/// bb2: x = xs[i]; sum = sum + x; i = i + 1; jump bb1
/// bb3: return sum
/// ```
pub(crate) fn sum_loop() -> SeqFunction {
    let mut bld = SeqBuilder::new();
    let xs = bld.param("xs", TypeRef::array(long()), ParamMode::Value);
    let sum = bld.emit_let(long(), SeqValue::Const(Const::I64(0)));
    let i = bld.emit_let(long(), SeqValue::Const(Const::I64(0)));
    let one = bld.emit_let(long(), SeqValue::Const(Const::I64(1)));
    let len = bld.emit_let(long(), SeqValue::Length(xs));
    let header = bld.new_block();
    let body = bld.new_block();
    let exit = bld.new_block();
    bld.terminate_jump(header);

    bld.position_at(header);
    let c = bld.emit_let(
        boolean(),
        SeqValue::Binary {
            op: BinOp::Lt,
            lhs: i,
            rhs: len,
        },
    );
    bld.terminate_branch(c, body, exit);

    bld.position_at(body);
    let x = bld.emit_let(long(), SeqValue::Element { array: xs, index: i });
    bld.emit_assign(
        sum,
        SeqValue::Binary {
            op: BinOp::Add,
            lhs: sum,
            rhs: x,
        },
    );
    bld.emit_assign(
        i,
        SeqValue::Binary {
            op: BinOp::Add,
            lhs: i,
            rhs: one,
        },
    );
    bld.terminate_jump(header);

    bld.position_at(exit);
    bld.terminate_return(Some(sum));

    bld.finish("Sum", long()).unwrap_or_else(|e| panic!("{e}"))
}
