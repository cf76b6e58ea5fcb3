//! Instruction sequence builder for generated sequence operators.
//!
//! This crate provides:
//!
//! - **Type references** ([`TypeRef`], [`MethodRef`], [`GenericParam`]) —
//!   how generated signatures and call sites name types and members.
//!
//! - **Sequence IR** ([`SeqFunction`], [`SeqBlock`], [`SeqInstr`],
//!   [`SeqTerminator`]) — loops, branches, calls, loads/stores and value
//!   construction as basic blocks over mutable variables.
//!
//! - **Builder** ([`SeqBuilder`]) — the "position, emit, terminate" API
//!   every generator writes through.
//!
//! - **Lowering** ([`lower`]) — one shared pass to a stack-machine
//!   [`MethodBody`], followed by stack verification ([`verify`]).
//!
//! # Design
//!
//! Generators describe *what* a method does. Slot numbering, branch
//! target resolution and stack balance are decided once, here, so an
//! encoding bug has a single point of fix.

pub mod body;
mod builder;
pub mod ir;
mod lower;
pub mod types;

pub use body::{Label, MethodBody, Op};
pub use builder::SeqBuilder;
pub use ir::{
    BinOp, BlockId, Const, Operand, SeqBlock, SeqFunction, SeqInstr, SeqTerminator, SeqValue,
    SeqVar, VarId, VarKind,
};
pub use lower::{lower, verify, LowerError};
pub use types::{GenericParam, MethodRef, ParamMode, ScalarType, Substitution, TypeRef};

#[cfg(test)]
mod test_helpers;
