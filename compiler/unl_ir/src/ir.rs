//! Sequence IR — basic-block representation of one generated method.
//!
//! Generators never write stack code by hand. They build a [`SeqFunction`]
//! through [`SeqBuilder`](crate::SeqBuilder) and hand it to
//! [`lower`](crate::lower), which owns slot assignment, branch resolution
//! and stack discipline.
//!
//! - **[`SeqFunction`]** — parameters, variables, blocks
//! - **[`SeqBlock`]** — straight-line instructions plus one terminator
//! - **[`SeqInstr`]** — assign, call, construct, construct-in-place, reset
//! - **[`SeqTerminator`]** — return, jump, branch, throw
//!
//! Variables are mutable slots, not SSA values: a loop counter is one
//! [`VarId`] assigned on every iteration. A parameter passed by reference
//! (`in`/`out`/`ref`) denotes its referent, so reading or assigning it goes
//! through the reference.

use std::fmt;

use crate::types::{ParamMode, ScalarType, TypeRef};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Variable ID within a [`SeqFunction`]. Allocated sequentially from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a [`SeqFunction`]. Block 0 is the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

// ── Constants ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Const {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Null,
}

// ── Operators ───────────────────────────────────────────────────────

/// Binary operators. Comparisons produce `bool`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Unsigned division.
    DivUn,
    Lt,
    Gt,
    Eq,
}

impl BinOp {
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Eq)
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Right-hand side of an assignment. Side-effect free.
#[derive(Clone, Debug, PartialEq)]
pub enum SeqValue {
    Var(VarId),
    Const(Const),
    Binary { op: BinOp, lhs: VarId, rhs: VarId },
    Convert { src: VarId, to: ScalarType },
    /// Length of an array, as a 64-bit integer.
    Length(VarId),
    /// Copy of `array[index]`.
    Element { array: VarId, index: VarId },
    /// Value behind a managed-reference variable.
    Deref(VarId),
    /// `var == null`.
    IsNull(VarId),
}

/// A call or constructor argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// The variable's value.
    Var(VarId),
    /// A reference to the variable's storage.
    Addr(VarId),
    /// A reference to `array[index]`.
    ElementAddr { array: VarId, index: VarId },
    Const(Const),
}

// ── Instructions ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum SeqInstr {
    /// `dst = value`. Stores through the reference when `dst` is a by-ref
    /// parameter.
    Assign { dst: VarId, value: SeqValue },
    /// Call an external method or strategy. With `dst: None` a non-void
    /// result is discarded.
    Call {
        dst: Option<VarId>,
        method: crate::MethodRef,
        args: Vec<Operand>,
    },
    /// `dst = new Owner(args)`.
    Construct {
        dst: VarId,
        ctor: crate::MethodRef,
        args: Vec<Operand>,
    },
    /// Run `ctor` on the existing storage of `target`.
    InitInPlace {
        target: VarId,
        ctor: crate::MethodRef,
        args: Vec<Operand>,
    },
    /// Reset `target` to the default value of its type.
    InitDefault { target: VarId },
}

/// Block exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeqTerminator {
    Return { value: Option<VarId> },
    Jump { target: BlockId },
    Branch {
        cond: VarId,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Raise `ArgumentNullException(param)`.
    ThrowArgumentNull { param: String },
}

impl SeqTerminator {
    /// Blocks this terminator may transfer control to.
    pub fn successors(&self) -> smallvec::SmallVec<[BlockId; 2]> {
        match self {
            Self::Jump { target } => smallvec::smallvec![*target],
            Self::Branch {
                then_block,
                else_block,
                ..
            } => smallvec::smallvec![*then_block, *else_block],
            Self::Return { .. } | Self::ThrowArgumentNull { .. } => smallvec::SmallVec::new(),
        }
    }
}

// ── Functions ───────────────────────────────────────────────────────

/// What kind of storage a variable lives in.
#[derive(Clone, Debug, PartialEq)]
pub enum VarKind {
    Param {
        index: u16,
        name: String,
        mode: ParamMode,
        default: Option<Const>,
    },
    Local,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeqVar {
    pub id: VarId,
    pub ty: TypeRef,
    pub kind: VarKind,
}

impl SeqVar {
    #[inline]
    pub fn is_param(&self) -> bool {
        matches!(self.kind, VarKind::Param { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeqBlock {
    pub id: BlockId,
    pub body: Vec<SeqInstr>,
    pub terminator: SeqTerminator,
}

/// A complete method body in sequence IR.
#[derive(Clone, Debug, PartialEq)]
pub struct SeqFunction {
    pub name: String,
    pub vars: Vec<SeqVar>,
    pub blocks: Vec<SeqBlock>,
    pub return_type: TypeRef,
}

impl SeqFunction {
    #[inline]
    pub fn var(&self, id: VarId) -> Option<&SeqVar> {
        self.vars.get(id.index())
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &SeqVar> {
        self.vars.iter().filter(|v| v.is_param())
    }

    /// Locals in allocation order.
    pub fn locals(&self) -> impl Iterator<Item = &SeqVar> {
        self.vars.iter().filter(|v| !v.is_param())
    }
}
