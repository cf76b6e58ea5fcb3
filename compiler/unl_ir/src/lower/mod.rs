//! Lowering from sequence IR to stack-machine method bodies.
//!
//! One pass shared by every generator:
//!
//! 1. **Slots** — parameters take argument slots in declaration order,
//!    every other variable takes a local slot in allocation order.
//! 2. **Layout** — blocks are emitted in ID order. A jump to the next block
//!    falls through; a branch whose `then` block is next becomes `brfalse`.
//! 3. **Fixups** — branches are emitted against block IDs and patched to
//!    instruction indices once every block start is known.
//! 4. **Verification** — [`verify`] checks stack discipline and computes
//!    `max_stack`.

mod verify;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::body::{Label, MethodBody, Op};
use crate::ir::{
    BinOp, BlockId, Const, Operand, SeqFunction, SeqInstr, SeqTerminator, SeqValue, VarId,
    VarKind,
};
use crate::types::{MethodRef, ScalarType, TypeRef};

pub use verify::verify;

// ── Errors ──────────────────────────────────────────────────────────

/// A generator produced IR that cannot be lowered.
///
/// Always a bug in the generator, never a property of the input data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LowerError {
    UnterminatedBlock { function: String, block: u32 },
    UnknownVar { var: u32 },
    UnknownBlock { block: u32 },
    VoidResult { method: String },
    ArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },
    NotAnArray { var: u32 },
    NotAReference { var: u32 },
    StackUnderflow { at: usize },
    InconsistentStack {
        at: usize,
        expected: u16,
        found: u16,
    },
    BadReturnDepth { at: usize, depth: u16 },
    FallsOffEnd,
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedBlock { function, block } => {
                write!(f, "block bb{block} of `{function}` has no terminator")
            }
            Self::UnknownVar { var } => write!(f, "unknown variable v{var}"),
            Self::UnknownBlock { block } => write!(f, "branch to unknown block bb{block}"),
            Self::VoidResult { method } => write!(f, "`{method}` returns void"),
            Self::ArityMismatch {
                method,
                expected,
                found,
            } => write!(
                f,
                "`{method}` takes {expected} operands, {found} supplied"
            ),
            Self::NotAnArray { var } => write!(f, "v{var} is not an array"),
            Self::NotAReference { var } => write!(f, "v{var} is not a managed reference"),
            Self::StackUnderflow { at } => write!(f, "stack underflow at IL_{at:04x}"),
            Self::InconsistentStack {
                at,
                expected,
                found,
            } => write!(
                f,
                "stack depth at IL_{at:04x} is {found} on one path and {expected} on another"
            ),
            Self::BadReturnDepth { at, depth } => {
                write!(f, "ret at IL_{at:04x} with {depth} values on the stack")
            }
            Self::FallsOffEnd => f.write_str("control falls off the end of the body"),
        }
    }
}

impl std::error::Error for LowerError {}

// ── Slots ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Slot {
    Arg { index: u16, by_ref: bool },
    Local(u16),
}

struct Lowerer<'f> {
    func: &'f SeqFunction,
    slots: Vec<Slot>,
    locals: Vec<TypeRef>,
    ops: Vec<Op>,
    fixups: Vec<(usize, BlockId)>,
}

/// Lower a finished function into a verified method body.
pub fn lower(func: &SeqFunction) -> Result<MethodBody, LowerError> {
    let mut lw = Lowerer::new(func)?;
    let mut starts: FxHashMap<BlockId, usize> = FxHashMap::default();

    for (pos, block) in func.blocks.iter().enumerate() {
        starts.insert(block.id, lw.ops.len());
        for instr in &block.body {
            lw.instr(instr)?;
        }
        let next = func.blocks.get(pos + 1).map(|b| b.id);
        lw.terminator(&block.terminator, next)?;
    }

    for (at, block) in std::mem::take(&mut lw.fixups) {
        let start = starts
            .get(&block)
            .copied()
            .ok_or(LowerError::UnknownBlock { block: block.raw() })?;
        lw.ops[at].retarget(label(start));
    }

    let mut body = MethodBody {
        locals: lw.locals,
        ops: lw.ops,
        max_stack: 0,
    };
    body.max_stack = verify(&body, !func.return_type.is_void())?;
    tracing::trace!(
        function = %func.name,
        ops = body.ops.len(),
        locals = body.locals.len(),
        max_stack = body.max_stack,
        "lowered sequence function"
    );
    Ok(body)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "method bodies never exceed u32 instructions"
)]
fn label(index: usize) -> Label {
    Label::new(index as u32)
}

impl<'f> Lowerer<'f> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot counts never exceed u16"
    )]
    fn new(func: &'f SeqFunction) -> Result<Self, LowerError> {
        let mut slots = Vec::with_capacity(func.vars.len());
        let mut locals = Vec::new();
        for var in &func.vars {
            let slot = match &var.kind {
                VarKind::Param { index, mode, .. } => Slot::Arg {
                    index: *index,
                    by_ref: mode.is_by_ref(),
                },
                VarKind::Local => {
                    let index = locals.len() as u16;
                    locals.push(var.ty.clone());
                    Slot::Local(index)
                }
            };
            slots.push(slot);
        }
        if func.blocks.is_empty() {
            return Err(LowerError::FallsOffEnd);
        }
        Ok(Self {
            func,
            slots,
            locals,
            ops: Vec::new(),
            fixups: Vec::new(),
        })
    }

    fn slot(&self, var: VarId) -> Result<Slot, LowerError> {
        self.slots
            .get(var.index())
            .copied()
            .ok_or(LowerError::UnknownVar { var: var.raw() })
    }

    fn ty(&self, var: VarId) -> Result<&'f TypeRef, LowerError> {
        self.func
            .var(var)
            .map(|v| &v.ty)
            .ok_or(LowerError::UnknownVar { var: var.raw() })
    }

    // ── Loads and stores ────────────────────────────────────────────

    fn load_var(&mut self, var: VarId) -> Result<(), LowerError> {
        match self.slot(var)? {
            Slot::Arg {
                index,
                by_ref: false,
            } => self.ops.push(Op::LdArg(index)),
            Slot::Arg {
                index,
                by_ref: true,
            } => {
                let ty = self.ty(var)?.clone();
                self.ops.push(Op::LdArg(index));
                self.ops.push(Op::LdObj(ty));
            }
            Slot::Local(index) => self.ops.push(Op::LdLoc(index)),
        }
        Ok(())
    }

    fn load_addr(&mut self, var: VarId) -> Result<(), LowerError> {
        let op = match self.slot(var)? {
            Slot::Arg {
                index,
                by_ref: true,
            } => Op::LdArg(index),
            Slot::Arg {
                index,
                by_ref: false,
            } => Op::LdArgA(index),
            Slot::Local(index) => Op::LdLocA(index),
        };
        self.ops.push(op);
        Ok(())
    }

    fn load_const(&mut self, c: Const) {
        let op = match c {
            Const::Bool(b) => Op::LdcI4(i32::from(b)),
            Const::I32(v) => Op::LdcI4(v),
            Const::I64(v) => Op::LdcI8(v),
            Const::F32(v) => Op::LdcR4(v),
            Const::F64(v) => Op::LdcR8(v),
            Const::Null => Op::LdNull,
        };
        self.ops.push(op);
    }

    fn element_type(&self, array: VarId) -> Result<TypeRef, LowerError> {
        self.ty(array)?
            .element()
            .cloned()
            .ok_or(LowerError::NotAnArray { var: array.raw() })
    }

    fn value(&mut self, value: &SeqValue) -> Result<(), LowerError> {
        match value {
            SeqValue::Var(v) => self.load_var(*v)?,
            SeqValue::Const(c) => self.load_const(*c),
            SeqValue::Binary { op, lhs, rhs } => {
                self.load_var(*lhs)?;
                self.load_var(*rhs)?;
                self.ops.push(match op {
                    BinOp::Add => Op::Add,
                    BinOp::Sub => Op::Sub,
                    BinOp::Mul => Op::Mul,
                    BinOp::Div => Op::Div,
                    BinOp::DivUn => Op::DivUn,
                    BinOp::Lt => Op::Clt,
                    BinOp::Gt => Op::Cgt,
                    BinOp::Eq => Op::Ceq,
                });
            }
            SeqValue::Convert { src, to } => {
                self.load_var(*src)?;
                self.ops.push(Op::Conv(*to));
            }
            SeqValue::Length(array) => {
                self.element_type(*array)?;
                self.load_var(*array)?;
                self.ops.push(Op::LdLen);
                self.ops.push(Op::Conv(ScalarType::I64));
            }
            SeqValue::Element { array, index } => {
                let elem = self.element_type(*array)?;
                self.load_var(*array)?;
                self.load_var(*index)?;
                self.ops.push(Op::LdElem(elem));
            }
            SeqValue::Deref(ptr) => {
                let pointee = self
                    .ty(*ptr)?
                    .pointee()
                    .cloned()
                    .ok_or(LowerError::NotAReference { var: ptr.raw() })?;
                self.load_var(*ptr)?;
                self.ops.push(Op::LdObj(pointee));
            }
            SeqValue::IsNull(v) => {
                self.load_var(*v)?;
                self.ops.push(Op::LdNull);
                self.ops.push(Op::Ceq);
            }
        }
        Ok(())
    }

    fn operand(&mut self, operand: &Operand) -> Result<(), LowerError> {
        match operand {
            Operand::Var(v) => self.load_var(*v),
            Operand::Addr(v) => self.load_addr(*v),
            Operand::ElementAddr { array, index } => {
                let elem = self.element_type(*array)?;
                self.load_var(*array)?;
                self.load_var(*index)?;
                self.ops.push(Op::LdElemA(elem));
                Ok(())
            }
            Operand::Const(c) => {
                self.load_const(*c);
                Ok(())
            }
        }
    }

    fn operands(&mut self, method: &MethodRef, args: &[Operand], pops: usize) -> Result<(), LowerError> {
        if args.len() != pops {
            return Err(LowerError::ArityMismatch {
                method: method.to_string(),
                expected: pops,
                found: args.len(),
            });
        }
        for arg in args {
            self.operand(arg)?;
        }
        Ok(())
    }

    /// Store the value produced by `emit` into `dst`.
    fn store(
        &mut self,
        dst: VarId,
        emit: impl FnOnce(&mut Self) -> Result<(), LowerError>,
    ) -> Result<(), LowerError> {
        match self.slot(dst)? {
            Slot::Arg {
                index,
                by_ref: true,
            } => {
                let ty = self.ty(dst)?.clone();
                self.ops.push(Op::LdArg(index));
                emit(self)?;
                self.ops.push(Op::StObj(ty));
            }
            Slot::Arg {
                index,
                by_ref: false,
            } => {
                emit(self)?;
                self.ops.push(Op::StArg(index));
            }
            Slot::Local(index) => {
                emit(self)?;
                self.ops.push(Op::StLoc(index));
            }
        }
        Ok(())
    }

    // ── Instructions ────────────────────────────────────────────────

    fn instr(&mut self, instr: &SeqInstr) -> Result<(), LowerError> {
        match instr {
            SeqInstr::Assign { dst, value } => self.store(*dst, |lw| lw.value(value)),
            SeqInstr::Call { dst, method, args } => {
                let emit = |lw: &mut Self| -> Result<(), LowerError> {
                    lw.operands(method, args, method.pops())?;
                    lw.ops.push(if method.is_virtual {
                        Op::CallVirt(method.clone())
                    } else {
                        Op::Call(method.clone())
                    });
                    Ok(())
                };
                match dst {
                    Some(dst) if !method.ret.is_void() => self.store(*dst, emit),
                    Some(_) => Err(LowerError::VoidResult {
                        method: method.to_string(),
                    }),
                    None => {
                        emit(self)?;
                        if !method.ret.is_void() {
                            self.ops.push(Op::Pop);
                        }
                        Ok(())
                    }
                }
            }
            SeqInstr::Construct { dst, ctor, args } => self.store(*dst, |lw| {
                lw.operands(ctor, args, ctor.arity)?;
                lw.ops.push(Op::NewObj(ctor.clone()));
                Ok(())
            }),
            SeqInstr::InitInPlace { target, ctor, args } => {
                self.load_addr(*target)?;
                self.operands(ctor, args, ctor.arity)?;
                self.ops.push(Op::Call(ctor.clone()));
                Ok(())
            }
            SeqInstr::InitDefault { target } => {
                let ty = self.ty(*target)?.clone();
                self.load_addr(*target)?;
                self.ops.push(Op::InitObj(ty));
                Ok(())
            }
        }
    }

    fn terminator(&mut self, term: &SeqTerminator, next: Option<BlockId>) -> Result<(), LowerError> {
        match term {
            SeqTerminator::Return { value } => {
                if let Some(v) = value {
                    self.load_var(*v)?;
                }
                self.ops.push(Op::Ret);
            }
            SeqTerminator::Jump { target } => {
                if Some(*target) != next {
                    self.branch(Op::Br(Label::new(0)), *target);
                }
            }
            SeqTerminator::Branch {
                cond,
                then_block,
                else_block,
            } => {
                self.load_var(*cond)?;
                if Some(*then_block) == next {
                    self.branch(Op::BrFalse(Label::new(0)), *else_block);
                } else {
                    self.branch(Op::BrTrue(Label::new(0)), *then_block);
                    if Some(*else_block) != next {
                        self.branch(Op::Br(Label::new(0)), *else_block);
                    }
                }
            }
            SeqTerminator::ThrowArgumentNull { param } => {
                self.ops.push(Op::ThrowArgumentNull(param.clone()));
            }
        }
        Ok(())
    }

    fn branch(&mut self, op: Op, target: BlockId) {
        self.fixups.push((self.ops.len(), target));
        self.ops.push(op);
    }
}
