//! Lowered method bodies: a stack-machine instruction stream.

use std::fmt;

use crate::types::{MethodRef, ScalarType, TypeRef};

/// Index of an instruction within a [`MethodBody`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Label(u32);

impl Label {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One stack-machine instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    LdArg(u16),
    LdArgA(u16),
    StArg(u16),
    LdLoc(u16),
    LdLocA(u16),
    StLoc(u16),
    LdcI4(i32),
    LdcI8(i64),
    LdcR4(f32),
    LdcR8(f64),
    LdNull,
    Add,
    Sub,
    Mul,
    Div,
    DivUn,
    Clt,
    Cgt,
    Ceq,
    Conv(ScalarType),
    /// Array length as a native unsigned integer.
    LdLen,
    LdElem(TypeRef),
    LdElemA(TypeRef),
    /// Load the value behind a managed reference.
    LdObj(TypeRef),
    /// Store a value through a managed reference.
    StObj(TypeRef),
    /// Zero the storage behind a managed reference.
    InitObj(TypeRef),
    Call(MethodRef),
    CallVirt(MethodRef),
    NewObj(MethodRef),
    Dup,
    Pop,
    Br(Label),
    BrTrue(Label),
    BrFalse(Label),
    Ret,
    ThrowArgumentNull(String),
}

impl Op {
    /// Branch target, if any.
    pub fn target(&self) -> Option<Label> {
        match self {
            Self::Br(l) | Self::BrTrue(l) | Self::BrFalse(l) => Some(*l),
            _ => None,
        }
    }

    /// Whether control can continue to the next instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(self, Self::Br(_) | Self::Ret | Self::ThrowArgumentNull(_))
    }

    pub(crate) fn retarget(&mut self, label: Label) {
        if let Self::Br(l) | Self::BrTrue(l) | Self::BrFalse(l) = self {
            *l = label;
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LdArg(i) => write!(f, "ldarg {i}"),
            Self::LdArgA(i) => write!(f, "ldarga {i}"),
            Self::StArg(i) => write!(f, "starg {i}"),
            Self::LdLoc(i) => write!(f, "ldloc {i}"),
            Self::LdLocA(i) => write!(f, "ldloca {i}"),
            Self::StLoc(i) => write!(f, "stloc {i}"),
            Self::LdcI4(v) => write!(f, "ldc.i4 {v}"),
            Self::LdcI8(v) => write!(f, "ldc.i8 {v}"),
            Self::LdcR4(v) => write!(f, "ldc.r4 {v}"),
            Self::LdcR8(v) => write!(f, "ldc.r8 {v}"),
            Self::LdNull => f.write_str("ldnull"),
            Self::Add => f.write_str("add"),
            Self::Sub => f.write_str("sub"),
            Self::Mul => f.write_str("mul"),
            Self::Div => f.write_str("div"),
            Self::DivUn => f.write_str("div.un"),
            Self::Clt => f.write_str("clt"),
            Self::Cgt => f.write_str("cgt"),
            Self::Ceq => f.write_str("ceq"),
            Self::Conv(s) => write!(f, "conv.{}", conv_suffix(*s)),
            Self::LdLen => f.write_str("ldlen"),
            Self::LdElem(t) => write!(f, "ldelem {t}"),
            Self::LdElemA(t) => write!(f, "ldelema {t}"),
            Self::LdObj(t) => write!(f, "ldobj {t}"),
            Self::StObj(t) => write!(f, "stobj {t}"),
            Self::InitObj(t) => write!(f, "initobj {t}"),
            Self::Call(m) => write!(f, "call {m}"),
            Self::CallVirt(m) => write!(f, "callvirt {m}"),
            Self::NewObj(m) => write!(f, "newobj {m}"),
            Self::Dup => f.write_str("dup"),
            Self::Pop => f.write_str("pop"),
            Self::Br(l) => write!(f, "br IL_{:04x}", l.0),
            Self::BrTrue(l) => write!(f, "brtrue IL_{:04x}", l.0),
            Self::BrFalse(l) => write!(f, "brfalse IL_{:04x}", l.0),
            Self::Ret => f.write_str("ret"),
            Self::ThrowArgumentNull(p) => write!(f, "throw ArgumentNullException(\"{p}\")"),
        }
    }
}

fn conv_suffix(s: ScalarType) -> &'static str {
    match s {
        ScalarType::Bool => "bool",
        ScalarType::I32 => "i4",
        ScalarType::U32 => "u4",
        ScalarType::I64 => "i8",
        ScalarType::U64 => "u8",
        ScalarType::F32 => "r4",
        ScalarType::F64 => "r8",
    }
}

/// A lowered, verified method body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodBody {
    /// Local slot types, by slot index.
    pub locals: Vec<TypeRef>,
    pub ops: Vec<Op>,
    /// Deepest evaluation stack any path reaches.
    pub max_stack: u16,
}

impl MethodBody {
    /// Whether any instruction calls a method with this name.
    pub fn calls(&self, name: &str) -> bool {
        self.ops.iter().any(|op| match op {
            Op::Call(m) | Op::CallVirt(m) | Op::NewObj(m) => m.name == name,
            _ => false,
        })
    }
}

impl fmt::Display for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".maxstack {}", self.max_stack)?;
        if !self.locals.is_empty() {
            f.write_str(".locals (")?;
            for (i, t) in self.locals.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "[{i}] {t}")?;
            }
            writeln!(f, ")")?;
        }
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "IL_{i:04x}: {op}")?;
        }
        Ok(())
    }
}
