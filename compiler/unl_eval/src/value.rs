//! Runtime values and the arithmetic the instruction set performs on them.
//!
//! The operand set is closed, so every operation is a direct match over
//! [`Value`] pairs rather than a trait object.

use std::cmp::Ordering;
use std::fmt;

use unl_ir::{ScalarType, TypeRef};

use crate::error::{mismatch, EvalError};
use crate::heap::ObjId;

/// Where a managed reference points.
///
/// `Arg` and `Local` are relative to the executing frame; the others name
/// heap storage and stay valid for the machine's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Place {
    Arg(u16),
    Local(u16),
    /// Element `index` of an array or materialized sequence.
    Element { obj: ObjId, index: usize },
    /// A boxed value: by-reference arguments and detached results.
    Cell(ObjId),
}

/// One evaluation stack entry, argument or local.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Value {
    /// Result of a void call; never stored by well-formed bodies.
    #[default]
    Unit,
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Null,
    Obj(ObjId),
    Ref(Place),
}

/// Hashable identity of a value, with floats compared by bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Unit,
    Scalar(u8, u64),
    Null,
    Obj(ObjId),
    Ref(Place),
}

impl Value {
    /// Zero value of `ty`: numeric zero, `false`, or null.
    pub fn default_of(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Scalar(s) => Self::zero(*s),
            TypeRef::Void => Self::Unit,
            _ => Self::Null,
        }
    }

    fn zero(s: ScalarType) -> Self {
        match s {
            ScalarType::Bool => Self::Bool(false),
            ScalarType::I32 => Self::I32(0),
            ScalarType::U32 => Self::U32(0),
            ScalarType::I64 => Self::I64(0),
            ScalarType::U64 => Self::U64(0),
            ScalarType::F32 => Self::F32(0.0),
            ScalarType::F64 => Self::F64(0.0),
        }
    }

    /// Fit a value to the declared type of the slot receiving it.
    ///
    /// Boolean constants travel as `ldc.i4` and become `bool` here. Only
    /// scalar slots are checked; object slots accept any value.
    pub fn coerce(self, ty: &TypeRef) -> Result<Self, EvalError> {
        let TypeRef::Scalar(s) = ty else {
            return Ok(self);
        };
        match (s, self) {
            (ScalarType::Bool, Self::I32(v)) => Ok(Self::Bool(v != 0)),
            (ScalarType::Bool, Self::Bool(_))
            | (ScalarType::I32, Self::I32(_))
            | (ScalarType::U32, Self::U32(_))
            | (ScalarType::I64, Self::I64(_))
            | (ScalarType::U64, Self::U64(_))
            | (ScalarType::F32, Self::F32(_))
            | (ScalarType::F64, Self::F64(_)) => Ok(self),
            _ => Err(mismatch(s.name(), &self)),
        }
    }

    /// Branch condition: `bool` or a non-zero `int`.
    pub fn truthy(self) -> Result<bool, EvalError> {
        match self {
            Self::Bool(b) => Ok(b),
            Self::I32(v) => Ok(v != 0),
            Self::Null => Ok(false),
            Self::Obj(_) | Self::Ref(_) => Ok(true),
            other => Err(mismatch("bool", &other)),
        }
    }

    pub fn as_i64(self) -> Result<i64, EvalError> {
        match self {
            Self::I64(v) => Ok(v),
            Self::I32(v) => Ok(i64::from(v)),
            other => Err(mismatch("long", &other)),
        }
    }

    pub fn as_obj(self) -> Result<ObjId, EvalError> {
        match self {
            Self::Obj(id) => Ok(id),
            Self::Null => Err(EvalError::NullReference),
            other => Err(mismatch("object", &other)),
        }
    }

    #[expect(
        clippy::cast_sign_loss,
        reason = "signed values are keyed by their bit pattern"
    )]
    pub(crate) fn key(self) -> ValueKey {
        match self {
            Self::Unit => ValueKey::Unit,
            Self::Bool(b) => ValueKey::Scalar(0, u64::from(b)),
            Self::I32(v) => ValueKey::Scalar(1, u64::from(v as u32)),
            Self::U32(v) => ValueKey::Scalar(2, u64::from(v)),
            Self::I64(v) => ValueKey::Scalar(3, v as u64),
            Self::U64(v) => ValueKey::Scalar(4, v),
            Self::F32(v) => ValueKey::Scalar(5, u64::from(v.to_bits())),
            Self::F64(v) => ValueKey::Scalar(6, v.to_bits()),
            Self::Null => ValueKey::Null,
            Self::Obj(id) => ValueKey::Obj(id),
            Self::Ref(p) => ValueKey::Ref(p),
        }
    }

    /// Ordering of two keys of the same scalar type.
    pub fn compare(self, other: Self) -> Result<Option<Ordering>, EvalError> {
        Ok(match (self, other) {
            (Self::I32(a), Self::I32(b)) => Some(a.cmp(&b)),
            (Self::U32(a), Self::U32(b)) => Some(a.cmp(&b)),
            (Self::I64(a), Self::I64(b)) => Some(a.cmp(&b)),
            (Self::U64(a), Self::U64(b)) => Some(a.cmp(&b)),
            (Self::F32(a), Self::F32(b)) => a.partial_cmp(&b),
            (Self::F64(a), Self::F64(b)) => a.partial_cmp(&b),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(&b)),
            (a, b) => return Err(mismatch(format!("{a:?}-compatible operand"), &b)),
        })
    }

    /// Total order over `MinBy`/`MaxBy` keys. A NaN key sorts below every
    /// number and equal to another NaN.
    pub fn key_order(self, other: Self) -> Result<Ordering, EvalError> {
        let nan = |v: Self| match v {
            Self::F32(x) => x.is_nan(),
            Self::F64(x) => x.is_nan(),
            _ => false,
        };
        Ok(match (nan(self), nan(other)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other)?.unwrap_or(Ordering::Equal),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}u"),
            Self::I64(v) => write!(f, "{v}L"),
            Self::U64(v) => write!(f, "{v}UL"),
            Self::F32(v) => write!(f, "{v}f"),
            Self::F64(v) => write!(f, "{v}d"),
            Self::Null => f.write_str("null"),
            Self::Obj(id) => write!(f, "obj#{}", id.raw()),
            Self::Ref(p) => write!(f, "&{p:?}"),
        }
    }
}

// ── Arithmetic ──────────────────────────────────────────────────────

/// Arithmetic instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    DivUn,
}

/// Integer arithmetic wraps like the instruction set it models.
/// `div.un` on signed operands divides their unsigned reinterpretations.
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "div.un reinterprets signed operands as unsigned"
)]
pub(crate) fn arith(op: Arith, a: Value, b: Value) -> Result<Value, EvalError> {
    use Value::{F32, F64, I32, I64, U32, U64};

    macro_rules! int {
        ($ctor:path, $x:expr, $y:expr) => {
            match op {
                Arith::Add => $ctor($x.wrapping_add($y)),
                Arith::Sub => $ctor($x.wrapping_sub($y)),
                Arith::Mul => $ctor($x.wrapping_mul($y)),
                Arith::Div | Arith::DivUn => {
                    if $y == 0 {
                        return Err(EvalError::DivideByZero);
                    }
                    $ctor($x.wrapping_div($y))
                }
            }
        };
    }
    macro_rules! float {
        ($ctor:path, $x:expr, $y:expr) => {
            match op {
                Arith::Add => $ctor($x + $y),
                Arith::Sub => $ctor($x - $y),
                Arith::Mul => $ctor($x * $y),
                Arith::Div | Arith::DivUn => $ctor($x / $y),
            }
        };
    }

    Ok(match (a, b) {
        (I32(x), I32(y)) if op == Arith::DivUn => {
            let (x, y) = (x as u32, y as u32);
            if y == 0 {
                return Err(EvalError::DivideByZero);
            }
            I32((x / y) as i32)
        }
        (I64(x), I64(y)) if op == Arith::DivUn => {
            let (x, y) = (x as u64, y as u64);
            if y == 0 {
                return Err(EvalError::DivideByZero);
            }
            I64((x / y) as i64)
        }
        (I32(x), I32(y)) => int!(I32, x, y),
        (U32(x), U32(y)) => int!(U32, x, y),
        (I64(x), I64(y)) => int!(I64, x, y),
        (U64(x), U64(y)) => int!(U64, x, y),
        (F32(x), F32(y)) => float!(F32, x, y),
        (F64(x), F64(y)) => float!(F64, x, y),
        (a, b) => return Err(mismatch(format!("operand matching {a:?}"), &b)),
    })
}

/// Comparison instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Compare {
    Lt,
    Gt,
    Eq,
}

pub(crate) fn compare(op: Compare, a: Value, b: Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(match op {
        Compare::Eq => equals(a, b),
        Compare::Lt => a.compare(b)? == Some(Ordering::Less),
        Compare::Gt => a.compare(b)? == Some(Ordering::Greater),
    }))
}

/// `ceq`: scalars by value, objects by identity, `bool` against `int`
/// as `0`/`1`.
#[expect(clippy::float_cmp, reason = "ceq compares floats exactly")]
fn equals(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::I32(y)) | (Value::I32(y), Value::Bool(x)) => i32::from(x) == y,
        (Value::F32(x), Value::F32(y)) => x == y,
        (Value::F64(x), Value::F64(y)) => x == y,
        _ => a.key() == b.key(),
    }
}

// ── Conversion ──────────────────────────────────────────────────────

/// `conv.*`: numeric conversion with truncation and reinterpretation.
/// Converting to `bool` tests for zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    reason = "conversion instructions truncate and reinterpret by definition"
)]
pub(crate) fn convert(v: Value, to: ScalarType) -> Result<Value, EvalError> {
    let nonzero = match v {
        Value::Bool(x) => x,
        Value::I32(x) => x != 0,
        Value::U32(x) => x != 0,
        Value::I64(x) => x != 0,
        Value::U64(x) => x != 0,
        Value::F32(x) => x.abs() > 0.0,
        Value::F64(x) => x.abs() > 0.0,
        other => return Err(mismatch(to.name(), &other)),
    };
    macro_rules! cast {
        ($x:expr) => {
            match to {
                ScalarType::Bool => Value::Bool(nonzero),
                ScalarType::I32 => Value::I32($x as i32),
                ScalarType::U32 => Value::U32($x as u32),
                ScalarType::I64 => Value::I64($x as i64),
                ScalarType::U64 => Value::U64($x as u64),
                ScalarType::F32 => Value::F32($x as f32),
                ScalarType::F64 => Value::F64($x as f64),
            }
        };
    }
    Ok(match v {
        Value::Bool(x) => cast!(u8::from(x)),
        Value::I32(x) => cast!(x),
        Value::U32(x) => cast!(x),
        Value::I64(x) => cast!(x),
        Value::U64(x) => cast!(x),
        Value::F32(x) => cast!(x),
        Value::F64(x) => cast!(x),
        other => return Err(mismatch(to.name(), &other)),
    })
}
