//! Operator descriptors and numeric policies.
//!
//! An [`OperatorSpec`] is the static description of one generator: the
//! configuration key it is enabled by, the holder type it fills, how many
//! sources it takes and which source kinds it can lower.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use unl_ir::{BinOp, ScalarType, TypeRef};

use crate::error::GenError;
use crate::matrix::EnablementMatrix;
use crate::registry::SourceKind;

/// Configuration keys, one per generator family.
pub mod op {
    pub const WHERE: &str = "Where";
    pub const SELECT: &str = "Select";
    pub const CONCAT: &str = "Concat";
    pub const DISTINCT: &str = "Distinct";
    pub const UNION: &str = "Union";
    pub const AGGREGATE_REF_VALUE_1_REF: &str = "AggregateRefValue1Ref";
    pub const AGGREGATE_VALUE_1_FUNC: &str = "AggregateValue1Func";
    pub const AGGREGATE_REF_VALUE_2_REFS: &str = "AggregateRefValue2Refs";
    pub const TRY_GET_AVERAGE: &str = "TryGetAverage";
    pub const TRY_GET_LAST: &str = "TryGetLast";
    pub const TRY_GET_FIRST: &str = "TryGetFirst";
    pub const LONG_COUNT: &str = "LongCount";
    pub const MIN_BY: &str = "MinBy";
    pub const MAX_BY: &str = "MaxBy";

    /// Every key, in standard generation order.
    pub const ALL: &[&str] = &[
        WHERE,
        SELECT,
        CONCAT,
        DISTINCT,
        UNION,
        AGGREGATE_REF_VALUE_1_REF,
        AGGREGATE_VALUE_1_FUNC,
        AGGREGATE_REF_VALUE_2_REFS,
        TRY_GET_AVERAGE,
        TRY_GET_LAST,
        TRY_GET_FIRST,
        LONG_COUNT,
        MIN_BY,
        MAX_BY,
    ];

    /// Operators that take two sources.
    pub fn is_binary(name: &str) -> bool {
        name == CONCAT || name == UNION
    }
}

/// Source name that stands for "any enumerable" in open-generic overloads.
pub const OPEN_GENERIC: &str = "TEnumerable";

// ── Operator specs ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
}

bitflags! {
    /// Source kinds an operator has a lowering strategy for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KindSet: u8 {
        const CONTIGUOUS = 1 << 0;
        const EXTERNAL_BUFFER = 1 << 1;
        const GENERIC = 1 << 2;
    }
}

impl KindSet {
    pub fn of(kind: &SourceKind) -> Self {
        match kind {
            SourceKind::Contiguous => Self::CONTIGUOUS,
            SourceKind::ExternalBuffer => Self::EXTERNAL_BUFFER,
            SourceKind::Generic(_) => Self::GENERIC,
        }
    }
}

/// Static description of one generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorSpec {
    /// Configuration key the generator is enabled by.
    pub name: &'static str,
    /// Method name emitted into the holder.
    pub method: &'static str,
    /// Holder type name. Unique per run.
    pub holder: String,
    pub description: &'static str,
    pub arity: Arity,
    pub kinds: KindSet,
    /// Operators that must be enabled for this one to emit anything.
    pub requires: &'static [&'static str],
}

impl OperatorSpec {
    pub fn new(name: &'static str, method: &'static str, holder: impl Into<String>) -> Self {
        Self {
            name,
            method,
            holder: holder.into(),
            description: "",
            arity: if op::is_binary(name) {
                Arity::Binary
            } else {
                Arity::Unary
            },
            kinds: KindSet::all(),
            requires: &[],
        }
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn requires(mut self, requires: &'static [&'static str]) -> Self {
        self.requires = requires;
        self
    }

    /// Reject a source kind this operator cannot lower.
    pub fn check_kind(&self, kind: &SourceKind, source: &str) -> Result<(), GenError> {
        if self.kinds.contains(KindSet::of(kind)) {
            Ok(())
        } else {
            Err(GenError::unsupported(self.name, source))
        }
    }

    /// The operator itself and everything it requires are switched on.
    pub fn is_active(&self, matrix: &EnablementMatrix) -> bool {
        matrix.is_operator_enabled(self.name)
            && self.requires.iter().all(|r| matrix.is_operator_enabled(r))
    }
}

// ── Numeric types ───────────────────────────────────────────────────

/// Element and key types the numeric generators are instantiated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericType {
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
}

/// How `TryGetAverage` accumulates and divides for one element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AveragePolicy {
    /// Type of the running sum.
    pub acc: ScalarType,
    /// Conversion applied to each element before it is added.
    pub widen: Option<ScalarType>,
    /// Conversion applied to the 64-bit count before dividing.
    pub count: Option<ScalarType>,
    pub div: BinOp,
    /// Conversion applied to the quotient before it is written out.
    pub narrow: Option<ScalarType>,
}

impl NumericType {
    pub const ALL: [NumericType; 6] = [
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Single,
        Self::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Single => "Single",
            Self::Double => "Double",
        }
    }

    pub fn scalar(self) -> ScalarType {
        match self {
            Self::Int32 => ScalarType::I32,
            Self::UInt32 => ScalarType::U32,
            Self::Int64 => ScalarType::I64,
            Self::UInt64 => ScalarType::U64,
            Self::Single => ScalarType::F32,
            Self::Double => ScalarType::F64,
        }
    }

    #[inline]
    pub fn ty(self) -> TypeRef {
        self.scalar().into()
    }

    /// 32-bit integers accumulate in 64 bits and narrow the quotient back;
    /// unsigned types divide unsigned; floats divide by the count converted
    /// to their own width.
    pub fn average_policy(self) -> AveragePolicy {
        match self {
            Self::Int32 => AveragePolicy {
                acc: ScalarType::I64,
                widen: Some(ScalarType::I64),
                count: None,
                div: BinOp::Div,
                narrow: Some(ScalarType::I32),
            },
            Self::UInt32 => AveragePolicy {
                acc: ScalarType::U64,
                widen: Some(ScalarType::U64),
                count: Some(ScalarType::U64),
                div: BinOp::DivUn,
                narrow: Some(ScalarType::U32),
            },
            Self::Int64 => AveragePolicy {
                acc: ScalarType::I64,
                widen: None,
                count: None,
                div: BinOp::Div,
                narrow: None,
            },
            Self::UInt64 => AveragePolicy {
                acc: ScalarType::U64,
                widen: None,
                count: Some(ScalarType::U64),
                div: BinOp::DivUn,
                narrow: None,
            },
            Self::Single => AveragePolicy {
                acc: ScalarType::F32,
                widen: None,
                count: Some(ScalarType::F32),
                div: BinOp::Div,
                narrow: None,
            },
            Self::Double => AveragePolicy {
                acc: ScalarType::F64,
                widen: None,
                count: Some(ScalarType::F64),
                div: BinOp::Div,
                narrow: None,
            },
        }
    }
}

impl FromStr for NumericType {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| GenError::config(format!("unknown numeric type `{s}`")))
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
