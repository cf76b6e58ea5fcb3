//! Generation errors.

use thiserror::Error;
use unl_ir::LowerError;

/// Why a generation run (or one operator unit of it) was aborted.
///
/// An operator that is simply disabled is not an error: its generator
/// returns no holder.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenError {
    /// Unknown source name, unknown numeric type, duplicate holder name or a
    /// malformed configuration document.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A source declared special that is neither a contiguous array nor an
    /// external buffer, or a kind the operator has no lowering for.
    #[error("operator `{operator}` cannot be generated for source `{source_name}`")]
    UnsupportedCombination {
        operator: String,
        source_name: String,
    },

    /// A stub type lacks a method, constructor or nested enumerator the
    /// generated code must call.
    #[error("`{owner}` has no member `{member}`")]
    MissingMember { owner: String, member: String },

    /// The generator built IR the shared lowering pass rejected.
    #[error("lowering failed: {0}")]
    Lower(#[from] LowerError),
}

impl GenError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(operator: &str, source_name: &str) -> Self {
        Self::UnsupportedCombination {
            operator: operator.to_owned(),
            source_name: source_name.to_owned(),
        }
    }

    pub(crate) fn missing(owner: impl ToString, member: &str) -> Self {
        Self::MissingMember {
            owner: owner.to_string(),
            member: member.to_owned(),
        }
    }
}
