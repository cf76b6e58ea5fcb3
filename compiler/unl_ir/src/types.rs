//! Type and member references used by generated signatures and bodies.

use std::fmt;

use rustc_hash::FxHashMap;

/// Generic parameter name → concrete type.
pub type Substitution = FxHashMap<String, TypeRef>;

// ── Scalars ─────────────────────────────────────────────────────────

/// Primitive value types the lowering knows the width and signedness of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Surface name as it appears in signatures.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "long",
            Self::U64 => "ulong",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    #[inline]
    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U32 | Self::U64)
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

// ── Types ───────────────────────────────────────────────────────────

/// A type as written in a generated signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Void,
    Scalar(ScalarType),
    /// A generic parameter of the method or of an enclosing stub.
    Param(String),
    /// A (possibly generic) named type: `ArrayEnumerable<T>`.
    Named { name: String, args: Vec<TypeRef> },
    /// A type nested in another: `ArrayEnumerable<T>.Enumerator`.
    Nested { outer: Box<TypeRef>, name: String },
    /// Single-dimension array: `T[]`.
    Array(Box<TypeRef>),
    /// Managed reference: `T&`.
    ByRef(Box<TypeRef>),
}

impl TypeRef {
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn named(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    pub fn array(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub fn by_ref(self) -> Self {
        Self::ByRef(Box::new(self))
    }

    #[must_use]
    pub fn nested(self, name: impl Into<String>) -> Self {
        Self::Nested {
            outer: Box::new(self),
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Element type of an array type.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            Self::Array(e) => Some(e),
            _ => None,
        }
    }

    /// Target of a managed reference.
    pub fn pointee(&self) -> Option<&TypeRef> {
        match self {
            Self::ByRef(t) => Some(t),
            _ => None,
        }
    }

    /// Base name used to find the declaring stub, ignoring arguments.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } | Self::Nested { name, .. } => Some(name),
            Self::Param(name) => Some(name),
            _ => None,
        }
    }

    /// Outermost declaring type name: `ArrayEnumerable` for
    /// `ArrayEnumerable<T>.Enumerator`.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Self::Nested { outer, .. } => outer.root_name(),
            Self::Named { name, .. } | Self::Param(name) => Some(name),
            _ => None,
        }
    }

    /// Replace generic parameters named in `subst`.
    #[must_use]
    pub fn substitute(&self, subst: &Substitution) -> TypeRef {
        match self {
            Self::Param(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            Self::Named { name, args } => Self::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(subst)).collect(),
            },
            Self::Nested { outer, name } => Self::Nested {
                outer: Box::new(outer.substitute(subst)),
                name: name.clone(),
            },
            Self::Array(e) => Self::Array(Box::new(e.substitute(subst))),
            Self::ByRef(t) => Self::ByRef(Box::new(t.substitute(subst))),
            Self::Void | Self::Scalar(_) => self.clone(),
        }
    }
}

impl From<ScalarType> for TypeRef {
    fn from(s: ScalarType) -> Self {
        Self::Scalar(s)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Scalar(s) => f.write_str(s.name()),
            Self::Param(name) => f.write_str(name),
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Nested { outer, name } => write!(f, "{outer}.{name}"),
            Self::Array(e) => write!(f, "{e}[]"),
            Self::ByRef(t) => write!(f, "{t}&"),
        }
    }
}

// ── Generic parameters ──────────────────────────────────────────────

/// A method or stub generic parameter with its constraints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub name: String,
    pub unmanaged: bool,
    pub constraints: Vec<TypeRef>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unmanaged: false,
            constraints: Vec::new(),
        }
    }

    /// A parameter restricted to unmanaged (bit-copyable) types.
    pub fn unmanaged(name: impl Into<String>) -> Self {
        Self {
            unmanaged: true,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: TypeRef) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The type this parameter names.
    pub fn as_type(&self) -> TypeRef {
        TypeRef::Param(self.name.clone())
    }

    #[must_use]
    pub fn substitute(&self, name: String, subst: &Substitution) -> GenericParam {
        GenericParam {
            name,
            unmanaged: self.unmanaged,
            constraints: self.constraints.iter().map(|c| c.substitute(subst)).collect(),
        }
    }
}

impl fmt::Display for GenericParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let mut sep = " : ";
        if self.unmanaged {
            f.write_str(sep)?;
            f.write_str("unmanaged")?;
            sep = ", ";
        }
        for c in &self.constraints {
            write!(f, "{sep}{c}")?;
            sep = ", ";
        }
        Ok(())
    }
}

// ── Parameters ──────────────────────────────────────────────────────

/// How a parameter is passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ParamMode {
    #[default]
    Value,
    /// Read-only reference.
    In,
    /// Write-only reference the callee must assign.
    Out,
    /// Read-write reference.
    Ref,
}

impl ParamMode {
    #[inline]
    pub fn is_by_ref(self) -> bool {
        !matches!(self, Self::Value)
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Value => None,
            Self::In => Some("in"),
            Self::Out => Some("out"),
            Self::Ref => Some("ref"),
        }
    }
}

// ── Member references ───────────────────────────────────────────────

/// A resolved method on a concrete (instantiated) owner type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: TypeRef,
    pub name: String,
    /// Parameter count, excluding the receiver.
    pub arity: usize,
    pub has_this: bool,
    /// Dispatched through the receiver's method table.
    pub is_virtual: bool,
    pub ret: TypeRef,
}

impl MethodRef {
    /// Values the call pops: arguments plus the receiver.
    #[inline]
    pub fn pops(&self) -> usize {
        self.arity + usize::from(self.has_this)
    }

    #[inline]
    pub fn pushes(&self) -> usize {
        usize::from(!self.ret.is_void())
    }

    #[inline]
    pub fn is_ctor(&self) -> bool {
        self.name == ".ctor"
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instance = if self.has_this { "instance " } else { "" };
        write!(
            f,
            "{instance}{} {}::{}/{}",
            self.ret, self.owner, self.name, self.arity
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_nested_generic() {
        let t = TypeRef::param("T");
        let ty = TypeRef::named("ArrayEnumerable", vec![t]).nested("Enumerator");
        assert_eq!(ty.to_string(), "ArrayEnumerable<T>.Enumerator");
        assert_eq!(ty.root_name(), Some("ArrayEnumerable"));
        assert_eq!(ty.base_name(), Some("Enumerator"));
    }

    #[test]
    fn substitute_reaches_every_position() {
        let mut subst = Substitution::default();
        subst.insert("TEnumerable".to_owned(), TypeRef::param("TEnumerable0"));
        let ty = TypeRef::named(
            "WhereEnumerable",
            vec![TypeRef::param("TEnumerable"), TypeRef::param("T")],
        )
        .nested("Enumerator")
        .by_ref();
        assert_eq!(
            ty.substitute(&subst).to_string(),
            "WhereEnumerable<TEnumerable0, T>.Enumerator&"
        );
    }

    #[test]
    fn generic_param_display() {
        let p = GenericParam::unmanaged("T").with_constraint(TypeRef::named(
            "IEquatable",
            vec![TypeRef::param("T")],
        ));
        assert_eq!(p.to_string(), "T : unmanaged, IEquatable<T>");
        assert_eq!(GenericParam::new("TKey").to_string(), "TKey");
    }

    #[test]
    fn call_stack_effect() {
        let m = MethodRef {
            owner: TypeRef::param("TEnumerator"),
            name: "TryMoveNext".to_owned(),
            arity: 0,
            has_this: true,
            is_virtual: false,
            ret: ScalarType::Bool.into(),
        };
        assert_eq!((m.pops(), m.pushes()), (1, 1));
        assert_eq!(m.to_string(), "instance bool TEnumerator::TryMoveNext/0");
    }
}
