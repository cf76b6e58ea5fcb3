//! Template and extended modules.
//!
//! The [`TemplateModule`] declares the stub types generated code is written
//! against: source wrappers, Views, strategies, delegates and protocol
//! interfaces. Generators only ever read it. Their output, [`HolderType`]s
//! full of [`GeneratedMethod`]s, is collected into an [`ExtendedModule`]
//! that is handed back for persistence.

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use unl_ir::{
    Const, GenericParam, MethodBody, MethodRef, ParamMode, ScalarType, SeqFunction, Substitution,
    TypeRef, VarKind,
};
use unl_protocol::names;
use unl_protocol::SourceCaps;

use crate::error::GenError;

// ── Stub declarations ───────────────────────────────────────────────

/// Index of a stub type within its [`TemplateModule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StubHandle(u32);

impl StubHandle {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A method a stub type declares. Return types are written in terms of
/// the declaring stub's generic parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubMethod {
    pub name: String,
    pub arity: usize,
    pub has_this: bool,
    pub is_virtual: bool,
    pub ret: TypeRef,
}

impl StubMethod {
    pub fn instance(name: impl Into<String>, arity: usize, ret: TypeRef) -> Self {
        Self {
            name: name.into(),
            arity,
            has_this: true,
            is_virtual: false,
            ret,
        }
    }

    /// A delegate `Invoke`, dispatched through the receiver.
    pub fn invoke(arity: usize, ret: TypeRef) -> Self {
        Self {
            is_virtual: true,
            ..Self::instance(names::INVOKE, arity, ret)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubType {
    pub name: String,
    pub generic_params: Vec<GenericParam>,
    /// Capabilities the type reports when used as a source.
    pub caps: SourceCaps,
    pub methods: Vec<StubMethod>,
    pub nested: Vec<StubType>,
}

impl StubType {
    pub fn new(name: impl Into<String>, generic_params: Vec<GenericParam>) -> Self {
        Self {
            name: name.into(),
            generic_params,
            caps: SourceCaps::empty(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_caps(mut self, caps: SourceCaps) -> Self {
        self.caps = caps;
        self
    }

    #[must_use]
    pub fn method(mut self, method: StubMethod) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_nested(mut self, nested: StubType) -> Self {
        self.nested.push(nested);
        self
    }

    /// The type instantiated with its own generic parameters.
    pub fn self_type(&self) -> TypeRef {
        TypeRef::named(
            self.name.clone(),
            self.generic_params.iter().map(GenericParam::as_type).collect(),
        )
    }

    pub fn nested_type(&self, name: &str) -> Option<&StubType> {
        self.nested.iter().find(|n| n.name == name)
    }

    /// The nested enumerator every enumerable declares by convention.
    pub fn enumerator(&self) -> Option<&StubType> {
        self.nested_type(names::ENUMERATOR)
    }
}

// ── Template module ─────────────────────────────────────────────────

/// Read-only set of stub types generated code binds to.
#[derive(Clone, Debug, Default)]
pub struct TemplateModule {
    types: Vec<StubType>,
    by_name: FxHashMap<String, StubHandle>,
}

impl TemplateModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stub. A later declaration with the same name shadows the
    /// earlier one.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "template modules never declare u32::MAX types"
    )]
    pub fn declare(&mut self, stub: StubType) -> StubHandle {
        let handle = StubHandle(self.types.len() as u32);
        self.by_name.insert(stub.name.clone(), handle);
        self.types.push(stub);
        handle
    }

    pub fn handle(&self, name: &str) -> Option<StubHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&StubType> {
        self.handle(name).map(|h| self.stub(h))
    }

    /// # Panics
    ///
    /// Panics on a handle from another module.
    pub fn stub(&self, handle: StubHandle) -> &StubType {
        &self.types[handle.index()]
    }

    pub fn types(&self) -> &[StubType] {
        &self.types
    }

    /// Find the stub behind an instantiated type and the substitution from
    /// its generic parameters to the type's arguments.
    fn resolve_owner(&self, owner: &TypeRef) -> Result<(&StubType, Substitution), GenError> {
        match owner {
            TypeRef::Named { name, args } => {
                let stub = self
                    .get(name)
                    .ok_or_else(|| GenError::config(format!("type `{name}` is not declared")))?;
                if stub.generic_params.len() != args.len() {
                    return Err(GenError::config(format!(
                        "`{name}` takes {} type arguments, {} given",
                        stub.generic_params.len(),
                        args.len()
                    )));
                }
                let subst = stub
                    .generic_params
                    .iter()
                    .zip(args)
                    .map(|(p, a)| (p.name.clone(), a.clone()))
                    .collect();
                Ok((stub, subst))
            }
            TypeRef::Nested { outer, name } => {
                let (outer_stub, subst) = self.resolve_owner(outer)?;
                let nested = outer_stub
                    .nested_type(name)
                    .ok_or_else(|| GenError::missing(outer, name))?;
                Ok((nested, subst))
            }
            _ => Err(GenError::config(format!(
                "`{owner}` has no declaring stub type"
            ))),
        }
    }

    fn bind(
        owner: TypeRef,
        stub: &StubType,
        subst: &Substitution,
        name: &str,
        arity: usize,
    ) -> Result<MethodRef, GenError> {
        let m = stub
            .methods
            .iter()
            .find(|m| m.name == name && m.arity == arity)
            .ok_or_else(|| GenError::missing(&owner, name))?;
        Ok(MethodRef {
            owner,
            name: m.name.clone(),
            arity,
            has_this: m.has_this,
            is_virtual: m.is_virtual,
            ret: m.ret.substitute(subst),
        })
    }

    /// Resolve `name/arity` on an instantiated stub type (or a type nested
    /// in one).
    pub fn find_method(
        &self,
        owner: &TypeRef,
        name: &str,
        arity: usize,
    ) -> Result<MethodRef, GenError> {
        let (stub, subst) = self.resolve_owner(owner)?;
        Self::bind(owner.clone(), stub, &subst, name, arity)
    }

    /// Resolve `name/arity` on a generic parameter through the interface it
    /// is constrained to. The call is bound to the parameter itself.
    pub fn find_constrained(
        &self,
        param: &TypeRef,
        interface: &TypeRef,
        name: &str,
        arity: usize,
    ) -> Result<MethodRef, GenError> {
        let (stub, subst) = self.resolve_owner(interface)?;
        Self::bind(param.clone(), stub, &subst, name, arity)
    }

    /// The runtime library's stub types.
    pub fn standard() -> Self {
        let mut module = Self::new();
        for stub in standard_stubs() {
            module.declare(stub);
        }
        module
    }
}

// ── Standard stubs ──────────────────────────────────────────────────

fn ty(name: &str) -> TypeRef {
    TypeRef::param(name)
}

fn long() -> TypeRef {
    ScalarType::I64.into()
}

fn boolean() -> TypeRef {
    ScalarType::Bool.into()
}

/// `IRefEnumerable<TEnumerator, T>`.
pub fn ref_enumerable(enumerator: TypeRef, item: TypeRef) -> TypeRef {
    TypeRef::named(names::REF_ENUMERABLE_INTERFACE, vec![enumerator, item])
}

/// `IRefEnumerator<T>`.
pub fn ref_enumerator(item: TypeRef) -> TypeRef {
    TypeRef::named(names::REF_ENUMERATOR_INTERFACE, vec![item])
}

fn enumerator_methods(stub: StubType, item: &TypeRef) -> StubType {
    stub.method(StubMethod::instance(names::TRY_MOVE_NEXT, 0, boolean()))
        .method(StubMethod::instance(
            names::TRY_GET_NEXT,
            1,
            item.clone().by_ref(),
        ))
        .method(StubMethod::instance(
            names::GET_CURRENT,
            0,
            item.clone().by_ref(),
        ))
        .method(StubMethod::instance(names::DISPOSE, 0, TypeRef::Void))
}

/// `TEnumerable : unmanaged, IRefEnumerable<TEnumerator, T>` and
/// `TEnumerator : unmanaged, IRefEnumerator<T>` with the given names.
fn source_params(enumerable: &str, enumerator: &str, item: &str) -> [GenericParam; 2] {
    [
        GenericParam::unmanaged(enumerable).with_constraint(ref_enumerable(ty(enumerator), ty(item))),
        GenericParam::unmanaged(enumerator).with_constraint(ref_enumerator(ty(item))),
    ]
}

/// An enumerable stub whose element is its `T` parameter.
fn enumerable(
    name: &str,
    generic_params: Vec<GenericParam>,
    ctor_arity: usize,
    caps: SourceCaps,
) -> StubType {
    let mut stub = StubType::new(name, generic_params).with_caps(caps);
    let self_ty = stub.self_type();
    stub = stub
        .method(StubMethod::instance(names::CTOR, ctor_arity, TypeRef::Void))
        .method(StubMethod::instance(
            names::GET_ENUMERATOR,
            0,
            self_ty.nested(names::ENUMERATOR),
        ))
        .method(StubMethod::instance(names::LONG_COUNT, 0, long()));
    if caps.contains(SourceCaps::INDEX_ACCESS) {
        stub = stub.method(StubMethod::instance(names::GET_ITEM, 1, ty("T").by_ref()));
    }
    let enumerator = enumerator_methods(StubType::new(names::ENUMERATOR, Vec::new()), &ty("T"));
    stub.with_nested(enumerator)
}

fn strategy(name: &str, params: &[&str], ctor_arity: usize) -> StubType {
    StubType::new(
        name,
        params.iter().map(|p| GenericParam::unmanaged(*p)).collect(),
    )
    .method(StubMethod::instance(names::CTOR, ctor_arity, TypeRef::Void))
}

fn delegate(name: &str, params: &[&str], invoke_arity: usize, ret: TypeRef) -> StubType {
    StubType::new(name, params.iter().map(|p| GenericParam::new(*p)).collect())
        .method(StubMethod::invoke(invoke_arity, ret))
}

fn standard_stubs() -> Vec<StubType> {
    let t = || GenericParam::unmanaged("T");
    let [e, en] = source_params("TEnumerable", "TEnumerator", "T");

    vec![
        // Source wrappers.
        enumerable(names::ARRAY_ENUMERABLE, vec![t()], 1, SourceCaps::RANDOM_ACCESS),
        enumerable(names::NATIVE_ENUMERABLE, vec![t()], 1, SourceCaps::RANDOM_ACCESS),
        enumerable(names::REPEAT_ENUMERABLE, vec![t()], 2, SourceCaps::RANDOM_ACCESS),
        // Views.
        enumerable(
            names::WHERE_ENUMERABLE,
            vec![e.clone(), en.clone(), t(), GenericParam::unmanaged("TPredicate")],
            2,
            SourceCaps::empty(),
        ),
        {
            let [se, sen] = source_params("TEnumerable", "TEnumerator", "TPrev");
            enumerable(
                names::SELECT_ENUMERABLE,
                vec![
                    se,
                    sen,
                    GenericParam::unmanaged("TPrev"),
                    t(),
                    GenericParam::unmanaged("TAction"),
                ],
                2,
                SourceCaps::empty(),
            )
        },
        {
            let [fe, fen] = source_params("TFirstEnumerable", "TFirstEnumerator", "T");
            let [se, sen] = source_params("TSecondEnumerable", "TSecondEnumerator", "T");
            enumerable(
                names::CONCAT_ENUMERABLE,
                vec![fe, fen, se, sen, t()],
                2,
                SourceCaps::empty(),
            )
        },
        enumerable(
            names::DISTINCT_ENUMERABLE,
            vec![
                e.clone(),
                en.clone(),
                t(),
                GenericParam::unmanaged("TEqualityComparer"),
            ],
            2,
            SourceCaps::empty(),
        ),
        enumerable(
            names::MIN_MAX_BY_ENUMERABLE,
            vec![
                e,
                en,
                t(),
                GenericParam::unmanaged("TKey"),
                GenericParam::unmanaged("TKeySelector"),
            ],
            4,
            SourceCaps::empty(),
        ),
        // Struct strategies.
        strategy(names::DELEGATE_FUNC_TO_STRUCT_OPERATOR_FUNC, &["T", "TResult"], 1),
        strategy(names::DELEGATE_FUNC_TO_ACTION, &["T", "TResult"], 1),
        strategy(names::DELEGATE_REF_FUNC_TO_STRUCT_OPERATOR_FUNC, &["T", "TResult"], 1),
        StubType::new(names::DEFAULT_EQUALITY_COMPARER, vec![t()]),
        // Delegates.
        delegate(names::FUNC, &["T", "TResult"], 1, ty("TResult")),
        delegate(names::REF_FUNC, &["T", "TResult"], 1, ty("TResult")),
        delegate(names::REF_ACTION, &["T0", "T1"], 2, TypeRef::Void),
        // Protocol interfaces.
        StubType::new(
            names::REF_ENUMERABLE_INTERFACE,
            vec![GenericParam::new("TEnumerator"), GenericParam::new("T")],
        )
        .method(StubMethod::instance(names::GET_ENUMERATOR, 0, ty("TEnumerator")))
        .method(StubMethod::instance(names::LONG_COUNT, 0, long())),
        enumerator_methods(
            StubType::new(names::REF_ENUMERATOR_INTERFACE, vec![GenericParam::new("T")]),
            &ty("T"),
        ),
        StubType::new(names::EQUATABLE, vec![GenericParam::new("T")]),
        StubType::new(names::ALLOCATOR, Vec::new()),
    ]
}

// ── Generated output ────────────────────────────────────────────────

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        /// Callable with method syntax on its first parameter.
        const EXTENSION = 1 << 2;
        const AGGRESSIVE_INLINING = 1 << 3;
    }
}

impl MethodFlags {
    /// What every generated operator carries.
    pub const OPERATOR: Self = Self::PUBLIC
        .union(Self::STATIC)
        .union(Self::EXTENSION)
        .union(Self::AGGRESSIVE_INLINING);
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodParam {
    pub name: String,
    pub ty: TypeRef,
    pub mode: ParamMode,
    pub default: Option<Const>,
}

/// One synthesized operator method. Built once, then only read.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedMethod {
    pub name: String,
    /// Source names this method was specialized for, in operand order.
    pub sources: Vec<String>,
    pub generics: Vec<GenericParam>,
    pub params: Vec<MethodParam>,
    pub return_type: TypeRef,
    pub flags: MethodFlags,
    /// The builder IR the body was lowered from.
    pub function: SeqFunction,
    pub body: MethodBody,
}

impl GeneratedMethod {
    pub fn new(
        sources: Vec<String>,
        generics: Vec<GenericParam>,
        function: SeqFunction,
        body: MethodBody,
    ) -> Self {
        let params = function
            .params()
            .filter_map(|v| match &v.kind {
                VarKind::Param {
                    name,
                    mode,
                    default,
                    ..
                } => Some(MethodParam {
                    name: name.clone(),
                    ty: v.ty.clone(),
                    mode: *mode,
                    default: *default,
                }),
                VarKind::Local => None,
            })
            .collect();
        Self {
            name: function.name.clone(),
            sources,
            generics,
            params,
            return_type: function.return_type.clone(),
            flags: MethodFlags::OPERATOR,
            function,
            body,
        }
    }

    pub fn param(&self, name: &str) -> Option<&MethodParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn is_for(&self, sources: &[&str]) -> bool {
        self.sources.len() == sources.len() && self.sources.iter().zip(sources).all(|(a, b)| a == b)
    }
}

impl fmt::Display for GeneratedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.contains(MethodFlags::AGGRESSIVE_INLINING) {
            f.write_str("[AggressiveInlining] ")?;
        }
        if self.flags.contains(MethodFlags::PUBLIC) {
            f.write_str("public ")?;
        }
        if self.flags.contains(MethodFlags::STATIC) {
            f.write_str("static ")?;
        }
        write!(f, "{} {}", self.return_type, self.name)?;
        if !self.generics.is_empty() {
            f.write_str("<")?;
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&g.name)?;
            }
            f.write_str(">")?;
        }
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            } else if self.flags.contains(MethodFlags::EXTENSION) {
                f.write_str("this ")?;
            }
            if let Some(kw) = p.mode.keyword() {
                write!(f, "{kw} ")?;
            }
            write!(f, "{} {}", p.ty, p.name)?;
            if let Some(d) = p.default {
                write!(f, " = {}", const_text(d))?;
            }
        }
        f.write_str(")")?;
        for g in self.generics.iter().filter(|g| g.unmanaged || !g.constraints.is_empty()) {
            write!(f, " where {g}")?;
        }
        Ok(())
    }
}

fn const_text(c: Const) -> String {
    match c {
        Const::Bool(b) => b.to_string(),
        Const::I32(v) => v.to_string(),
        Const::I64(v) => format!("{v}L"),
        Const::F32(v) => format!("{v}f"),
        Const::F64(v) => v.to_string(),
        Const::Null => "null".to_owned(),
    }
}

/// Uniquely named container of generated methods for one operator unit.
///
/// Append-only: a pushed method is never replaced or mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct HolderType {
    name: String,
    operator: String,
    methods: Vec<GeneratedMethod>,
}

impl HolderType {
    pub fn new(name: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: operator.into(),
            methods: Vec::new(),
        }
    }

    pub fn push(&mut self, method: GeneratedMethod) {
        tracing::debug!(holder = %self.name, method = %method, "generated method");
        self.methods.push(method);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration key of the generator that filled this holder.
    #[inline]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    #[inline]
    pub fn methods(&self) -> &[GeneratedMethod] {
        &self.methods
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// The method specialized for exactly these sources.
    pub fn method_for(&self, sources: &[&str]) -> Option<&GeneratedMethod> {
        self.methods.iter().find(|m| m.is_for(sources))
    }
}

/// The template plus every holder a run produced.
#[derive(Clone, Debug)]
pub struct ExtendedModule {
    template: TemplateModule,
    holders: Vec<HolderType>,
}

impl ExtendedModule {
    pub fn new(template: TemplateModule) -> Self {
        Self {
            template,
            holders: Vec::new(),
        }
    }

    /// Attach a holder. Holder names are unique per module.
    pub fn push_holder(&mut self, holder: HolderType) -> Result<(), GenError> {
        if self.holder(holder.name()).is_some() || self.template.get(holder.name()).is_some() {
            return Err(GenError::config(format!(
                "duplicate holder type `{}`",
                holder.name()
            )));
        }
        self.holders.push(holder);
        Ok(())
    }

    pub fn template(&self) -> &TemplateModule {
        &self.template
    }

    pub fn holders(&self) -> &[HolderType] {
        &self.holders
    }

    pub fn holder(&self, name: &str) -> Option<&HolderType> {
        self.holders.iter().find(|h| h.name() == name)
    }

    pub fn method_count(&self) -> usize {
        self.holders.iter().map(HolderType::len).sum()
    }
}

impl fmt::Display for ExtendedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for holder in &self.holders {
            writeln!(f, "static class {} // {}", holder.name(), holder.operator())?;
            for m in holder.methods() {
                writeln!(f, "    {m}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
