//! Source classification.
//!
//! Maps a configured source name to its [`SourceKind`] and, for one method
//! being generated, to the concrete types that method is written against.
//! Every declared source is classified once, when the registry is built.

use rustc_hash::FxHashMap;
use unl_ir::{GenericParam, ParamMode, Substitution, TypeRef};
use unl_protocol::{names, SourceCaps};

use crate::config::GenConfig;
use crate::error::GenError;
use crate::module::{StubHandle, TemplateModule};

/// The three shapes a source can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Managed array `T[]`, adapted through `ArrayEnumerable<T>`.
    Contiguous,
    /// Caller-owned `NativeArray<T>`, adapted through `NativeEnumerable<T>`.
    ExternalBuffer,
    /// Any stub struct implementing the protocol, taken `in`.
    Generic(StubHandle),
}

impl SourceKind {
    #[inline]
    pub fn is_special(self) -> bool {
        !matches!(self, Self::Generic(_))
    }
}

/// A source as seen by one generated method.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSource {
    pub name: String,
    pub kind: SourceKind,
    /// Type of the method's source parameter.
    pub base: TypeRef,
    /// Protocol-implementing type the method iterates: the wrapper for
    /// special sources, `base` itself otherwise.
    pub enumerable: TypeRef,
    pub enumerator: TypeRef,
    /// Generic parameters the source adds to the method.
    pub generics: Vec<GenericParam>,
    pub caps: SourceCaps,
}

impl ResolvedSource {
    /// Generic sources are large structs and are passed by readonly
    /// reference.
    pub fn param_mode(&self) -> ParamMode {
        match self.kind {
            SourceKind::Generic(_) => ParamMode::In,
            SourceKind::Contiguous | SourceKind::ExternalBuffer => ParamMode::Value,
        }
    }

    /// Element count and `get_Item` are available without a scan.
    #[inline]
    pub fn supports_reverse_scan(&self) -> bool {
        self.caps.supports_reverse_scan()
    }
}

/// Classification of one declared source. Failures are kept so they can be
/// attributed to the operator that asks for the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Classified {
    Kind(SourceKind),
    UnsupportedShape,
    NotInTemplate,
}

pub struct SourceRegistry<'t> {
    template: &'t TemplateModule,
    kinds: FxHashMap<String, Classified>,
}

impl<'t> SourceRegistry<'t> {
    pub fn new(config: &GenConfig, template: &'t TemplateModule) -> Self {
        let kinds = config
            .sources
            .iter()
            .map(|s| {
                let classified = classify_decl(template, &s.name, s.special);
                tracing::trace!(source = %s.name, ?classified, "classified source");
                (s.name.clone(), classified)
            })
            .collect();
        Self { template, kinds }
    }

    /// Kind of `name`, for error reporting attributed to `operator`.
    pub fn classify(&self, operator: &str, name: &str) -> Result<SourceKind, GenError> {
        match self.kinds.get(name) {
            Some(Classified::Kind(kind)) => Ok(*kind),
            Some(Classified::UnsupportedShape) => Err(GenError::unsupported(operator, name)),
            Some(Classified::NotInTemplate) => Err(GenError::config(format!(
                "source `{name}` is not a template type"
            ))),
            None => Err(GenError::config(format!("source `{name}` is not declared"))),
        }
    }

    /// Concrete types for `name` with its element bound to `element`.
    ///
    /// Stub parameters other than `T` become method generics named
    /// `<param><suffix>`, so the two operands of a binary operator never
    /// collide.
    pub fn resolve(
        &self,
        operator: &str,
        name: &str,
        element: &TypeRef,
        suffix: &str,
    ) -> Result<ResolvedSource, GenError> {
        let kind = self.classify(operator, name)?;
        let special = |base: TypeRef, wrapper: &str| -> Result<ResolvedSource, GenError> {
            let stub = self.template.get(wrapper).ok_or_else(|| {
                GenError::config(format!("wrapper type `{wrapper}` is not declared"))
            })?;
            let enumerable = TypeRef::named(wrapper, vec![element.clone()]);
            Ok(ResolvedSource {
                name: name.to_owned(),
                kind,
                base,
                enumerator: enumerable.clone().nested(names::ENUMERATOR),
                enumerable,
                generics: Vec::new(),
                caps: stub.caps,
            })
        };
        match kind {
            SourceKind::Contiguous => special(TypeRef::array(element.clone()), names::ARRAY_ENUMERABLE),
            SourceKind::ExternalBuffer => special(
                TypeRef::named(names::NATIVE_ARRAY, vec![element.clone()]),
                names::NATIVE_ENUMERABLE,
            ),
            SourceKind::Generic(handle) => {
                let stub = self.template.stub(handle);
                if stub.enumerator().is_none() {
                    return Err(GenError::missing(&stub.name, names::ENUMERATOR));
                }
                let mut subst = Substitution::default();
                for p in &stub.generic_params {
                    let arg = if p.name == "T" {
                        element.clone()
                    } else {
                        TypeRef::param(format!("{}{suffix}", p.name))
                    };
                    subst.insert(p.name.clone(), arg);
                }
                let generics = stub
                    .generic_params
                    .iter()
                    .filter(|p| p.name != "T")
                    .map(|p| p.substitute(format!("{}{suffix}", p.name), &subst))
                    .collect();
                let base = stub.self_type().substitute(&subst);
                Ok(ResolvedSource {
                    name: name.to_owned(),
                    kind,
                    enumerator: base.clone().nested(names::ENUMERATOR),
                    enumerable: base.clone(),
                    base,
                    generics,
                    caps: stub.caps,
                })
            }
        }
    }
}

fn classify_decl(template: &TemplateModule, name: &str, special: bool) -> Classified {
    if special {
        match name {
            names::ARRAY_SOURCE => Classified::Kind(SourceKind::Contiguous),
            names::NATIVE_ARRAY_SOURCE => Classified::Kind(SourceKind::ExternalBuffer),
            _ => Classified::UnsupportedShape,
        }
    } else {
        template
            .handle(name)
            .map_or(Classified::NotInTemplate, |h| {
                Classified::Kind(SourceKind::Generic(h))
            })
    }
}
