//! Ahead-of-time synthesis of specialized sequence operators.
//!
//! Given a [`TemplateModule`] of stub types and a [`GenConfig`], the
//! [`Emitter`] walks every enabled (operator × source [× source] × element
//! type) combination and writes one specialized method per combination,
//! directly against the iteration protocol. Methods are grouped into
//! uniquely named [`HolderType`]s on an [`ExtendedModule`].
//!
//! # Pipeline
//!
//! 1. [`GenContext::new`] validates the configuration into an
//!    [`EnablementMatrix`] and sets up the [`SourceRegistry`].
//! 2. Each [`OperatorGenerator`] classifies its candidate sources and picks
//!    a lowering strategy per [`SourceKind`].
//! 3. Bodies are written through `unl_ir`'s builder and lowered by its one
//!    shared pass.
//! 4. The [`Emitter`] attaches the holders and returns the module.
//!
//! # Tracing
//!
//! Call [`init_tracing`] once, then run with
//! `RUST_LOG=unl_gen=debug` (per holder and method) or
//! `RUST_LOG=unl_gen=trace,unl_ir=trace` (per classification and lowering).

mod config;
mod context;
mod descriptor;
mod driver;
mod error;
pub mod generators;
mod matrix;
mod module;
mod registry;

use std::sync::Once;

pub use config::{GenConfig, OperatorConfig, SourceDecl};
pub use context::GenContext;
pub use descriptor::{op, AveragePolicy, Arity, KindSet, NumericType, OperatorSpec, OPEN_GENERIC};
pub use driver::Emitter;
pub use error::GenError;
pub use generators::OperatorGenerator;
pub use matrix::EnablementMatrix;
pub use module::{
    ref_enumerable, ref_enumerator, ExtendedModule, GeneratedMethod, HolderType, MethodFlags,
    MethodParam, StubHandle, StubMethod, StubType, TemplateModule,
};
pub use registry::{ResolvedSource, SourceKind, SourceRegistry};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=unl_gen=debug` or `RUST_LOG=unl_gen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Run the standard generators once.
pub fn generate(config: &GenConfig, template: &TemplateModule) -> Result<ExtendedModule, GenError> {
    let cx = GenContext::new(config, template)?;
    Emitter::standard().run(&cx)
}
