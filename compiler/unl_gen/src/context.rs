//! Per-run generation context.

use crate::config::GenConfig;
use crate::error::GenError;
use crate::matrix::EnablementMatrix;
use crate::module::TemplateModule;
use crate::registry::SourceRegistry;

/// Everything a generator may read. Built once per run and never mutated
/// afterwards.
pub struct GenContext<'t> {
    template: &'t TemplateModule,
    registry: SourceRegistry<'t>,
    matrix: EnablementMatrix,
}

impl<'t> GenContext<'t> {
    pub fn new(config: &GenConfig, template: &'t TemplateModule) -> Result<Self, GenError> {
        Ok(Self {
            template,
            registry: SourceRegistry::new(config, template),
            matrix: EnablementMatrix::from_config(config)?,
        })
    }

    #[inline]
    pub fn template(&self) -> &'t TemplateModule {
        self.template
    }

    #[inline]
    pub fn registry(&self) -> &SourceRegistry<'t> {
        &self.registry
    }

    #[inline]
    pub fn matrix(&self) -> &EnablementMatrix {
        &self.matrix
    }
}
