//! Emission driver.
//!
//! Runs every generator once against one [`GenContext`], in order, and
//! attaches the holders they produce to the extended module. Generator
//! order only decides holder order.

use crate::context::GenContext;
use crate::error::GenError;
use crate::generators::{standard_generators, OperatorGenerator};
use crate::module::ExtendedModule;

pub struct Emitter {
    generators: Vec<Box<dyn OperatorGenerator>>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::standard()
    }
}

impl Emitter {
    pub fn new(generators: Vec<Box<dyn OperatorGenerator>>) -> Self {
        Self { generators }
    }

    /// Every generator the runtime library ships.
    pub fn standard() -> Self {
        Self::new(standard_generators())
    }

    pub fn generators(&self) -> impl Iterator<Item = &dyn OperatorGenerator> {
        self.generators.iter().map(|g| &**g)
    }

    /// Run all generators and collect their holders.
    ///
    /// The first failing unit aborts the run; nothing partial is returned.
    pub fn run(&self, cx: &GenContext<'_>) -> Result<ExtendedModule, GenError> {
        let mut module = ExtendedModule::new(cx.template().clone());
        for generator in &self.generators {
            let spec = generator.spec();
            let _span = tracing::debug_span!("generate", operator = spec.name, holder = %spec.holder)
                .entered();
            let holder = generator.generate(cx).map_err(|e| {
                tracing::error!(error = %e, "operator unit aborted");
                e
            })?;
            match holder {
                Some(holder) => {
                    tracing::debug!(methods = holder.len(), "holder emitted");
                    module.push_holder(holder)?;
                }
                None => tracing::trace!("nothing enabled"),
            }
        }
        tracing::info!(
            holders = module.holders().len(),
            methods = module.method_count(),
            "generation complete"
        );
        Ok(module)
    }
}
