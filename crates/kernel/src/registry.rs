use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context};

use crate::module::{InitCtx, Migration, Module};

/// Ordered set of modules making up the application
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Names must be unique since they double as mount points.
    pub fn register(&mut self, module: Arc<dyn Module>) -> anyhow::Result<()> {
        if self.get(module.name()).is_some() {
            bail!("module '{}' is already registered", module.name());
        }
        tracing::debug!(module = module.name(), "module registered");
        self.modules.push(module);
        Ok(())
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initialize modules in registration order
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Run every module's health probe, returning the first failure
    pub async fn check_health(&self) -> anyhow::Result<()> {
        for module in &self.modules {
            module
                .health()
                .await
                .with_context(|| format!("module '{}' is unhealthy", module.name()))?;
        }
        Ok(())
    }

    /// Collect `(module, migration)` pairs sorted by module name then migration id
    pub fn collect_migrations(&self) -> anyhow::Result<Vec<(String, Migration)>> {
        let mut seen = HashSet::new();
        let mut migrations = Vec::new();

        for module in &self.modules {
            for migration in module.migrations() {
                if !seen.insert((module.name(), migration.id)) {
                    bail!(
                        "module '{}' declares migration '{}' twice",
                        module.name(),
                        migration.id
                    );
                }
                migrations.push((module.name().to_string(), migration));
            }
        }

        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        Ok(migrations)
    }
}
