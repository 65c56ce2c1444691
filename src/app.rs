//! Wiring shared by the server binary and the CLI.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::settings::{Settings, StorageBackend};
use bookshelf_kernel::{InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules::catalog::service::CatalogService;
use crate::modules::catalog::store::{CatalogStore, MemoryStore, SqliteStore};
use crate::modules::catalog::CatalogModule;

/// A fully initialized application: modules registered, schema current.
pub struct App {
    pub registry: ModuleRegistry,
    pub catalog: Arc<CatalogService>,
    /// Migrations applied during bootstrap; always zero for the memory backend.
    pub migrations_applied: usize,
    pool: Option<SqlitePool>,
}

impl App {
    pub async fn bootstrap(settings: &Settings) -> anyhow::Result<Self> {
        let (store, pool): (Arc<dyn CatalogStore>, Option<SqlitePool>) =
            match settings.database.backend {
                StorageBackend::Memory => {
                    tracing::warn!("using in-memory catalog store; data is lost on exit");
                    (Arc::new(MemoryStore::new()), None)
                }
                StorageBackend::Sqlite => {
                    let pool = bookshelf_db::connect(&settings.database).await?;
                    (Arc::new(SqliteStore::new(pool.clone())), Some(pool))
                }
            };

        let catalog = Arc::new(CatalogService::new(store));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(CatalogModule::new(catalog.clone())))?;

        let migrations_applied = match &pool {
            Some(pool) => {
                let migrations = registry.collect_migrations()?;
                bookshelf_db::migrate(pool, &migrations)
                    .await
                    .context("failed to migrate catalog database")?
            }
            None => 0,
        };

        registry.init_all(&InitCtx { settings }).await?;

        tracing::info!(
            env = ?settings.environment,
            backend = ?settings.database.backend,
            modules = registry.len(),
            migrations_applied,
            "bootstrap complete"
        );

        Ok(Self {
            registry,
            catalog,
            migrations_applied,
            pool,
        })
    }

    /// Stop modules in reverse order, then release the database.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.registry.stop_all().await?;
        if let Some(pool) = self.pool {
            pool.close().await;
        }
        Ok(())
    }
}
