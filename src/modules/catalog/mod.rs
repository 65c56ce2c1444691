//! Book catalog: books, their types and genres.

pub mod error;
pub mod models;
mod openapi;
mod routes;
pub mod service;
pub mod store;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};

use service::CatalogService;
use store::SQLITE_SCHEMA;

/// Lookup values offered to a fresh installation.
pub const DEFAULT_TYPES: &[&str] = &["Hardcover", "Paperback", "Ebook"];
pub const DEFAULT_GENRES: &[&str] = &["Fiction", "Non-fiction", "Mystery", "Fantasy", "Sci-Fi"];

pub struct CatalogModule {
    service: Arc<CatalogService>,
}

impl CatalogModule {
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<CatalogService> {
        &self.service
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.service
            .ping()
            .await
            .context("catalog store is not reachable")?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: SQLITE_SCHEMA,
        }]
    }

    async fn health(&self) -> anyhow::Result<()> {
        self.service.ping().await?;
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}
