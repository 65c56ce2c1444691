use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Context handed to modules while the application boots
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// Forward-only schema change contributed by a module.
///
/// `up` may hold several statements; ids are unique per module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A unit of functionality mounted into the Bookshelf server
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the mount point `/api/{name}`
    fn name(&self) -> &'static str;

    /// Called once after migrations have been applied
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes for this module, already bound to their state
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` + `components.schemas`) merged into the served document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema migrations, applied in the order returned
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Readiness probe used by `/healthz`
    async fn health(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources during shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
