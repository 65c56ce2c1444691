//! HTTP server facade for Bookshelf with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{extract::State, routing::get, Router};

use bookshelf_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

const WELCOME: &str = "Welcome to the Book Management API!";

/// Bind, serve until Ctrl-C/SIGTERM, then return so the caller can stop modules
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let address = settings.server.bind_address();
    tracing::info!("starting HTTP server on {}", address);

    let app = build_router(registry, settings).context("failed to build HTTP router")?;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the application router with every module mounted and middleware applied
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<Router> {
    let mut router_builder = RouterBuilder::new()
        .route("/", get(welcome))
        .route(
            "/healthz",
            get(health_check).with_state(registry.clone()),
        );

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    let router = router_builder
        .with_openapi(registry)
        .with_fallback()
        .with_tracing()
        .with_cors(&settings.server.cors_origins)?
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build();

    Ok(router)
}

async fn welcome() -> &'static str {
    WELCOME
}

/// Aggregated readiness of all modules
async fn health_check(State(registry): State<ModuleRegistry>) -> Result<&'static str, AppError> {
    registry
        .check_health()
        .await
        .map_err(|err| AppError::unavailable(format!("{err:#}")))?;
    Ok("ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use bookshelf_kernel::Module;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Offline;

    #[async_trait::async_trait]
    impl Module for Offline {
        fn name(&self) -> &'static str {
            "offline"
        }

        async fn health(&self) -> anyhow::Result<()> {
            anyhow::bail!("store unreachable")
        }
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_returns_welcome_banner() {
        let router = build_router(&ModuleRegistry::new(), &Settings::default()).unwrap();
        let (status, body) = fetch(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WELCOME);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let router = build_router(&ModuleRegistry::new(), &Settings::default()).unwrap();
        let (status, body) = fetch(router, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("endpoint not found"));
    }

    #[tokio::test]
    async fn healthz_reports_unhealthy_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Offline)).unwrap();

        let router = build_router(&registry, &Settings::default()).unwrap();
        let (status, body) = fetch(router, "/healthz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("store unreachable"));
    }
}
