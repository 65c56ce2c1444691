use anyhow::Context;
use bookshelf::App;
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "bookshelf starting"
    );

    let app = App::bootstrap(&settings).await?;
    let served = bookshelf_http::start_server(&app.registry, &settings).await;
    app.shutdown().await?;

    served
}
