//! Operational entrypoint: apply migrations, seed lookups, inspect settings.

use anyhow::Context;
use bookshelf::modules::catalog::{DEFAULT_GENRES, DEFAULT_TYPES};
use bookshelf::App;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(about = "Operational commands for the Bookshelf catalog")]
#[command(version)]
struct Cli {
    /// Override `database.url` from the layered settings
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and exit
    Migrate,

    /// Insert the default book types and genres that are missing
    Seed,

    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load bookshelf settings")?;
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }

    match cli.command {
        Commands::Config => {
            let rendered =
                serde_json::to_string_pretty(&settings).context("failed to render settings")?;
            println!("{rendered}");
        }
        Commands::Migrate => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            let app = App::bootstrap(&settings).await?;
            println!("applied {} migration(s)", app.migrations_applied);
            app.shutdown().await?;
        }
        Commands::Seed => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            let app = App::bootstrap(&settings).await?;
            let report = app
                .catalog
                .seed_lookups(DEFAULT_TYPES, DEFAULT_GENRES)
                .await
                .context("failed to seed lookup values")?;
            tracing::info!(
                types_added = report.types_added,
                genres_added = report.genres_added,
                "seed complete"
            );
            println!(
                "added {} type(s) and {} genre(s)",
                report.types_added, report.genres_added
            );
            app.shutdown().await?;
        }
    }

    Ok(())
}
