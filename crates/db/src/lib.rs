//! SQLite connection factory and the forward-only migration runner used by
//! module-contributed schemas.

use std::str::FromStr;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        PRIMARY KEY (module, id)
    );
"#;

/// Open a pool for the configured SQLite url, creating the file when missing.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.url))?;

    tracing::info!(
        target: "bookshelf-db",
        url = %settings.url,
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply every migration not yet recorded in `_migrations`. Returns how many ran.
///
/// Each migration runs in its own transaction together with its bookkeeping row.
pub async fn migrate(pool: &SqlitePool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let already: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                .bind(module.as_str())
                .bind(migration.id)
                .fetch_optional(pool)
                .await
                .context("failed to read migration history")?;

        if already.is_some() {
            tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;

        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module.as_str())
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .context("failed to record migration")?;

        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
