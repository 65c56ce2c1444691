use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use super::{check_fields, check_name, CatalogStore, StoreError, StoreResult};
use crate::modules::catalog::error::{FieldViolation, ViolationReason};
use crate::modules::catalog::models::{Book, BookFields, BookType, Genre};

const BOOK_COLUMNS: &str = "id, title, author, type_id, genre_id, publication, pages, price, \
                            cover_photo, is_active, created_at, updated_at";

/// Schema applied by the catalog module's `001_init` migration.
pub const SQLITE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS book_types (
        id         TEXT PRIMARY KEY NOT NULL,
        type_name  TEXT NOT NULL CHECK (length(trim(type_name)) > 0),
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS genres (
        id         TEXT PRIMARY KEY NOT NULL,
        genre_name TEXT NOT NULL CHECK (length(trim(genre_name)) > 0),
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS books (
        id          TEXT PRIMARY KEY NOT NULL,
        title       TEXT NOT NULL CHECK (length(trim(title)) > 0),
        author      TEXT NOT NULL CHECK (length(trim(author)) > 0),
        type_id     TEXT NOT NULL REFERENCES book_types (id),
        genre_id    TEXT NOT NULL REFERENCES genres (id),
        publication TEXT NOT NULL DEFAULT '',
        pages       INTEGER NOT NULL CHECK (pages >= 1),
        price       REAL NOT NULL CHECK (price >= 1),
        cover_photo TEXT NOT NULL CHECK (length(trim(cover_photo)) > 0),
        is_active   INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS books_is_active_idx ON books (is_active);
"#;

/// Catalog store backed by a SQLite pool. Expects the catalog migrations to have run.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn timestamp(at: OffsetDateTime) -> StoreResult<String> {
    at.format(&Rfc3339)
        .map_err(|e| StoreError::Corrupt(format!("unformattable timestamp: {e}")))
}

fn parse_uuid(row: &SqliteRow, column: &str) -> StoreResult<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| StoreError::Corrupt(format!("{column} '{raw}': {e}")))
}

fn parse_time(row: &SqliteRow, column: &str) -> StoreResult<OffsetDateTime> {
    let raw: String = row.try_get(column)?;
    OffsetDateTime::parse(&raw, &Rfc3339)
        .map_err(|e| StoreError::Corrupt(format!("{column} '{raw}': {e}")))
}

fn book_from_row(row: &SqliteRow) -> StoreResult<Book> {
    Ok(Book {
        id: parse_uuid(row, "id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        type_id: parse_uuid(row, "type_id")?,
        genre_id: parse_uuid(row, "genre_id")?,
        publication: row.try_get("publication")?,
        pages: row.try_get("pages")?,
        price: row.try_get("price")?,
        cover_photo: row.try_get("cover_photo")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_time(row, "created_at")?,
        updated_at: parse_time(row, "updated_at")?,
    })
}

fn type_from_row(row: &SqliteRow) -> StoreResult<BookType> {
    Ok(BookType {
        id: parse_uuid(row, "id")?,
        type_name: row.try_get("type_name")?,
        created_at: parse_time(row, "created_at")?,
    })
}

fn genre_from_row(row: &SqliteRow) -> StoreResult<Genre> {
    Ok(Genre {
        id: parse_uuid(row, "id")?,
        genre_name: row.try_get("genre_name")?,
        created_at: parse_time(row, "created_at")?,
    })
}

/// Constraint failures are the caller's fault; everything else means the store is unwell.
fn write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(
            db_err.kind(),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation | ErrorKind::ForeignKeyViolation
        ) {
            tracing::warn!(error = %db_err, "write refused by database constraint");
            return StoreError::Rejected(vec![FieldViolation::new(
                "record",
                ViolationReason::Constraint,
            )]);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_book(&self, fields: BookFields) -> StoreResult<Book> {
        check_fields(&fields)?;
        let book = Book::new(fields, OffsetDateTime::now_utc());
        let created_at = timestamp(book.created_at)?;

        sqlx::query(&format!(
            "INSERT INTO books ({BOOK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.type_id.to_string())
        .bind(book.genre_id.to_string())
        .bind(&book.publication)
        .bind(book.pages)
        .bind(book.price)
        .bind(&book.cover_photo)
        .bind(book.is_active)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(book)
    }

    async fn get_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(book_from_row).transpose()
    }

    async fn list_active_books(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE is_active = 1 ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn update_book(&self, id: Uuid, fields: BookFields) -> StoreResult<Option<Book>> {
        check_fields(&fields)?;
        let updated_at = timestamp(OffsetDateTime::now_utc())?;

        let row = sqlx::query(&format!(
            "UPDATE books SET title = ?, author = ?, type_id = ?, genre_id = ?, publication = ?, \
             pages = ?, price = ?, cover_photo = ?, updated_at = ? \
             WHERE id = ? RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(fields.type_id.to_string())
        .bind(fields.genre_id.to_string())
        .bind(&fields.publication)
        .bind(fields.pages)
        .bind(fields.price)
        .bind(&fields.cover_photo)
        .bind(&updated_at)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn set_book_active(&self, id: Uuid, active: bool) -> StoreResult<Option<Book>> {
        let updated_at = timestamp(OffsetDateTime::now_utc())?;

        // Only touch updated_at when the flag actually flips.
        let row = sqlx::query(&format!(
            "UPDATE books SET updated_at = CASE WHEN is_active = ? THEN updated_at ELSE ? END, \
             is_active = ? WHERE id = ? RETURNING {BOOK_COLUMNS}"
        ))
        .bind(active)
        .bind(&updated_at)
        .bind(active)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn create_type(&self, type_name: String) -> StoreResult<BookType> {
        check_name("type_name", &type_name)?;
        let book_type = BookType {
            id: Uuid::now_v7(),
            type_name,
            created_at: OffsetDateTime::now_utc(),
        };

        sqlx::query("INSERT INTO book_types (id, type_name, created_at) VALUES (?, ?, ?)")
            .bind(book_type.id.to_string())
            .bind(&book_type.type_name)
            .bind(timestamp(book_type.created_at)?)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        Ok(book_type)
    }

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<BookType>> {
        let row = sqlx::query("SELECT id, type_name, created_at FROM book_types WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(type_from_row).transpose()
    }

    async fn list_types(&self) -> StoreResult<Vec<BookType>> {
        let rows = sqlx::query("SELECT id, type_name, created_at FROM book_types ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(type_from_row).collect()
    }

    async fn create_genre(&self, genre_name: String) -> StoreResult<Genre> {
        check_name("genre_name", &genre_name)?;
        let genre = Genre {
            id: Uuid::now_v7(),
            genre_name,
            created_at: OffsetDateTime::now_utc(),
        };

        sqlx::query("INSERT INTO genres (id, genre_name, created_at) VALUES (?, ?, ?)")
            .bind(genre.id.to_string())
            .bind(&genre.genre_name)
            .bind(timestamp(genre.created_at)?)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        Ok(genre)
    }

    async fn get_genre(&self, id: Uuid) -> StoreResult<Option<Genre>> {
        let row = sqlx::query("SELECT id, genre_name, created_at FROM genres WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(genre_from_row).transpose()
    }

    async fn list_genres(&self) -> StoreResult<Vec<Genre>> {
        let rows = sqlx::query("SELECT id, genre_name, created_at FROM genres ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(genre_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;
    use bookshelf_kernel::settings::{DatabaseSettings, StorageBackend};
    use bookshelf_kernel::Migration;

    async fn store() -> SqliteStore {
        let settings = DatabaseSettings {
            backend: StorageBackend::Sqlite,
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };
        let pool = bookshelf_db::connect(&settings).await.unwrap();
        bookshelf_db::migrate(
            &pool,
            &[(
                "catalog".to_string(),
                Migration {
                    id: "001_init",
                    up: SQLITE_SCHEMA,
                },
            )],
        )
        .await
        .unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        contract::create_then_get_round_trips(&store().await).await;
    }

    #[tokio::test]
    async fn unknown_ids_are_none() {
        contract::unknown_ids_are_none(&store().await).await;
    }

    #[tokio::test]
    async fn update_replaces_mutable_fields() {
        contract::update_replaces_mutable_fields(&store().await).await;
    }

    #[tokio::test]
    async fn inactive_books_are_hidden_from_listing() {
        contract::inactive_books_are_hidden_from_listing(&store().await).await;
    }

    #[tokio::test]
    async fn invalid_records_are_rejected() {
        contract::invalid_records_are_rejected(&store().await).await;
    }

    #[tokio::test]
    async fn lookups_list_all_records() {
        contract::lookups_list_all_records(&store().await).await;
    }

    #[tokio::test]
    async fn dangling_reference_is_refused_by_foreign_key() {
        let store = store().await;
        let fields = contract::fields(Uuid::now_v7(), Uuid::now_v7());

        match store.create_book(fields).await {
            Err(StoreError::Rejected(violations)) => {
                assert_eq!(violations[0].reason, ViolationReason::Constraint);
            }
            other => panic!("expected constraint rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deactivating_twice_keeps_first_timestamp() {
        let store = store().await;
        let book_type = store.create_type("Ebook".to_string()).await.unwrap();
        let genre = store.create_genre("Sci-Fi".to_string()).await.unwrap();
        let book = store
            .create_book(contract::fields(book_type.id, genre.id))
            .await
            .unwrap();

        let first = store.set_book_active(book.id, false).await.unwrap().unwrap();
        let second = store.set_book_active(book.id, false).await.unwrap().unwrap();
        assert!(!second.is_active);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn closed_pool_is_a_database_error() {
        let store = store().await;
        store.pool.close().await;
        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
    }
}
