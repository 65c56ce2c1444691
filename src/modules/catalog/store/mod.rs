//! Persistence for books, types and genres.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SQLITE_SCHEMA};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::error::FieldViolation;
use super::models::{Book, BookFields, BookType, Genre};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record broke a storage constraint and was not written.
    #[error("record rejected by store ({} violations)", .0.len())]
    Rejected(Vec<FieldViolation>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded back into a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract behind the catalog service.
///
/// Lookups return `Ok(None)` for unknown ids; mutations of unknown ids do the
/// same and write nothing. There is no hard delete.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cheap liveness probe of the underlying medium.
    async fn ping(&self) -> StoreResult<()>;

    async fn create_book(&self, fields: BookFields) -> StoreResult<Book>;

    async fn get_book(&self, id: Uuid) -> StoreResult<Option<Book>>;

    /// Books with `is_active = true`.
    async fn list_active_books(&self) -> StoreResult<Vec<Book>>;

    /// Replace all mutable fields in a single write.
    async fn update_book(&self, id: Uuid, fields: BookFields) -> StoreResult<Option<Book>>;

    async fn set_book_active(&self, id: Uuid, active: bool) -> StoreResult<Option<Book>>;

    async fn create_type(&self, type_name: String) -> StoreResult<BookType>;

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<BookType>>;

    async fn list_types(&self) -> StoreResult<Vec<BookType>>;

    async fn create_genre(&self, genre_name: String) -> StoreResult<Genre>;

    async fn get_genre(&self, id: Uuid) -> StoreResult<Option<Genre>>;

    async fn list_genres(&self) -> StoreResult<Vec<Genre>>;
}

/// Last-line checks shared by every backend.
pub(crate) fn check_fields(fields: &BookFields) -> StoreResult<()> {
    let violations = fields.violations();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Rejected(violations))
    }
}

pub(crate) fn check_name(field: &'static str, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        Err(StoreError::Rejected(vec![FieldViolation::new(
            field,
            super::error::ViolationReason::Required,
        )]))
    } else {
        Ok(())
    }
}

/// Behaviour every backend must share, run against each implementation.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::modules::catalog::error::ViolationReason;

    pub fn fields(type_id: Uuid, genre_id: Uuid) -> BookFields {
        BookFields {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            type_id,
            genre_id,
            publication: "Chilton".to_string(),
            pages: 412,
            price: 15.0,
            cover_photo: "http://x/cover.jpg".to_string(),
        }
    }

    async fn lookups(store: &dyn CatalogStore) -> (BookType, Genre) {
        let book_type = store.create_type("Paperback".to_string()).await.unwrap();
        let genre = store.create_genre("Fiction".to_string()).await.unwrap();
        (book_type, genre)
    }

    pub async fn create_then_get_round_trips(store: &dyn CatalogStore) {
        let (book_type, genre) = lookups(store).await;
        let created = store
            .create_book(fields(book_type.id, genre.id))
            .await
            .unwrap();

        assert!(created.is_active);
        assert_eq!(store.get_book(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(store.get_type(book_type.id).await.unwrap(), Some(book_type));
        assert_eq!(store.get_genre(genre.id).await.unwrap(), Some(genre));
    }

    pub async fn unknown_ids_are_none(store: &dyn CatalogStore) {
        let (book_type, genre) = lookups(store).await;
        let missing = Uuid::now_v7();

        assert_eq!(store.get_book(missing).await.unwrap(), None);
        assert_eq!(store.get_type(missing).await.unwrap(), None);
        assert_eq!(store.get_genre(missing).await.unwrap(), None);
        assert_eq!(
            store
                .update_book(missing, fields(book_type.id, genre.id))
                .await
                .unwrap(),
            None
        );
        assert_eq!(store.set_book_active(missing, false).await.unwrap(), None);
        assert!(store.list_active_books().await.unwrap().is_empty());
    }

    pub async fn update_replaces_mutable_fields(store: &dyn CatalogStore) {
        let (book_type, genre) = lookups(store).await;
        let created = store
            .create_book(fields(book_type.id, genre.id))
            .await
            .unwrap();

        let mut changed = fields(book_type.id, genre.id);
        changed.title = "Children of Dune".to_string();
        changed.publication = String::new();
        changed.pages = 444;

        let updated = store
            .update_book(created.id, changed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "Children of Dune");
        assert_eq!(updated.publication, "");
        assert_eq!(updated.pages, 444);
        assert_eq!(store.get_book(created.id).await.unwrap(), Some(updated));
    }

    pub async fn inactive_books_are_hidden_from_listing(store: &dyn CatalogStore) {
        let (book_type, genre) = lookups(store).await;
        let kept = store
            .create_book(fields(book_type.id, genre.id))
            .await
            .unwrap();
        let hidden = store
            .create_book(fields(book_type.id, genre.id))
            .await
            .unwrap();

        let flagged = store
            .set_book_active(hidden.id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(!flagged.is_active);

        let listed: Vec<Uuid> = store
            .list_active_books()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.id)
            .collect();
        assert_eq!(listed, vec![kept.id]);

        // Still stored, just inactive.
        assert!(!store.get_book(hidden.id).await.unwrap().unwrap().is_active);
    }

    pub async fn invalid_records_are_rejected(store: &dyn CatalogStore) {
        let (book_type, genre) = lookups(store).await;
        let mut bad = fields(book_type.id, genre.id);
        bad.pages = 0;

        match store.create_book(bad).await {
            Err(StoreError::Rejected(violations)) => {
                assert_eq!(violations[0].field, "pages");
                assert_eq!(violations[0].reason, ViolationReason::MustBePositive);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(matches!(
            store.create_type("  ".to_string()).await,
            Err(StoreError::Rejected(_))
        ));
        assert!(store.list_active_books().await.unwrap().is_empty());
    }

    pub async fn lookups_list_all_records(store: &dyn CatalogStore) {
        for name in ["Hardcover", "Paperback", "Ebook"] {
            store.create_type(name.to_string()).await.unwrap();
        }
        store.create_genre("Mystery".to_string()).await.unwrap();

        let names: Vec<String> = store
            .list_types()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.type_name)
            .collect();
        assert_eq!(names, vec!["Hardcover", "Paperback", "Ebook"]);
        assert_eq!(store.list_genres().await.unwrap().len(), 1);
    }
}
