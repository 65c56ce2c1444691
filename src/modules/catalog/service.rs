use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::error::{CatalogError, CatalogResult, FieldViolation, ViolationReason};
use super::models::{Book, BookFields, BookInput, BookType, BookView, Genre, GenreInput, TypeInput};
use super::store::CatalogStore;
use super::validation::{validate_book, validate_name};

/// Outcome of [`CatalogService::seed_lookups`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub types_added: usize,
    pub genres_added: usize,
}

/// Validation, reference resolution and soft deletion on top of a [`CatalogStore`].
///
/// Holds no state of its own between calls.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> CatalogResult<()> {
        self.store.ping().await.map_err(CatalogError::StoreUnavailable)
    }

    /// Active books joined with their type and genre names.
    pub async fn list_books(&self) -> CatalogResult<Vec<BookView>> {
        let books = self.store.list_active_books().await?;
        let type_names: HashMap<Uuid, String> = self
            .store
            .list_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t.type_name))
            .collect();
        let genre_names: HashMap<Uuid, String> = self
            .store
            .list_genres()
            .await?
            .into_iter()
            .map(|g| (g.id, g.genre_name))
            .collect();

        Ok(books
            .into_iter()
            .map(|book| BookView {
                type_name: type_names.get(&book.type_id).cloned(),
                genre_name: genre_names.get(&book.genre_id).cloned(),
                book,
            })
            .collect())
    }

    /// Any book by id, active or not.
    pub async fn get_book(&self, id: Uuid) -> CatalogResult<BookView> {
        let book = self
            .store
            .get_book(id)
            .await?
            .ok_or_else(|| CatalogError::book_not_found(id))?;
        self.resolve(book).await
    }

    pub async fn add_book(&self, input: &BookInput) -> CatalogResult<Book> {
        let fields = self.validated(input).await?;
        let book = self.store.create_book(fields).await?;

        tracing::info!(
            book_id = %book.id,
            type_id = %book.type_id,
            genre_id = %book.genre_id,
            "book added"
        );
        Ok(book)
    }

    /// Replace every mutable field of an existing book, or change nothing.
    pub async fn update_book(&self, id: Uuid, input: &BookInput) -> CatalogResult<Book> {
        let fields = self.validated(input).await?;
        let book = self
            .store
            .update_book(id, fields)
            .await?
            .ok_or_else(|| CatalogError::book_not_found(id))?;

        tracing::info!(book_id = %book.id, "book updated");
        Ok(book)
    }

    /// Update addressed by a raw key such as a path segment.
    ///
    /// The body is checked before the key, so an invalid body is reported even
    /// when the key cannot name a book; otherwise the key itself is reported.
    pub async fn update_book_at(&self, key: &str, input: &BookInput) -> CatalogResult<Book> {
        match Uuid::parse_str(key) {
            Ok(id) => self.update_book(id, input).await,
            Err(_) => {
                self.validated(input).await?;
                Err(CatalogError::book_not_found(key))
            }
        }
    }

    /// Soft delete. Deactivating an inactive book succeeds and changes nothing.
    pub async fn deactivate_book(&self, id: Uuid) -> CatalogResult<Book> {
        let book = self
            .store
            .set_book_active(id, false)
            .await?
            .ok_or_else(|| CatalogError::book_not_found(id))?;

        tracing::info!(book_id = %book.id, "book deactivated");
        Ok(book)
    }

    pub async fn list_types(&self) -> CatalogResult<Vec<BookType>> {
        Ok(self.store.list_types().await?)
    }

    pub async fn add_type(&self, input: &TypeInput) -> CatalogResult<BookType> {
        let name = validate_name("type_name", input.type_name.as_ref())
            .map_err(CatalogError::Validation)?;
        let book_type = self.store.create_type(name).await?;

        tracing::info!(type_id = %book_type.id, type_name = %book_type.type_name, "book type added");
        Ok(book_type)
    }

    pub async fn list_genres(&self) -> CatalogResult<Vec<Genre>> {
        Ok(self.store.list_genres().await?)
    }

    pub async fn add_genre(&self, input: &GenreInput) -> CatalogResult<Genre> {
        let name = validate_name("genre_name", input.genre_name.as_ref())
            .map_err(CatalogError::Validation)?;
        let genre = self.store.create_genre(name).await?;

        tracing::info!(genre_id = %genre.id, genre_name = %genre.genre_name, "genre added");
        Ok(genre)
    }

    /// Add whichever of the given lookup names are missing. Matching ignores case.
    pub async fn seed_lookups(&self, types: &[&str], genres: &[&str]) -> CatalogResult<SeedReport> {
        let mut report = SeedReport::default();

        let existing_types: Vec<String> = self
            .list_types()
            .await?
            .into_iter()
            .map(|t| t.type_name.to_lowercase())
            .collect();
        for name in types {
            if !existing_types.contains(&name.to_lowercase()) {
                self.add_type(&TypeInput {
                    type_name: Some(name.to_string().into()),
                })
                .await?;
                report.types_added += 1;
            }
        }

        let existing_genres: Vec<String> = self
            .list_genres()
            .await?
            .into_iter()
            .map(|g| g.genre_name.to_lowercase())
            .collect();
        for name in genres {
            if !existing_genres.contains(&name.to_lowercase()) {
                self.add_genre(&GenreInput {
                    genre_name: Some(name.to_string().into()),
                })
                .await?;
                report.genres_added += 1;
            }
        }

        Ok(report)
    }

    /// Shape checks first, then make sure both references exist.
    async fn validated(&self, input: &BookInput) -> CatalogResult<BookFields> {
        let fields = validate_book(input).map_err(CatalogError::Validation)?;

        let mut violations = Vec::new();
        if self.store.get_type(fields.type_id).await?.is_none() {
            violations.push(FieldViolation::new("type_id", ViolationReason::UnknownReference));
        }
        if self.store.get_genre(fields.genre_id).await?.is_none() {
            violations.push(FieldViolation::new("genre_id", ViolationReason::UnknownReference));
        }

        if violations.is_empty() {
            Ok(fields)
        } else {
            Err(CatalogError::Validation(violations))
        }
    }

    /// Attach lookup names; a dangling reference yields `None` instead of an error.
    async fn resolve(&self, book: Book) -> CatalogResult<BookView> {
        let type_name = self
            .store
            .get_type(book.type_id)
            .await?
            .map(|t| t.type_name);
        let genre_name = self
            .store
            .get_genre(book.genre_id)
            .await?
            .map(|g| g.genre_name);

        Ok(BookView {
            book,
            type_name,
            genre_name,
        })
    }
}
