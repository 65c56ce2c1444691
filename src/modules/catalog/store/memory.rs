use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{check_fields, check_name, CatalogStore, StoreResult};
use crate::modules::catalog::models::{Book, BookFields, BookType, Genre};

/// Insertion-ordered rows with an id index.
struct Table<T> {
    rows: Vec<T>,
    index: HashMap<Uuid, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert(&mut self, id: Uuid, row: T) {
        self.index.insert(id, self.rows.len());
        self.rows.push(row);
    }

    fn get(&self, id: Uuid) -> Option<&T> {
        self.index.get(&id).map(|&position| &self.rows[position])
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut T> {
        let position = *self.index.get(&id)?;
        self.rows.get_mut(position)
    }
}

#[derive(Default)]
struct Tables {
    books: Table<Book>,
    types: Table<BookType>,
    genres: Table<Genre>,
}

/// Process-local store for tests and `backend = "memory"`; contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_book(&self, fields: BookFields) -> StoreResult<Book> {
        check_fields(&fields)?;
        let book = Book::new(fields, OffsetDateTime::now_utc());

        let mut tables = self.tables.write().await;
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(id).cloned())
    }

    async fn list_active_books(&self) -> StoreResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .rows
            .iter()
            .filter(|book| book.is_active)
            .cloned()
            .collect())
    }

    async fn update_book(&self, id: Uuid, fields: BookFields) -> StoreResult<Option<Book>> {
        check_fields(&fields)?;

        let mut tables = self.tables.write().await;
        let Some(book) = tables.books.get_mut(id) else {
            return Ok(None);
        };
        book.apply(fields, OffsetDateTime::now_utc());
        Ok(Some(book.clone()))
    }

    async fn set_book_active(&self, id: Uuid, active: bool) -> StoreResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        let Some(book) = tables.books.get_mut(id) else {
            return Ok(None);
        };
        if book.is_active != active {
            book.is_active = active;
            book.updated_at = OffsetDateTime::now_utc();
        }
        Ok(Some(book.clone()))
    }

    async fn create_type(&self, type_name: String) -> StoreResult<BookType> {
        check_name("type_name", &type_name)?;
        let book_type = BookType {
            id: Uuid::now_v7(),
            type_name,
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tables = self.tables.write().await;
        tables.types.insert(book_type.id, book_type.clone());
        Ok(book_type)
    }

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<BookType>> {
        Ok(self.tables.read().await.types.get(id).cloned())
    }

    async fn list_types(&self) -> StoreResult<Vec<BookType>> {
        Ok(self.tables.read().await.types.rows.clone())
    }

    async fn create_genre(&self, genre_name: String) -> StoreResult<Genre> {
        check_name("genre_name", &genre_name)?;
        let genre = Genre {
            id: Uuid::now_v7(),
            genre_name,
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tables = self.tables.write().await;
        tables.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn get_genre(&self, id: Uuid) -> StoreResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(id).cloned())
    }

    async fn list_genres(&self) -> StoreResult<Vec<Genre>> {
        Ok(self.tables.read().await.genres.rows.clone())
    }
}
