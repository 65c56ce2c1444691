use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{FieldViolation, ViolationReason};

/// Lookup record describing a book's format (Hardcover, Paperback, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookType {
    pub id: Uuid,
    pub type_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Lookup record describing a book's genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub genre_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A catalog entry. Books are never removed, only flagged inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub type_id: Uuid,
    pub genre_id: Uuid,
    pub publication: String,
    pub pages: i64,
    pub price: f64,
    pub cover_photo: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// Build a fresh active book with a new time-ordered id.
    pub fn new(fields: BookFields, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: fields.title,
            author: fields.author,
            type_id: fields.type_id,
            genre_id: fields.genre_id,
            publication: fields.publication,
            pages: fields.pages,
            price: fields.price,
            cover_photo: fields.cover_photo,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field; id, activity and creation time are kept.
    pub fn apply(&mut self, fields: BookFields, now: OffsetDateTime) {
        self.title = fields.title;
        self.author = fields.author;
        self.type_id = fields.type_id;
        self.genre_id = fields.genre_id;
        self.publication = fields.publication;
        self.pages = fields.pages;
        self.price = fields.price;
        self.cover_photo = fields.cover_photo;
        self.updated_at = now;
    }
}

/// The mutable part of a book after request validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub type_id: Uuid,
    pub genre_id: Uuid,
    pub publication: String,
    pub pages: i64,
    pub price: f64,
    pub cover_photo: String,
}

impl BookFields {
    /// Constraint violations a store must refuse regardless of caller checks.
    pub fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("cover_photo", &self.cover_photo),
        ] {
            if value.trim().is_empty() {
                violations.push(FieldViolation::new(field, ViolationReason::Required));
            }
        }
        if self.pages < 1 {
            violations.push(FieldViolation::new("pages", ViolationReason::MustBePositive));
        }
        if !self.price.is_finite() {
            violations.push(FieldViolation::new("price", ViolationReason::InvalidNumber));
        } else if self.price < 1.0 {
            violations.push(FieldViolation::new("price", ViolationReason::MustBePositive));
        }

        violations
    }
}

/// A number as sent by clients: JSON number or numeric text from a form field.
///
/// Any other JSON value lands in `Other` so validation can name the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

/// A text field as sent by clients; non-string JSON values land in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Text(String),
    Other(serde_json::Value),
}

impl TextInput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextInput::Text(text) => Some(text),
            TextInput::Other(_) => None,
        }
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        TextInput::Text(text)
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        TextInput::Text(text.to_string())
    }
}

/// Request body for adding or replacing a book.
///
/// Every field is optional and loosely typed so that missing or wrong-typed
/// fields surface as validation errors rather than deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookInput {
    pub title: Option<TextInput>,
    pub author: Option<TextInput>,
    #[serde(alias = "type")]
    pub type_id: Option<TextInput>,
    #[serde(alias = "genre")]
    pub genre_id: Option<TextInput>,
    pub publication: Option<TextInput>,
    pub pages: Option<NumberInput>,
    pub price: Option<NumberInput>,
    pub cover_photo: Option<TextInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInput {
    pub type_name: Option<TextInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreInput {
    pub genre_name: Option<TextInput>,
}

/// A book joined with the names of its type and genre.
///
/// Names are `None` when the reference no longer resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookView {
    #[serde(flatten)]
    pub book: Book,
    pub type_name: Option<String>,
    pub genre_name: Option<String>,
}
