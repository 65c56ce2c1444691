use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::store::StoreError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Why a single field was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    Required,
    MustBePositive,
    InvalidNumber,
    /// Text field sent as a non-string JSON value.
    InvalidType,
    UnknownReference,
    /// Refused by a storage constraint the service did not anticipate.
    Constraint,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ViolationReason::Required => "is required",
            ViolationReason::MustBePositive => "must be at least 1",
            ViolationReason::InvalidNumber => "is not a valid number",
            ViolationReason::InvalidType => "must be a string",
            ViolationReason::UnknownReference => "does not reference an existing record",
            ViolationReason::Constraint => "violates a storage constraint",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: ViolationReason,
}

impl FieldViolation {
    pub fn new(field: &'static str, reason: ViolationReason) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcomes of catalog operations other than success.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("catalog store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl CatalogError {
    pub fn book_not_found(id: impl ToString) -> Self {
        CatalogError::NotFound {
            entity: "book",
            id: id.to_string(),
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            CatalogError::Validation(violations) => violations,
            _ => &[],
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(violations) => CatalogError::Validation(violations),
            other => CatalogError::StoreUnavailable(other),
        }
    }
}
