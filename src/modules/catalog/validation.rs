//! Request-shape checks that need no store access.
//!
//! Reference *existence* is checked by the service; here a reference only has
//! to be present and well formed.

use uuid::Uuid;

use super::error::{FieldViolation, ViolationReason};
use super::models::{BookFields, BookInput, NumberInput, TextInput};

/// Turn a raw request into validated fields, or every problem found.
pub fn validate_book(input: &BookInput) -> Result<BookFields, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let title = required_text("title", input.title.as_ref(), &mut violations);
    let author = required_text("author", input.author.as_ref(), &mut violations);
    let type_id = reference("type_id", input.type_id.as_ref(), &mut violations);
    let genre_id = reference("genre_id", input.genre_id.as_ref(), &mut violations);
    let pages = parse_pages(input.pages.as_ref(), &mut violations);
    let price = parse_price(input.price.as_ref(), &mut violations);
    let cover_photo = required_text("cover_photo", input.cover_photo.as_ref(), &mut violations);
    let publication = match &input.publication {
        None => Some(String::new()),
        Some(TextInput::Text(text)) => Some(text.trim().to_string()),
        Some(TextInput::Other(_)) => {
            violations.push(FieldViolation::new("publication", ViolationReason::InvalidType));
            None
        }
    };

    match (title, author, type_id, genre_id, publication, pages, price, cover_photo) {
        (
            Some(title),
            Some(author),
            Some(type_id),
            Some(genre_id),
            Some(publication),
            Some(pages),
            Some(price),
            Some(cover_photo),
        ) if violations.is_empty() => Ok(BookFields {
            title,
            author,
            type_id,
            genre_id,
            publication,
            pages,
            price,
            cover_photo,
        }),
        _ => Err(violations),
    }
}

/// A lookup name must be a non-blank string.
pub fn validate_name(
    field: &'static str,
    value: Option<&TextInput>,
) -> Result<String, Vec<FieldViolation>> {
    let mut violations = Vec::new();
    required_text(field, value, &mut violations).ok_or(violations)
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// Trimmed, non-blank text, or the reason there is none.
fn text(value: Option<&TextInput>) -> Result<&str, ViolationReason> {
    match value {
        None => Err(ViolationReason::Required),
        Some(TextInput::Text(text)) => non_blank(text).ok_or(ViolationReason::Required),
        Some(TextInput::Other(_)) => Err(ViolationReason::InvalidType),
    }
}

fn record<T>(
    field: &'static str,
    result: Result<T, ViolationReason>,
    violations: &mut Vec<FieldViolation>,
) -> Option<T> {
    result
        .map_err(|reason| violations.push(FieldViolation::new(field, reason)))
        .ok()
}

fn required_text(
    field: &'static str,
    value: Option<&TextInput>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    record(field, text(value).map(str::to_string), violations)
}

fn reference(
    field: &'static str,
    value: Option<&TextInput>,
    violations: &mut Vec<FieldViolation>,
) -> Option<Uuid> {
    let id = match value {
        // An id that cannot exist is reported like one that does not.
        Some(TextInput::Other(_)) => Err(ViolationReason::UnknownReference),
        value => text(value).and_then(|raw| {
            Uuid::parse_str(raw).map_err(|_| ViolationReason::UnknownReference)
        }),
    };
    record(field, id, violations)
}

/// Numeric text of a field; JSON numbers and form strings both end up here.
fn numeric_text(value: Option<&NumberInput>) -> Result<String, ViolationReason> {
    match value {
        None => Err(ViolationReason::Required),
        Some(NumberInput::Number(n)) => Ok(n.to_string()),
        Some(NumberInput::Text(text)) => non_blank(text)
            .map(str::to_string)
            .ok_or(ViolationReason::Required),
        Some(NumberInput::Other(_)) => Err(ViolationReason::InvalidNumber),
    }
}

/// `412.0` counts as 412; fractions and values beyond exact f64 range do not.
fn whole_number(value: f64) -> Option<i64> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= EXACT_LIMIT)
        .then_some(value as i64)
}

fn parse_pages(value: Option<&NumberInput>, violations: &mut Vec<FieldViolation>) -> Option<i64> {
    let pages = numeric_text(value).and_then(|text| {
        text.parse::<i64>()
            .ok()
            .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
            .ok_or(ViolationReason::InvalidNumber)
    });
    let pages = pages.and_then(|pages| {
        if pages >= 1 {
            Ok(pages)
        } else {
            Err(ViolationReason::MustBePositive)
        }
    });
    record("pages", pages, violations)
}

fn parse_price(value: Option<&NumberInput>, violations: &mut Vec<FieldViolation>) -> Option<f64> {
    let price = numeric_text(value).and_then(|text| match text.parse::<f64>() {
        Ok(price) if !price.is_finite() => Err(ViolationReason::InvalidNumber),
        Ok(price) if price >= 1.0 => Ok(price),
        Ok(_) => Err(ViolationReason::MustBePositive),
        Err(_) => Err(ViolationReason::InvalidNumber),
    });
    record("price", price, violations)
}
