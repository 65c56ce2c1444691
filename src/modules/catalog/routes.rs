use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bookshelf_http::error::AppError;
use uuid::Uuid;

use super::error::CatalogError;
use super::models::{Book, BookInput, BookType, BookView, Genre, GenreInput, TypeInput};
use super::service::CatalogService;

type ApiResult<T> = Result<T, AppError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(violations) => {
                let details = violations
                    .iter()
                    .filter_map(|v| serde_json::to_value(v).ok())
                    .collect();
                let message = CatalogError::Validation(violations).to_string();
                AppError::validation(details, message)
            }
            not_found @ CatalogError::NotFound { .. } => AppError::not_found(not_found.to_string()),
            CatalogError::StoreUnavailable(source) => {
                tracing::error!(error = %source, "catalog store call failed");
                AppError::unavailable("catalog store is unavailable")
            }
        }
    }
}

pub fn router(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/books", get(list_books).post(add_book))
        .route("/books/{id}", get(get_book).put(update_book))
        .route("/books/{id}/deactivate", put(deactivate_book))
        .route("/types", get(list_types).post(add_type))
        .route("/genres", get(list_genres).post(add_genre))
        .route("/health", get(health_check))
        .with_state(service)
}

/// Path ids that are not UUIDs cannot name a stored book.
fn book_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CatalogError::book_not_found(raw).into())
}

async fn list_books(State(service): State<Arc<CatalogService>>) -> ApiResult<Json<Vec<BookView>>> {
    Ok(Json(service.list_books().await?))
}

async fn get_book(
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookView>> {
    Ok(Json(service.get_book(book_id(&id)?).await?))
}

async fn add_book(
    State(service): State<Arc<CatalogService>>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let Json(input) = payload?;
    let book = service.add_book(&input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let Json(input) = payload?;
    Ok(Json(service.update_book_at(&id, &input).await?))
}

async fn deactivate_book(
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    Ok(Json(service.deactivate_book(book_id(&id)?).await?))
}

async fn list_types(State(service): State<Arc<CatalogService>>) -> ApiResult<Json<Vec<BookType>>> {
    Ok(Json(service.list_types().await?))
}

async fn add_type(
    State(service): State<Arc<CatalogService>>,
    payload: Result<Json<TypeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookType>)> {
    let Json(input) = payload?;
    Ok((StatusCode::CREATED, Json(service.add_type(&input).await?)))
}

async fn list_genres(State(service): State<Arc<CatalogService>>) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(service.list_genres().await?))
}

async fn add_genre(
    State(service): State<Arc<CatalogService>>,
    payload: Result<Json<GenreInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let Json(input) = payload?;
    Ok((StatusCode::CREATED, Json(service.add_genre(&input).await?)))
}

async fn health_check(State(service): State<Arc<CatalogService>>) -> ApiResult<&'static str> {
    service.ping().await?;
    Ok("catalog module is healthy")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(CatalogService::new(Arc::new(MemoryStore::new()))))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn lookups(app: &Router) -> (String, String) {
        let (status, book_type) =
            call(app, "POST", "/types", Some(json!({"type_name": "Paperback"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, genre) = call(app, "POST", "/genres", Some(json!({"genre_name": "Fiction"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        (
            book_type["id"].as_str().unwrap().to_string(),
            genre["id"].as_str().unwrap().to_string(),
        )
    }

    fn dune(type_id: &str, genre_id: &str) -> Value {
        json!({
            "title": "Dune",
            "author": "Herbert",
            "type_id": type_id,
            "genre_id": genre_id,
            "pages": 412,
            "price": 15,
            "cover_photo": "http://x/cover.jpg"
        })
    }

    #[tokio::test]
    async fn book_lifecycle_over_http() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;

        let (status, created) = call(&app, "POST", "/books", Some(dune(&type_id, &genre_id))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["is_active"], true);
        assert_eq!(created["publication"], "");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = call(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["type_name"], "Paperback");
        assert_eq!(listed[0]["genre_name"], "Fiction");

        let (status, _) = call(&app, "PUT", &format!("/books/{id}/deactivate"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = call(&app, "GET", "/books", None).await;
        assert_eq!(listed, json!([]));

        let (status, detail) = call(&app, "GET", &format!("/books/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["is_active"], false);
        assert_eq!(detail["title"], "Dune");
    }

    #[tokio::test]
    async fn legacy_reference_field_names_are_accepted() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;
        let body = json!({
            "title": "Dune",
            "author": "Herbert",
            "type": type_id,
            "genre": genre_id,
            "pages": "412",
            "price": "15",
            "cover_photo": "http://x/cover.jpg"
        });

        let (status, created) = call(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["pages"], 412);
    }

    #[tokio::test]
    async fn validation_errors_are_422_with_field_details() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;
        let mut body = dune(&type_id, &genre_id);
        body["pages"] = json!(0);

        let (status, error) = call(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["error"]["code"], "validation_error");
        assert_eq!(
            error["error"]["details"],
            json!([{"field": "pages", "reason": "must_be_positive"}])
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_404() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;
        let missing = Uuid::now_v7();

        let (status, error) = call(&app, "GET", &format!("/books/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "not_found");

        let (status, _) = call(&app, "GET", "/books/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, error) = call(&app, "PUT", "/books/not-a-uuid/deactivate", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["message"], "book 'not-a-uuid' not found");

        let (status, error) = call(
            &app,
            "PUT",
            &format!("/books/{missing}"),
            Some(dune(&type_id, &genre_id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["message"], format!("book '{missing}' not found"));

        let (status, error) = call(
            &app,
            "PUT",
            "/books/not-a-uuid",
            Some(dune(&type_id, &genre_id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["message"], "book 'not-a-uuid' not found");
    }

    #[tokio::test]
    async fn invalid_update_of_missing_book_is_422() {
        let app = app();
        let (status, _) = call(&app, "PUT", "/books/not-a-uuid", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn wrong_typed_fields_are_422_naming_the_field() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;

        let mut body = dune(&type_id, &genre_id);
        body["title"] = json!(5);
        let (status, error) = call(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error["error"]["details"],
            json!([{"field": "title", "reason": "invalid_type"}])
        );

        let mut body = dune(&type_id, &genre_id);
        body["pages"] = json!(true);
        let (status, error) = call(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error["error"]["details"],
            json!([{"field": "pages", "reason": "invalid_number"}])
        );

        let (status, error) = call(&app, "POST", "/genres", Some(json!({"genre_name": 3}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["error"]["details"][0]["field"], "genre_name");
    }

    #[tokio::test]
    async fn integral_float_pages_are_accepted() {
        let app = app();
        let (type_id, genre_id) = lookups(&app).await;
        let mut body = dune(&type_id, &genre_id);
        body["pages"] = json!(412.0);

        let (status, created) = call(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["pages"], 412);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/genres")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lookups_are_listed() {
        let app = app();
        lookups(&app).await;

        let (status, types) = call(&app, "GET", "/types", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(types[0]["type_name"], "Paperback");

        let (_, genres) = call(&app, "GET", "/genres", None).await;
        assert_eq!(genres[0]["genre_name"], "Fiction");

        let (status, _) = call(&app, "POST", "/types", Some(json!({"type_name": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_ok_for_reachable_store() {
        let app = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
