use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn json_body(name: &str) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema_ref(name) } }
    })
}

fn id_parameter() -> Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    }])
}

/// Paths are relative to the module mount point.
pub fn document() -> Value {
    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List active books with type and genre names",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response(
                            "Active books",
                            json!({ "type": "array", "items": schema_ref("BookView") })
                        ),
                        "503": error_response("Catalog store unavailable")
                    }
                },
                "post": {
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": json_body("BookInput"),
                    "responses": {
                        "201": json_response("Created book", schema_ref("Book")),
                        "400": error_response("Malformed JSON"),
                        "422": error_response("Validation error"),
                        "503": error_response("Catalog store unavailable")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book, active or not",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": json_response("Book detail", schema_ref("BookView")),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "requestBody": json_body("BookInput"),
                    "responses": {
                        "200": json_response("Updated book", schema_ref("Book")),
                        "404": error_response("Book not found"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/books/{id}/deactivate": {
                "put": {
                    "summary": "Soft-delete a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": json_response("Deactivated book", schema_ref("Book")),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/types": {
                "get": {
                    "summary": "List book types",
                    "tags": ["Lookups"],
                    "responses": {
                        "200": json_response(
                            "Book types",
                            json!({ "type": "array", "items": schema_ref("BookType") })
                        )
                    }
                },
                "post": {
                    "summary": "Add a book type",
                    "tags": ["Lookups"],
                    "requestBody": json_body("TypeInput"),
                    "responses": {
                        "201": json_response("Created type", schema_ref("BookType")),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/genres": {
                "get": {
                    "summary": "List genres",
                    "tags": ["Lookups"],
                    "responses": {
                        "200": json_response(
                            "Genres",
                            json!({ "type": "array", "items": schema_ref("Genre") })
                        )
                    }
                },
                "post": {
                    "summary": "Add a genre",
                    "tags": ["Lookups"],
                    "requestBody": json_body("GenreInput"),
                    "responses": {
                        "201": json_response("Created genre", schema_ref("Genre")),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Catalog store health",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        },
                        "503": error_response("Catalog store unavailable")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "type_id": { "type": "string", "format": "uuid" },
                        "genre_id": { "type": "string", "format": "uuid" },
                        "publication": { "type": "string" },
                        "pages": { "type": "integer", "minimum": 1 },
                        "price": { "type": "number", "minimum": 1 },
                        "cover_photo": { "type": "string", "format": "uri" },
                        "is_active": { "type": "boolean" },
                        "created_at": { "type": "string", "format": "date-time" },
                        "updated_at": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "type_id", "genre_id", "publication",
                        "pages", "price", "cover_photo", "is_active", "created_at", "updated_at"
                    ]
                },
                "BookView": {
                    "allOf": [
                        schema_ref("Book"),
                        {
                            "type": "object",
                            "properties": {
                                "type_name": { "type": ["string", "null"] },
                                "genre_name": { "type": ["string", "null"] }
                            }
                        }
                    ]
                },
                "BookInput": {
                    "type": "object",
                    "description": "`type` and `genre` are accepted as aliases of `type_id` and `genre_id`.",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "type_id": { "type": "string", "format": "uuid" },
                        "genre_id": { "type": "string", "format": "uuid" },
                        "publication": { "type": "string" },
                        "pages": { "type": ["integer", "string"] },
                        "price": { "type": ["number", "string"] },
                        "cover_photo": { "type": "string" }
                    },
                    "required": ["title", "author", "type_id", "genre_id", "pages", "price", "cover_photo"]
                },
                "BookType": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "type_name": { "type": "string" },
                        "created_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "type_name", "created_at"]
                },
                "Genre": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "genre_name": { "type": "string" },
                        "created_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "genre_name", "created_at"]
                },
                "TypeInput": {
                    "type": "object",
                    "properties": { "type_name": { "type": "string" } },
                    "required": ["type_name"]
                },
                "GenreInput": {
                    "type": "object",
                    "properties": { "genre_name": { "type": "string" } },
                    "required": ["genre_name"]
                }
            }
        }
    })
}
