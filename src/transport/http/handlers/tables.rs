use crate::domain::model::{into_record, Record, Table};
use crate::error::Result;
use crate::transport::http::handlers::common::{error_response, respond};
use crate::transport::http::types::{json_422, ApiResponse, AppState, BulkCreateRequest, ReadRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value as JsonValue;

fn parse_table(name: &str) -> std::result::Result<Table, Response> {
    Table::parse(name.trim()).map_err(error_response)
}

#[utoipa::path(
    post,
    path = "/api/tables/{table}/read",
    params(
        ("table" = String, Path, description = "Table name (e.g. employees)")
    ),
    request_body = ReadRequest,
    responses(
        (status = 200, description = "Matching records", body = ApiResponse),
        (status = 400, description = "Unknown table", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn read_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: std::result::Result<Json<ReadRequest>, JsonRejection>,
) -> impl IntoResponse {
    let table = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"where\": {...}, \"orderBy\": \"field\"}").into_response(),
    };

    respond(state.service.read(table, request.into_query(table)).await)
}

#[utoipa::path(
    post,
    path = "/api/tables/{table}",
    params(
        ("table" = String, Path, description = "Table name")
    ),
    request_body(content = Object, description = "Record fields; unknown fields are dropped"),
    responses(
        (status = 200, description = "Created record", body = ApiResponse),
        (status = 400, description = "Unknown table or non-object payload", body = ApiResponse),
        (status = 409, description = "Id already exists locally", body = ApiResponse)
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let table = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Json(body) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "a JSON object").into_response(),
    };

    let data = match into_record(body) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    respond(state.service.create(table, data).await)
}

#[utoipa::path(
    post,
    path = "/api/tables/{table}/bulk",
    params(
        ("table" = String, Path, description = "Table name")
    ),
    request_body = BulkCreateRequest,
    responses(
        (status = 200, description = "Records that were created; failed items are skipped", body = ApiResponse),
        (status = 400, description = "Unknown table or non-object item", body = ApiResponse)
    )
)]
pub async fn bulk_create_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: std::result::Result<Json<BulkCreateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let table = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"records\": [...]}").into_response(),
    };

    let items = match request
        .records
        .into_iter()
        .map(into_record)
        .collect::<Result<Vec<Record>>>()
    {
        Ok(items) => items,
        Err(e) => return error_response(e),
    };
    respond(state.service.bulk_create(table, items).await)
}

#[utoipa::path(
    put,
    path = "/api/tables/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = String, Path, description = "Record id")
    ),
    request_body(content = Object, description = "Fields to merge over the stored record"),
    responses(
        (status = 200, description = "Updated record", body = ApiResponse),
        (status = 404, description = "No record with this id", body = ApiResponse)
    )
)]
pub async fn update_handler(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    request: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let table = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Json(body) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "a JSON object").into_response(),
    };

    let data = match into_record(body) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    respond(state.service.update(table, &id, data).await)
}

#[utoipa::path(
    delete,
    path = "/api/tables/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Deleted (also when the id did not exist)", body = ApiResponse),
        (status = 400, description = "Unknown table", body = ApiResponse)
    )
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let table = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let result = state
        .service
        .delete(table, &id)
        .await
        .map(|()| serde_json::json!({ "id": id }));
    respond(result)
}
