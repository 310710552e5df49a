use crate::app::BackupDocument;
use crate::transport::http::handlers::common::respond;
use crate::transport::http::types::{json_422, ApiResponse, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/backup",
    responses(
        (status = 200, description = "Every table, read in full", body = ApiResponse)
    )
)]
pub async fn backup_handler(State(state): State<AppState>) -> impl IntoResponse {
    respond(state.service.create_backup().await)
}

#[utoipa::path(
    post,
    path = "/api/restore",
    request_body = BackupDocument,
    responses(
        (status = 200, description = "Tables in the document were replaced", body = ApiResponse),
        (status = 400, description = "Document names an unknown table; nothing was changed", body = ApiResponse),
        (status = 500, description = "Restore failed partway through", body = ApiResponse)
    )
)]
pub async fn restore_handler(
    State(state): State<AppState>,
    request: Result<Json<BackupDocument>, JsonRejection>,
) -> impl IntoResponse {
    let Json(doc) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"tables\": {\"<table>\": [...]}}").into_response(),
    };

    respond(state.service.restore_backup(&doc).await)
}
