use crate::transport::http::handlers::common::ok_response;
use crate::transport::http::types::{ApiResponse, AppState, ForceOnlineResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Current connection mode and missing tables", body = ApiResponse)
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    ok_response(&state.service.status())
}

#[utoipa::path(
    post,
    path = "/api/status/force-online",
    responses(
        (status = 200, description = "Mode forced online", body = ApiResponse),
        (status = 409, description = "No remote client exists", body = ApiResponse)
    )
)]
pub async fn force_online_handler(State(state): State<AppState>) -> impl IntoResponse {
    let forced = state.service.force_online();
    let body = ForceOnlineResponse {
        forced,
        status: serde_json::to_value(state.service.status()).unwrap_or_default(),
    };

    if forced {
        ok_response(&body)
    } else {
        (
            StatusCode::CONFLICT,
            Json(ApiResponse {
                success: false,
                data: serde_json::to_value(&body).ok(),
                error: Some("No remote client has been constructed; cannot go online".to_string()),
            }),
        )
            .into_response()
    }
}
