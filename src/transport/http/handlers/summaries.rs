use crate::transport::http::handlers::common::ok_response;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/summaries/dashboard",
    responses(
        (status = 200, description = "Totals across customers, employees, bills and payments", body = ApiResponse)
    )
)]
pub async fn dashboard_handler(State(state): State<AppState>) -> impl IntoResponse {
    ok_response(&state.service.dashboard_stats().await)
}

#[utoipa::path(
    get,
    path = "/api/summaries/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Salary, advance and attendance totals", body = ApiResponse)
    )
)]
pub async fn employee_summary_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    ok_response(&state.service.employee_summary(&id).await)
}

#[utoipa::path(
    get,
    path = "/api/summaries/customers/{id}",
    params(
        ("id" = String, Path, description = "Customer id")
    ),
    responses(
        (status = 200, description = "Bills, payments and balance of one customer", body = ApiResponse)
    )
)]
pub async fn customer_statement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    ok_response(&state.service.customer_statement(&id).await)
}
