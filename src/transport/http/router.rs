use crate::app::{
    AttendanceCounts, BackupDocument, CustomerStatement, DashboardStats, EmployeeSummary,
    RestoreReport, TableRestoreStats,
};
use crate::transport::http::handlers::{backup, health, status, summaries, tables};
use crate::transport::http::types::{
    ApiResponse, AppState, BulkCreateRequest, ForceOnlineResponse, ReadRequest,
};
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        status::status_handler,
        status::force_online_handler,
        tables::read_handler,
        tables::create_handler,
        tables::bulk_create_handler,
        tables::update_handler,
        tables::delete_handler,
        backup::backup_handler,
        backup::restore_handler,
        summaries::dashboard_handler,
        summaries::employee_summary_handler,
        summaries::customer_statement_handler
    ),
    components(schemas(
        ApiResponse,
        ReadRequest,
        BulkCreateRequest,
        ForceOnlineResponse,
        BackupDocument,
        RestoreReport,
        TableRestoreStats,
        DashboardStats,
        EmployeeSummary,
        AttendanceCounts,
        CustomerStatement
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/status", get(status::status_handler))
        .route("/api/status/force-online", post(status::force_online_handler))
        .route("/api/tables/:table", post(tables::create_handler))
        .route("/api/tables/:table/read", post(tables::read_handler))
        .route("/api/tables/:table/bulk", post(tables::bulk_create_handler))
        .route(
            "/api/tables/:table/:id",
            put(tables::update_handler).delete(tables::delete_handler),
        )
        .route("/api/backup", get(backup::backup_handler))
        .route("/api/restore", post(backup::restore_handler))
        .route("/api/summaries/dashboard", get(summaries::dashboard_handler))
        .route(
            "/api/summaries/employees/:id",
            get(summaries::employee_summary_handler),
        )
        .route(
            "/api/summaries/customers/:id",
            get(summaries::customer_statement_handler),
        )
        .with_state(app_state)
}
