use crate::app::DataService;
use crate::domain::model::Table;
use crate::domain::query::Query;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: DataService,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ReadRequest {
    /// Equality filters: `{ "field": value }`. An array value matches any of its elements.
    #[serde(default, rename = "where")]
    #[schema(value_type = Object)]
    pub r#where: BTreeMap<String, JsonValue>,
    #[serde(default, rename = "orderBy", alias = "order_by")]
    pub order_by: Option<String>,
    /// Defaults to ascending when `orderBy` is given.
    #[serde(default)]
    pub ascending: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Apply the table's default ordering when `orderBy` is absent.
    #[serde(default)]
    pub default_order: bool,
}

impl ReadRequest {
    pub fn into_query(self, table: Table) -> Query {
        let mut query = Query {
            r#where: self.r#where,
            order_by: self.order_by,
            ascending: self.ascending.unwrap_or(true),
            limit: self.limit,
            offset: self.offset,
        };
        if query.order_by.is_none() && self.default_order {
            let order = table.default_order();
            query = query.order_by(order.field, order.ascending);
        }
        query
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct BulkCreateRequest {
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<JsonValue>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ForceOnlineResponse {
    pub forced: bool,
    #[schema(value_type = Object)]
    pub status: JsonValue,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::failure(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
