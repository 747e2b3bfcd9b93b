use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditQuery};
use model::entities::audit_log;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{AdminOnly, Require};
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Query parameters for reading the audit trail
///
/// Out-of-range paging values are clamped, not rejected.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AuditLogQuery {
    /// Page number (default: 1, values below 1 read as 1)
    pub page: Option<i64>,
    /// Page size (default: 20, clamped to 1..=200)
    pub page_size: Option<i64>,
    /// Only entries about this entity, e.g. "Lease"
    pub entity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    pub id: i32,
    pub actor: String,
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<i32>,
    pub details: Option<String>,
    pub at_utc: DateTime<Utc>,
}

impl From<audit_log::Model> for AuditLogResponse {
    fn from(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            actor: model.actor,
            action: model.action,
            entity_name: model.entity_name,
            entity_id: model.entity_id,
            details: model.details,
            at_utc: model.at_utc,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditPageResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<AuditLogResponse>,
}

/// Page through the audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/audit",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit entries retrieved successfully", body = ApiResponse<AuditPageResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Requires Admin", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_audit_logs(
    _user: Require<AdminOnly>,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AuditPageResponse>>> {
    trace!("Entering get_audit_logs function");

    let page = audit::page(
        &state.db,
        &AuditQuery {
            page: query.page,
            page_size: query.page_size,
            entity_name: query.entity,
        },
    )
    .await?;

    info!("Retrieved {} of {} audit entries", page.items.len(), page.total);
    Ok(Json(ApiResponse::new(
        AuditPageResponse {
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            items: page.items.into_iter().map(AuditLogResponse::from).collect(),
        },
        "Audit entries retrieved successfully",
    )))
}
