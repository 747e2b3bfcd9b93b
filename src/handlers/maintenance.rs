use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditAction};
use domain::references::ensure_maintenance_references;
use model::entities::maintenance_request::{self, MaintenancePriority, MaintenanceStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AdminOnly, ManagerAndUp, Require, StaffAndUp};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "MaintenanceRequest";

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateMaintenanceRequest {
    #[validate(range(min = 1))]
    pub property_id: i32,
    pub unit_id: Option<i32>,
    pub tenant_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Defaults to Medium
    pub priority: Option<MaintenancePriority>,
    /// Defaults to Open
    pub status: Option<MaintenanceStatus>,
}

/// Editable fields of a request. Its property, unit and tenant are fixed.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateMaintenanceRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct MaintenanceQuery {
    pub property_id: Option<i32>,
    pub unit_id: Option<i32>,
    pub tenant_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceResponse {
    pub id: i32,
    pub property_id: i32,
    pub unit_id: Option<i32>,
    pub tenant_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

impl From<maintenance_request::Model> for MaintenanceResponse {
    fn from(model: maintenance_request::Model) -> Self {
        Self {
            id: model.id,
            property_id: model.property_id,
            unit_id: model.unit_id,
            tenant_id: model.tenant_id,
            title: model.title,
            description: model.description,
            priority: model.priority,
            status: model.status,
            created_at_utc: model.created_at_utc,
            updated_at_utc: model.updated_at_utc,
        }
    }
}

fn not_found(request_id: i32) -> ApiError {
    warn!("Maintenance request with ID {} not found", request_id);
    ApiError::not_found(format!("Maintenance request with id {request_id} not found"))
}

/// Open a maintenance request
#[utoipa::path(
    post,
    path = "/api/v1/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    request_body = CreateMaintenanceRequest,
    responses(
        (status = 201, description = "Maintenance request created successfully", body = ApiResponse<MaintenanceResponse>),
        (status = 400, description = "Invalid request or missing property/unit/tenant", body = ErrorResponse),
        (status = 403, description = "Requires Staff or above", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_maintenance_request(
    user: Require<StaffAndUp>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateMaintenanceRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MaintenanceResponse>>)> {
    trace!("Entering create_maintenance_request function");
    debug!("Creating maintenance request '{}' for property {}", request.title, request.property_id);

    let txn = state.db.begin().await?;
    ensure_maintenance_references(&txn, request.property_id, request.unit_id, request.tenant_id)
        .await?;

    let created = maintenance_request::ActiveModel {
        property_id: Set(request.property_id),
        unit_id: Set(request.unit_id),
        tenant_id: Set(request.tenant_id),
        title: Set(request.title),
        description: Set(request.description),
        priority: Set(request.priority.unwrap_or_default()),
        status: Set(request.status.unwrap_or_default()),
        created_at_utc: Set(Utc::now()),
        updated_at_utc: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(&txn, &user.username, AuditAction::Created, ENTITY, Some(created.id), None).await?;
    txn.commit().await?;

    info!("Maintenance request created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            MaintenanceResponse::from(created),
            "Maintenance request created successfully",
        )),
    ))
}

/// List maintenance requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(MaintenanceQuery),
    responses(
        (status = 200, description = "Maintenance requests retrieved successfully", body = ApiResponse<Vec<MaintenanceResponse>>),
        (status = 403, description = "Requires Staff or above", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_maintenance_requests(
    _user: Require<StaffAndUp>,
    ApiQuery(query): ApiQuery<MaintenanceQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<MaintenanceResponse>>>> {
    trace!("Entering get_maintenance_requests function");

    let mut select = maintenance_request::Entity::find();
    if let Some(property_id) = query.property_id {
        select = select.filter(maintenance_request::Column::PropertyId.eq(property_id));
    }
    if let Some(unit_id) = query.unit_id {
        select = select.filter(maintenance_request::Column::UnitId.eq(unit_id));
    }
    if let Some(tenant_id) = query.tenant_id {
        select = select.filter(maintenance_request::Column::TenantId.eq(tenant_id));
    }

    let requests = select
        .order_by_desc(maintenance_request::Column::CreatedAtUtc)
        .order_by_desc(maintenance_request::Column::Id)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} maintenance requests", requests.len());
    Ok(Json(ApiResponse::new(
        requests.into_iter().map(MaintenanceResponse::from).collect(),
        "Maintenance requests retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance/{request_id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("request_id" = i32, Path, description = "Maintenance request ID"),
    ),
    responses(
        (status = 200, description = "Maintenance request retrieved successfully", body = ApiResponse<MaintenanceResponse>),
        (status = 404, description = "Maintenance request not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_maintenance_request(
    _user: Require<StaffAndUp>,
    ApiPath(request_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<MaintenanceResponse>>> {

    let request = maintenance_request::Entity::find_by_id(request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(request_id))?;

    Ok(Json(ApiResponse::new(
        MaintenanceResponse::from(request),
        "Maintenance request retrieved successfully",
    )))
}

/// Update title, description, priority and status
#[utoipa::path(
    put,
    path = "/api/v1/maintenance/{request_id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("request_id" = i32, Path, description = "Maintenance request ID"),
    ),
    request_body = UpdateMaintenanceRequest,
    responses(
        (status = 200, description = "Maintenance request updated successfully", body = ApiResponse<MaintenanceResponse>),
        (status = 403, description = "Requires Manager or Admin", body = ErrorResponse),
        (status = 404, description = "Maintenance request not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_maintenance_request(
    user: Require<ManagerAndUp>,
    ApiPath(request_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UpdateMaintenanceRequest>,
) -> ApiResult<Json<ApiResponse<MaintenanceResponse>>> {
    trace!("Entering update_maintenance_request function for request_id: {}", request_id);

    let txn = state.db.begin().await?;
    let existing = maintenance_request::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(request_id))?;

    let mut active: maintenance_request::ActiveModel = existing.into();
    active.title = Set(request.title);
    active.description = Set(request.description);
    active.priority = Set(request.priority);
    active.status = Set(request.status);
    active.updated_at_utc = Set(Some(Utc::now()));

    let updated = active.update(&txn).await?;
    audit::record(
        &txn,
        &user.username,
        AuditAction::Updated,
        ENTITY,
        Some(updated.id),
        Some(format!("status {:?}", updated.status)),
    )
    .await?;
    txn.commit().await?;

    info!("Maintenance request {} updated", updated.id);
    Ok(Json(ApiResponse::new(
        MaintenanceResponse::from(updated),
        "Maintenance request updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/maintenance/{request_id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("request_id" = i32, Path, description = "Maintenance request ID"),
    ),
    responses(
        (status = 200, description = "Maintenance request deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Requires Admin", body = ErrorResponse),
        (status = 404, description = "Maintenance request not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_maintenance_request(
    user: Require<AdminOnly>,
    ApiPath(request_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_maintenance_request function for request_id: {}", request_id);

    let txn = state.db.begin().await?;
    let existing = maintenance_request::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(request_id))?;

    existing.delete(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Deleted, ENTITY, Some(request_id), None).await?;
    txn.commit().await?;

    info!("Maintenance request {} deleted", request_id);
    Ok(Json(ApiResponse::new(
        format!("Maintenance request {request_id} deleted"),
        "Maintenance request deleted successfully",
    )))
}
