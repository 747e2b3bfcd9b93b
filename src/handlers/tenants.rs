use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditAction};
use domain::references::{ensure_tenant_email_free, ensure_tenant_removable};
use model::entities::tenant;
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AdminOnly, ManagerAndUp, Require, StaffAndUp};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "Tenant";

/// Request body for creating or replacing a tenant
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct TenantRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email, length(max = 200))]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

/// Query parameters for listing tenants
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TenantQuery {
    /// Case-insensitive match on first name, last name or email
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<tenant::Model> for TenantResponse {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn not_found(tenant_id: i32) -> ApiError {
    warn!("Tenant with ID {} not found", tenant_id);
    ApiError::not_found(format!("Tenant with id {tenant_id} not found"))
}

fn search_condition(term: &str) -> Condition {
    let pattern = format!("%{}%", term.to_lowercase());
    [
        tenant::Column::FirstName,
        tenant::Column::LastName,
        tenant::Column::Email,
    ]
    .into_iter()
    .fold(Condition::any(), |condition, column| {
        condition.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone()))
    })
}

/// Create a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    tag = "tenants",
    security(("bearer_auth" = [])),
    request_body = TenantRequest,
    responses(
        (status = 201, description = "Tenant created successfully", body = ApiResponse<TenantResponse>),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Requires Manager or Admin", body = ErrorResponse),
        (status = 409, description = "Email already used by another tenant", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_tenant(
    user: Require<ManagerAndUp>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<TenantRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TenantResponse>>)> {
    trace!("Entering create_tenant function");
    debug!("Creating tenant {} {}", request.first_name, request.last_name);

    let txn = state.db.begin().await?;
    ensure_tenant_email_free(&txn, &request.email, None).await?;

    let created = tenant::ActiveModel {
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        email: Set(request.email),
        phone: Set(request.phone),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(&txn, &user.username, AuditAction::Created, ENTITY, Some(created.id), None).await?;
    txn.commit().await?;

    info!("Tenant created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TenantResponse::from(created), "Tenant created successfully")),
    ))
}

/// List tenants, optionally filtered by a search term
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    tag = "tenants",
    security(("bearer_auth" = [])),
    params(TenantQuery),
    responses(
        (status = 200, description = "Tenants retrieved successfully", body = ApiResponse<Vec<TenantResponse>>),
        (status = 403, description = "Requires Staff or above", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tenants(
    _user: Require<StaffAndUp>,
    ApiQuery(query): ApiQuery<TenantQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<TenantResponse>>>> {
    trace!("Entering get_tenants function");

    let mut select = tenant::Entity::find();
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        debug!("Filtering tenants by '{}'", term);
        select = select.filter(search_condition(term));
    }
    let tenants = select
        .order_by_asc(tenant::Column::LastName)
        .order_by_asc(tenant::Column::FirstName)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} tenants", tenants.len());
    Ok(Json(ApiResponse::new(
        tenants.into_iter().map(TenantResponse::from).collect(),
        "Tenants retrieved successfully",
    )))
}

/// Get a specific tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{tenant_id}",
    tag = "tenants",
    security(("bearer_auth" = [])),
    params(
        ("tenant_id" = i32, Path, description = "Tenant ID"),
    ),
    responses(
        (status = 200, description = "Tenant retrieved successfully", body = ApiResponse<TenantResponse>),
        (status = 404, description = "Tenant not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tenant(
    _user: Require<StaffAndUp>,
    ApiPath(tenant_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<TenantResponse>>> {

    let tenant = tenant::Entity::find_by_id(tenant_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(tenant_id))?;

    Ok(Json(ApiResponse::new(TenantResponse::from(tenant), "Tenant retrieved successfully")))
}

/// Replace a tenant's fields
#[utoipa::path(
    put,
    path = "/api/v1/tenants/{tenant_id}",
    tag = "tenants",
    security(("bearer_auth" = [])),
    params(
        ("tenant_id" = i32, Path, description = "Tenant ID"),
    ),
    request_body = TenantRequest,
    responses(
        (status = 200, description = "Tenant updated successfully", body = ApiResponse<TenantResponse>),
        (status = 404, description = "Tenant not found", body = ErrorResponse),
        (status = 409, description = "Email already used by another tenant", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_tenant(
    user: Require<ManagerAndUp>,
    ApiPath(tenant_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<TenantRequest>,
) -> ApiResult<Json<ApiResponse<TenantResponse>>> {
    trace!("Entering update_tenant function for tenant_id: {}", tenant_id);

    let txn = state.db.begin().await?;
    let existing = tenant::Entity::find_by_id(tenant_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(tenant_id))?;
    ensure_tenant_email_free(&txn, &request.email, Some(tenant_id)).await?;

    let mut active: tenant::ActiveModel = existing.into();
    active.first_name = Set(request.first_name);
    active.last_name = Set(request.last_name);
    active.email = Set(request.email);
    active.phone = Set(request.phone);
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Updated, ENTITY, Some(updated.id), None).await?;
    txn.commit().await?;

    info!("Tenant {} updated", updated.id);
    Ok(Json(ApiResponse::new(TenantResponse::from(updated), "Tenant updated successfully")))
}

/// Delete a tenant without lease history
#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{tenant_id}",
    tag = "tenants",
    security(("bearer_auth" = [])),
    params(
        ("tenant_id" = i32, Path, description = "Tenant ID"),
    ),
    responses(
        (status = 200, description = "Tenant deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Requires Admin", body = ErrorResponse),
        (status = 404, description = "Tenant not found", body = ErrorResponse),
        (status = 409, description = "Tenant has leases", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_tenant(
    user: Require<AdminOnly>,
    ApiPath(tenant_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_tenant function for tenant_id: {}", tenant_id);

    let txn = state.db.begin().await?;
    let existing = tenant::Entity::find_by_id(tenant_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(tenant_id))?;

    ensure_tenant_removable(&txn, tenant_id).await?;
    existing.delete(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Deleted, ENTITY, Some(tenant_id), None).await?;
    txn.commit().await?;

    info!("Tenant {} deleted", tenant_id);
    Ok(Json(ApiResponse::new(
        format!("Tenant {tenant_id} deleted"),
        "Tenant deleted successfully",
    )))
}
