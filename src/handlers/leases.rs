use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditAction};
use domain::lease::{self as lease_rules, LeaseTerms};
use model::entities::lease;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AdminOnly, ManagerAndUp, Require, StaffAndUp};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "Lease";

/// Request body for creating a lease. New leases are always active.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateLeaseRequest {
    #[validate(range(min = 1))]
    pub unit_id: i32,
    #[validate(range(min = 1))]
    pub tenant_id: i32,
    /// Inclusive start of the tenancy
    pub start_date_utc: DateTime<Utc>,
    /// Exclusive end of the tenancy
    pub end_date_utc: DateTime<Utc>,
    #[serde(default)]
    pub monthly_rent: Decimal,
    #[serde(default)]
    pub security_deposit: Decimal,
}

impl CreateLeaseRequest {
    fn terms(&self) -> LeaseTerms {
        LeaseTerms {
            unit_id: self.unit_id,
            tenant_id: self.tenant_id,
            start: self.start_date_utc,
            end: self.end_date_utc,
            monthly_rent: self.monthly_rent,
            security_deposit: self.security_deposit,
        }
    }
}

/// Request body for replacing a lease
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateLeaseRequest {
    #[validate(range(min = 1))]
    pub unit_id: i32,
    #[validate(range(min = 1))]
    pub tenant_id: i32,
    pub start_date_utc: DateTime<Utc>,
    pub end_date_utc: DateTime<Utc>,
    #[serde(default)]
    pub monthly_rent: Decimal,
    #[serde(default)]
    pub security_deposit: Decimal,
    pub is_active: bool,
}

impl UpdateLeaseRequest {
    fn terms(&self) -> LeaseTerms {
        LeaseTerms {
            unit_id: self.unit_id,
            tenant_id: self.tenant_id,
            start: self.start_date_utc,
            end: self.end_date_utc,
            monthly_rent: self.monthly_rent,
            security_deposit: self.security_deposit,
        }
    }
}

/// Query parameters for listing leases
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct LeaseQuery {
    pub unit_id: Option<i32>,
    pub tenant_id: Option<i32>,
    /// Only active (true) or inactive (false) leases
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaseResponse {
    pub id: i32,
    pub unit_id: i32,
    pub tenant_id: i32,
    pub start_date_utc: DateTime<Utc>,
    pub end_date_utc: DateTime<Utc>,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub is_active: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

impl From<lease::Model> for LeaseResponse {
    fn from(model: lease::Model) -> Self {
        Self {
            id: model.id,
            unit_id: model.unit_id,
            tenant_id: model.tenant_id,
            start_date_utc: model.start_date_utc,
            end_date_utc: model.end_date_utc,
            monthly_rent: model.monthly_rent,
            security_deposit: model.security_deposit,
            is_active: model.is_active,
            created_at_utc: model.created_at_utc,
            updated_at_utc: model.updated_at_utc,
        }
    }
}

fn not_found(lease_id: i32) -> ApiError {
    warn!("Lease with ID {} not found", lease_id);
    ApiError::not_found(format!("Lease with id {lease_id} not found"))
}

/// Create a lease after checking it against the unit's active leases
#[utoipa::path(
    post,
    path = "/api/v1/leases",
    tag = "leases",
    security(("bearer_auth" = [])),
    request_body = CreateLeaseRequest,
    responses(
        (status = 201, description = "Lease created successfully", body = ApiResponse<LeaseResponse>),
        (status = 400, description = "Invalid terms, or unit/tenant missing", body = ErrorResponse),
        (status = 403, description = "Requires Manager or Admin", body = ErrorResponse),
        (status = 409, description = "Unit already has an active overlapping lease", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_lease(
    user: Require<ManagerAndUp>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateLeaseRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LeaseResponse>>)> {
    trace!("Entering create_lease function");
    debug!(
        "Creating lease for unit {} and tenant {} over [{}, {})",
        request.unit_id, request.tenant_id, request.start_date_utc, request.end_date_utc
    );

    let terms = request.terms();
    let txn = state.db.begin().await?;
    lease_rules::check_new_lease(&txn, &terms).await?;

    let now = Utc::now();
    let created = lease::ActiveModel {
        unit_id: Set(terms.unit_id),
        tenant_id: Set(terms.tenant_id),
        start_date_utc: Set(terms.start),
        end_date_utc: Set(terms.end),
        monthly_rent: Set(terms.monthly_rent),
        security_deposit: Set(terms.security_deposit),
        is_active: Set(true),
        created_at_utc: Set(now),
        updated_at_utc: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(
        &txn,
        &user.username,
        AuditAction::Created,
        ENTITY,
        Some(created.id),
        Some(format!("unit {} tenant {}", created.unit_id, created.tenant_id)),
    )
    .await?;
    txn.commit().await?;

    info!("Lease created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(LeaseResponse::from(created), "Lease created successfully")),
    ))
}

/// List leases with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/leases",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(LeaseQuery),
    responses(
        (status = 200, description = "Leases retrieved successfully", body = ApiResponse<Vec<LeaseResponse>>),
        (status = 403, description = "Requires Staff or above", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_leases(
    _user: Require<StaffAndUp>,
    ApiQuery(query): ApiQuery<LeaseQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<LeaseResponse>>>> {
    trace!("Entering get_leases function");

    let mut select = lease::Entity::find();
    if let Some(unit_id) = query.unit_id {
        select = select.filter(lease::Column::UnitId.eq(unit_id));
    }
    if let Some(tenant_id) = query.tenant_id {
        select = select.filter(lease::Column::TenantId.eq(tenant_id));
    }
    if let Some(active) = query.active {
        select = select.filter(lease::Column::IsActive.eq(active));
    }

    let leases = select
        .order_by_desc(lease::Column::StartDateUtc)
        .order_by_desc(lease::Column::Id)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} leases", leases.len());
    Ok(Json(ApiResponse::new(
        leases.into_iter().map(LeaseResponse::from).collect(),
        "Leases retrieved successfully",
    )))
}

/// Get a specific lease by ID
#[utoipa::path(
    get,
    path = "/api/v1/leases/{lease_id}",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(
        ("lease_id" = i32, Path, description = "Lease ID"),
    ),
    responses(
        (status = 200, description = "Lease retrieved successfully", body = ApiResponse<LeaseResponse>),
        (status = 404, description = "Lease not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_lease(
    _user: Require<StaffAndUp>,
    ApiPath(lease_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<LeaseResponse>>> {

    let lease = lease::Entity::find_by_id(lease_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(lease_id))?;

    Ok(Json(ApiResponse::new(LeaseResponse::from(lease), "Lease retrieved successfully")))
}

/// Replace a lease's terms; moving or reactivating it re-runs the overlap check
#[utoipa::path(
    put,
    path = "/api/v1/leases/{lease_id}",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(
        ("lease_id" = i32, Path, description = "Lease ID"),
    ),
    request_body = UpdateLeaseRequest,
    responses(
        (status = 200, description = "Lease updated successfully", body = ApiResponse<LeaseResponse>),
        (status = 400, description = "Invalid terms, or unit/tenant missing", body = ErrorResponse),
        (status = 404, description = "Lease not found", body = ErrorResponse),
        (status = 409, description = "Unit already has an active overlapping lease", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_lease(
    user: Require<ManagerAndUp>,
    ApiPath(lease_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UpdateLeaseRequest>,
) -> ApiResult<Json<ApiResponse<LeaseResponse>>> {
    trace!("Entering update_lease function for lease_id: {}", lease_id);

    let terms = request.terms();
    let txn = state.db.begin().await?;
    let existing = lease::Entity::find_by_id(lease_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(lease_id))?;

    lease_rules::check_lease_update(&txn, &existing, &terms, request.is_active).await?;

    let mut active: lease::ActiveModel = existing.into();
    active.unit_id = Set(terms.unit_id);
    active.tenant_id = Set(terms.tenant_id);
    active.start_date_utc = Set(terms.start);
    active.end_date_utc = Set(terms.end);
    active.monthly_rent = Set(terms.monthly_rent);
    active.security_deposit = Set(terms.security_deposit);
    active.is_active = Set(request.is_active);
    active.updated_at_utc = Set(Some(Utc::now()));

    let updated = active.update(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Updated, ENTITY, Some(updated.id), None).await?;
    txn.commit().await?;

    info!("Lease {} updated", updated.id);
    Ok(Json(ApiResponse::new(LeaseResponse::from(updated), "Lease updated successfully")))
}

/// Delete a lease together with its payments
#[utoipa::path(
    delete,
    path = "/api/v1/leases/{lease_id}",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(
        ("lease_id" = i32, Path, description = "Lease ID"),
    ),
    responses(
        (status = 200, description = "Lease deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Requires Admin", body = ErrorResponse),
        (status = 404, description = "Lease not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_lease(
    user: Require<AdminOnly>,
    ApiPath(lease_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_lease function for lease_id: {}", lease_id);

    let txn = state.db.begin().await?;
    let Some(removed) = lease_rules::delete_lease(&txn, lease_id).await? else {
        return Err(not_found(lease_id));
    };
    audit::record(
        &txn,
        &user.username,
        AuditAction::Deleted,
        ENTITY,
        Some(lease_id),
        Some(format!("unit {} tenant {}", removed.unit_id, removed.tenant_id)),
    )
    .await?;
    txn.commit().await?;

    info!("Lease {} deleted", lease_id);
    Ok(Json(ApiResponse::new(
        format!("Lease {lease_id} deleted"),
        "Lease deleted successfully",
    )))
}
