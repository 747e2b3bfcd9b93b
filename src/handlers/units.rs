use axum::{extract::State, http::StatusCode, response::Json};
use domain::audit::{self, AuditAction};
use domain::references::{ensure_exists, ensure_unit_number_free, ensure_unit_removable};
use model::entities::{property, unit};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::auth::{AdminOnly, ManagerAndUp, Require, StaffAndUp};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "Unit";

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// Request body for creating or replacing a unit
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UnitRequest {
    #[validate(range(min = 1))]
    pub property_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub unit_number: String,
    #[validate(range(min = 0))]
    pub bedrooms: i32,
    #[validate(range(min = 0))]
    pub bathrooms: i32,
    #[validate(custom(function = "non_negative"))]
    pub rent: Decimal,
    #[validate(range(min = 0))]
    pub size_sq_ft: i32,
    /// Defaults to false
    pub is_occupied: Option<bool>,
}

/// Query parameters for listing units
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct UnitQuery {
    /// Only units of this property
    pub property_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnitResponse {
    pub id: i32,
    pub property_id: i32,
    pub unit_number: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub rent: Decimal,
    pub size_sq_ft: i32,
    pub is_occupied: bool,
}

impl From<unit::Model> for UnitResponse {
    fn from(model: unit::Model) -> Self {
        Self {
            id: model.id,
            property_id: model.property_id,
            unit_number: model.unit_number,
            bedrooms: model.bedrooms,
            bathrooms: model.bathrooms,
            rent: model.rent,
            size_sq_ft: model.size_sq_ft,
            is_occupied: model.is_occupied,
        }
    }
}

fn not_found(unit_id: i32) -> ApiError {
    warn!("Unit with ID {} not found", unit_id);
    ApiError::not_found(format!("Unit with id {unit_id} not found"))
}

/// Create a new unit inside a property
#[utoipa::path(
    post,
    path = "/api/v1/units",
    tag = "units",
    security(("bearer_auth" = [])),
    request_body = UnitRequest,
    responses(
        (status = 201, description = "Unit created successfully", body = ApiResponse<UnitResponse>),
        (status = 400, description = "Invalid request or missing property", body = ErrorResponse),
        (status = 403, description = "Requires Manager or Admin", body = ErrorResponse),
        (status = 409, description = "Unit number already used in the property", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_unit(
    user: Require<ManagerAndUp>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UnitRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UnitResponse>>)> {
    trace!("Entering create_unit function");
    debug!("Creating unit {} in property {}", request.unit_number, request.property_id);

    let txn = state.db.begin().await?;
    ensure_exists::<property::Entity, _>(&txn, request.property_id, "Property").await?;
    ensure_unit_number_free(&txn, request.property_id, &request.unit_number, None).await?;

    let created = unit::ActiveModel {
        property_id: Set(request.property_id),
        unit_number: Set(request.unit_number),
        bedrooms: Set(request.bedrooms),
        bathrooms: Set(request.bathrooms),
        rent: Set(request.rent),
        size_sq_ft: Set(request.size_sq_ft),
        is_occupied: Set(request.is_occupied.unwrap_or(false)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(&txn, &user.username, AuditAction::Created, ENTITY, Some(created.id), None).await?;
    txn.commit().await?;

    info!("Unit created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UnitResponse::from(created), "Unit created successfully")),
    ))
}

/// List units, optionally of one property
#[utoipa::path(
    get,
    path = "/api/v1/units",
    tag = "units",
    security(("bearer_auth" = [])),
    params(UnitQuery),
    responses(
        (status = 200, description = "Units retrieved successfully", body = ApiResponse<Vec<UnitResponse>>),
        (status = 403, description = "Requires Staff or above", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_units(
    _user: Require<StaffAndUp>,
    ApiQuery(query): ApiQuery<UnitQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<UnitResponse>>>> {
    trace!("Entering get_units function");

    let mut select = unit::Entity::find();
    if let Some(property_id) = query.property_id {
        select = select.filter(unit::Column::PropertyId.eq(property_id));
    }
    let units = select
        .order_by_asc(unit::Column::PropertyId)
        .order_by_asc(unit::Column::UnitNumber)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} units", units.len());
    Ok(Json(ApiResponse::new(
        units.into_iter().map(UnitResponse::from).collect(),
        "Units retrieved successfully",
    )))
}

/// Get a specific unit by ID
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}",
    tag = "units",
    security(("bearer_auth" = [])),
    params(
        ("unit_id" = i32, Path, description = "Unit ID"),
    ),
    responses(
        (status = 200, description = "Unit retrieved successfully", body = ApiResponse<UnitResponse>),
        (status = 404, description = "Unit not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_unit(
    _user: Require<StaffAndUp>,
    ApiPath(unit_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<UnitResponse>>> {

    let unit = unit::Entity::find_by_id(unit_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(unit_id))?;

    Ok(Json(ApiResponse::new(UnitResponse::from(unit), "Unit retrieved successfully")))
}

/// Replace a unit's fields
#[utoipa::path(
    put,
    path = "/api/v1/units/{unit_id}",
    tag = "units",
    security(("bearer_auth" = [])),
    params(
        ("unit_id" = i32, Path, description = "Unit ID"),
    ),
    request_body = UnitRequest,
    responses(
        (status = 200, description = "Unit updated successfully", body = ApiResponse<UnitResponse>),
        (status = 404, description = "Unit not found", body = ErrorResponse),
        (status = 409, description = "Unit number already used in the property", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_unit(
    user: Require<ManagerAndUp>,
    ApiPath(unit_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UnitRequest>,
) -> ApiResult<Json<ApiResponse<UnitResponse>>> {
    trace!("Entering update_unit function for unit_id: {}", unit_id);

    let txn = state.db.begin().await?;
    let existing = unit::Entity::find_by_id(unit_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(unit_id))?;

    if existing.property_id != request.property_id {
        ensure_exists::<property::Entity, _>(&txn, request.property_id, "Property").await?;
    }
    ensure_unit_number_free(&txn, request.property_id, &request.unit_number, Some(unit_id)).await?;

    let mut active: unit::ActiveModel = existing.into();
    active.property_id = Set(request.property_id);
    active.unit_number = Set(request.unit_number);
    active.bedrooms = Set(request.bedrooms);
    active.bathrooms = Set(request.bathrooms);
    active.rent = Set(request.rent);
    active.size_sq_ft = Set(request.size_sq_ft);
    if let Some(is_occupied) = request.is_occupied {
        active.is_occupied = Set(is_occupied);
    }

    let updated = active.update(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Updated, ENTITY, Some(updated.id), None).await?;
    txn.commit().await?;

    info!("Unit {} updated", updated.id);
    Ok(Json(ApiResponse::new(UnitResponse::from(updated), "Unit updated successfully")))
}

/// Delete a unit without lease history
#[utoipa::path(
    delete,
    path = "/api/v1/units/{unit_id}",
    tag = "units",
    security(("bearer_auth" = [])),
    params(
        ("unit_id" = i32, Path, description = "Unit ID"),
    ),
    responses(
        (status = 200, description = "Unit deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Requires Admin", body = ErrorResponse),
        (status = 404, description = "Unit not found", body = ErrorResponse),
        (status = 409, description = "Unit has leases", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_unit(
    user: Require<AdminOnly>,
    ApiPath(unit_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_unit function for unit_id: {}", unit_id);

    let txn = state.db.begin().await?;
    let existing = unit::Entity::find_by_id(unit_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(unit_id))?;

    ensure_unit_removable(&txn, unit_id).await?;
    existing.delete(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Deleted, ENTITY, Some(unit_id), None).await?;
    txn.commit().await?;

    info!("Unit {} deleted", unit_id);
    Ok(Json(ApiResponse::new(
        format!("Unit {unit_id} deleted"),
        "Unit deleted successfully",
    )))
}
