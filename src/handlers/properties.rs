use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditAction};
use domain::references::ensure_property_removable;
use model::entities::property;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "Property";

/// Request body for creating or replacing a property
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct PropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

/// Property response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PropertyResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<property::Model> for PropertyResponse {
    fn from(model: property::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            zip: model.zip,
            country: model.country,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn not_found(property_id: i32) -> ApiError {
    warn!("Property with ID {} not found", property_id);
    ApiError::not_found(format!("Property with id {property_id} not found"))
}

/// Create a new property
#[utoipa::path(
    post,
    path = "/api/v1/properties",
    tag = "properties",
    security(("bearer_auth" = [])),
    request_body = PropertyRequest,
    responses(
        (status = 201, description = "Property created successfully", body = ApiResponse<PropertyResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_property(
    user: AuthUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<PropertyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PropertyResponse>>)> {
    trace!("Entering create_property function");
    debug!("Creating property with name: {}", request.name);

    let txn = state.db.begin().await?;
    let created = property::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        address_line1: Set(request.address_line1),
        address_line2: Set(request.address_line2),
        city: Set(request.city),
        state: Set(request.state),
        zip: Set(request.zip),
        country: Set(request.country),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(&txn, &user.username, AuditAction::Created, ENTITY, Some(created.id), None).await?;
    txn.commit().await?;

    info!("Property created successfully with ID: {}, name: {}", created.id, created.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PropertyResponse::from(created), "Property created successfully")),
    ))
}

/// Get all properties
#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "properties",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Properties retrieved successfully", body = ApiResponse<Vec<PropertyResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_properties(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PropertyResponse>>>> {
    trace!("Entering get_properties function");

    let properties = property::Entity::find()
        .order_by_asc(property::Column::Name)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} properties", properties.len());
    Ok(Json(ApiResponse::new(
        properties.into_iter().map(PropertyResponse::from).collect(),
        "Properties retrieved successfully",
    )))
}

/// Get a specific property by ID
#[utoipa::path(
    get,
    path = "/api/v1/properties/{property_id}",
    tag = "properties",
    security(("bearer_auth" = [])),
    params(
        ("property_id" = i32, Path, description = "Property ID"),
    ),
    responses(
        (status = 200, description = "Property retrieved successfully", body = ApiResponse<PropertyResponse>),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_property(
    _user: AuthUser,
    ApiPath(property_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PropertyResponse>>> {
    trace!("Entering get_property function for property_id: {}", property_id);

    let property = property::Entity::find_by_id(property_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(property_id))?;

    Ok(Json(ApiResponse::new(
        PropertyResponse::from(property),
        "Property retrieved successfully",
    )))
}

/// Replace a property's fields
#[utoipa::path(
    put,
    path = "/api/v1/properties/{property_id}",
    tag = "properties",
    security(("bearer_auth" = [])),
    params(
        ("property_id" = i32, Path, description = "Property ID"),
    ),
    request_body = PropertyRequest,
    responses(
        (status = 200, description = "Property updated successfully", body = ApiResponse<PropertyResponse>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_property(
    user: AuthUser,
    ApiPath(property_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<PropertyRequest>,
) -> ApiResult<Json<ApiResponse<PropertyResponse>>> {
    trace!("Entering update_property function for property_id: {}", property_id);

    let txn = state.db.begin().await?;
    let existing = property::Entity::find_by_id(property_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(property_id))?;

    let mut active: property::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.description = Set(request.description);
    active.address_line1 = Set(request.address_line1);
    active.address_line2 = Set(request.address_line2);
    active.city = Set(request.city);
    active.state = Set(request.state);
    active.zip = Set(request.zip);
    active.country = Set(request.country);
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Updated, ENTITY, Some(updated.id), None).await?;
    txn.commit().await?;

    info!("Property {} updated", updated.id);
    Ok(Json(ApiResponse::new(
        PropertyResponse::from(updated),
        "Property updated successfully",
    )))
}

/// Delete a property and its units
#[utoipa::path(
    delete,
    path = "/api/v1/properties/{property_id}",
    tag = "properties",
    security(("bearer_auth" = [])),
    params(
        ("property_id" = i32, Path, description = "Property ID"),
    ),
    responses(
        (status = 200, description = "Property deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 409, description = "A unit of the property has leases", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_property(
    user: AuthUser,
    ApiPath(property_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_property function for property_id: {}", property_id);

    let txn = state.db.begin().await?;
    let existing = property::Entity::find_by_id(property_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(property_id))?;

    ensure_property_removable(&txn, property_id).await?;
    existing.delete(&txn).await?;
    audit::record(&txn, &user.username, AuditAction::Deleted, ENTITY, Some(property_id), None).await?;
    txn.commit().await?;

    info!("Property {} deleted", property_id);
    Ok(Json(ApiResponse::new(
        format!("Property {property_id} deleted"),
        "Property deleted successfully",
    )))
}
