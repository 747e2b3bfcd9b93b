use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use model::entities::user::{self, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::{AuthUser, jwt::issue_token, password};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

fn validate_strong_password(value: &str) -> Result<(), ValidationError> {
    if password::is_strong(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("weak_password");
        err.message = Some(
            "Password must be at least 8 characters with upper, lower, digit and symbol.".into(),
        );
        Err(err)
    }
}

/// Request body for registering a user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email, length(max = 200))]
    pub email: String,
    #[validate(custom(function = "validate_strong_password"))]
    pub password: String,
    /// Defaults to Manager
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username_or_email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_at_utc: DateTime<Utc>,
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

fn auth_response(state: &AppState, user: user::Model) -> ApiResult<AuthResponse> {
    let issued = issue_token(&state.settings.jwt, &user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(AuthResponse {
        access_token: issued.token,
        expires_at_utc: issued.expires_at,
        user_id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}

/// Register a new user and return an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username or email already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    trace!("Entering register function");

    let username_taken = user::Entity::find()
        .filter(user::Column::Username.eq(&request.username))
        .count(&state.db)
        .await?
        > 0;
    if username_taken {
        warn!("Registration rejected: username {} exists", request.username);
        return Err(ApiError::Conflict("Username already exists.".to_string()));
    }

    let email_taken = user::Entity::find()
        .filter(user::Column::Email.eq(&request.email))
        .count(&state.db)
        .await?
        > 0;
    if email_taken {
        warn!("Registration rejected: email {} exists", request.email);
        return Err(ApiError::Conflict("Email already exists.".to_string()));
    }

    let password_hash =
        password::hash_password(&request.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let created = user::ActiveModel {
        username: Set(request.username),
        email: Set(request.email),
        password_hash: Set(password_hash),
        role: Set(request.role.unwrap_or_default()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User {} registered with role {}", created.username, created.role.as_str());
    Ok(Json(ApiResponse::new(
        auth_response(&state, created)?,
        "User registered successfully",
    )))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    trace!("Entering login function");

    let found = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(&request.username_or_email))
                .add(user::Column::Email.eq(&request.username_or_email)),
        )
        .one(&state.db)
        .await?;

    let Some(user) = found.filter(|u| password::verify_password(&request.password, &u.password_hash))
    else {
        warn!("Failed login for {}", request.username_or_email);
        return Err(ApiError::unauthorized("Invalid credentials."));
    };

    debug!("User {} authenticated", user.username);
    Ok(Json(ApiResponse::new(
        auth_response(&state, user)?,
        "Login successful",
    )))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<MeResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MeResponse>>> {
    let Some(user) = user::Entity::find_by_id(auth.user_id).one(&state.db).await? else {
        warn!("Token subject {} no longer exists", auth.user_id);
        return Err(ApiError::unauthorized("User no longer exists."));
    };

    Ok(Json(ApiResponse::new(
        MeResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        },
        "Current user retrieved successfully",
    )))
}
