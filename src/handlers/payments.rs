use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use domain::audit::{self, AuditAction};
use domain::payment::{admit_payment, payments_for_lease, total_paid};
use model::entities::{lease, payment};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{ManagerAndUp, Require, StaffAndUp};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ValidJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

const ENTITY: &str = "Payment";

/// Request body for recording a payment.
///
/// `amount` is checked by the admission rules, after the lease checks.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreatePaymentRequest {
    #[validate(range(min = 1))]
    pub lease_id: i32,
    /// Defaults to now
    pub paid_on_utc: Option<DateTime<Utc>>,
    pub amount: Decimal,
    /// Defaults to Cash
    pub method: Option<payment::PaymentMethod>,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub lease_id: i32,
    pub paid_on_utc: DateTime<Utc>,
    pub amount: Decimal,
    pub method: payment::PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            lease_id: model.lease_id,
            paid_on_utc: model.paid_on_utc,
            amount: model.amount,
            method: model.method,
            reference: model.reference,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentTotalResponse {
    pub lease_id: i32,
    pub total: Decimal,
}

async fn require_lease(db: &DatabaseConnection, lease_id: i32) -> ApiResult<lease::Model> {
    lease::Entity::find_by_id(lease_id).one(db).await?.ok_or_else(|| {
        warn!("Lease with ID {} not found", lease_id);
        ApiError::not_found(format!("Lease with id {lease_id} not found"))
    })
}

/// Record a payment against an active lease
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Lease does not exist or amount not positive", body = ErrorResponse),
        (status = 403, description = "Requires Manager or Admin", body = ErrorResponse),
        (status = 409, description = "Lease is inactive", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_payment(
    user: Require<ManagerAndUp>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaymentResponse>>)> {
    trace!("Entering create_payment function");
    debug!("Recording payment of {} on lease {}", request.amount, request.lease_id);

    let txn = state.db.begin().await?;
    admit_payment(&txn, request.lease_id, request.amount).await?;

    let created = payment::ActiveModel {
        lease_id: Set(request.lease_id),
        paid_on_utc: Set(request.paid_on_utc.unwrap_or_else(Utc::now)),
        amount: Set(request.amount),
        method: Set(request.method.unwrap_or_default()),
        reference: Set(request.reference),
        notes: Set(request.notes),
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
        Some(format!("lease {} amount {}", created.lease_id, created.amount)),
    )
    .await?;
    txn.commit().await?;

    info!("Payment {} recorded on lease {}", created.id, created.lease_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PaymentResponse::from(created), "Payment recorded successfully")),
    ))
}

/// Payments of a lease, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leases/{lease_id}/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("lease_id" = i32, Path, description = "Lease ID"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Lease not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_lease_payments(
    _user: Require<StaffAndUp>,
    ApiPath(lease_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentResponse>>>> {
    trace!("Entering get_lease_payments function for lease_id: {}", lease_id);

    require_lease(&state.db, lease_id).await?;
    let payments = payments_for_lease(&state.db, lease_id).await?;

    info!("Retrieved {} payments for lease {}", payments.len(), lease_id);
    Ok(Json(ApiResponse::new(
        payments.into_iter().map(PaymentResponse::from).collect(),
        "Payments retrieved successfully",
    )))
}

/// Exact total paid on a lease
#[utoipa::path(
    get,
    path = "/api/v1/leases/{lease_id}/payments/total",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("lease_id" = i32, Path, description = "Lease ID"),
    ),
    responses(
        (status = 200, description = "Total computed successfully", body = ApiResponse<PaymentTotalResponse>),
        (status = 404, description = "Lease not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_lease_payment_total(
    _user: Require<StaffAndUp>,
    ApiPath(lease_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PaymentTotalResponse>>> {

    require_lease(&state.db, lease_id).await?;
    let total = total_paid(&state.db, lease_id).await?;

    debug!("Lease {} total paid {}", lease_id, total);
    Ok(Json(ApiResponse::new(
        PaymentTotalResponse { lease_id, total },
        "Payment total computed successfully",
    )))
}
