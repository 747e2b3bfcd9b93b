use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

use crate::config::Settings;
use crate::handlers::{
    admin::{AuditLogQuery, AuditLogResponse, AuditPageResponse},
    auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
    leases::{CreateLeaseRequest, LeaseQuery, LeaseResponse, UpdateLeaseRequest},
    maintenance::{
        CreateMaintenanceRequest, MaintenanceQuery, MaintenanceResponse, UpdateMaintenanceRequest,
    },
    payments::{CreatePaymentRequest, PaymentResponse, PaymentTotalResponse},
    properties::{PropertyRequest, PropertyResponse},
    tenants::{TenantQuery, TenantRequest, TenantResponse},
    units::{UnitQuery, UnitRequest, UnitResponse},
};
use model::entities::{
    maintenance_request::{MaintenancePriority, MaintenanceStatus},
    payment::PaymentMethod,
    user::Role,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Resolved configuration
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
        }
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Registers the bearer scheme used by every protected route
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::properties::create_property,
        crate::handlers::properties::get_properties,
        crate::handlers::properties::get_property,
        crate::handlers::properties::update_property,
        crate::handlers::properties::delete_property,
        crate::handlers::units::create_unit,
        crate::handlers::units::get_units,
        crate::handlers::units::get_unit,
        crate::handlers::units::update_unit,
        crate::handlers::units::delete_unit,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::get_tenants,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::update_tenant,
        crate::handlers::tenants::delete_tenant,
        crate::handlers::leases::create_lease,
        crate::handlers::leases::get_leases,
        crate::handlers::leases::get_lease,
        crate::handlers::leases::update_lease,
        crate::handlers::leases::delete_lease,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_lease_payments,
        crate::handlers::payments::get_lease_payment_total,
        crate::handlers::maintenance::create_maintenance_request,
        crate::handlers::maintenance::get_maintenance_requests,
        crate::handlers::maintenance::get_maintenance_request,
        crate::handlers::maintenance::update_maintenance_request,
        crate::handlers::maintenance::delete_maintenance_request,
        crate::handlers::admin::get_audit_logs,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            MeResponse,
            Role,
            PropertyRequest,
            PropertyResponse,
            UnitRequest,
            UnitQuery,
            UnitResponse,
            TenantRequest,
            TenantQuery,
            TenantResponse,
            CreateLeaseRequest,
            UpdateLeaseRequest,
            LeaseQuery,
            LeaseResponse,
            CreatePaymentRequest,
            PaymentResponse,
            PaymentTotalResponse,
            PaymentMethod,
            CreateMaintenanceRequest,
            UpdateMaintenanceRequest,
            MaintenanceQuery,
            MaintenanceResponse,
            MaintenancePriority,
            MaintenanceStatus,
            AuditLogQuery,
            AuditLogResponse,
            AuditPageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and current user"),
        (name = "properties", description = "Property management"),
        (name = "units", description = "Units inside properties"),
        (name = "tenants", description = "Tenant records"),
        (name = "leases", description = "Leases and overlap validation"),
        (name = "payments", description = "Rent payments recorded against leases"),
        (name = "maintenance", description = "Maintenance requests"),
        (name = "admin", description = "Administrative endpoints"),
    ),
    info(
        title = "Rentwise API",
        description = "Rental property management API - properties, units, tenants, leases, payments and maintenance",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
