use crate::error::{INTERNAL_ERROR_MESSAGE, error_body};
use crate::handlers::{
    admin::get_audit_logs,
    auth::{login, me, register},
    health::health_check,
    leases::{create_lease, delete_lease, get_lease, get_leases, update_lease},
    maintenance::{
        create_maintenance_request, delete_maintenance_request, get_maintenance_request,
        get_maintenance_requests, update_maintenance_request,
    },
    payments::{create_payment, get_lease_payment_total, get_lease_payments},
    properties::{create_property, delete_property, get_properties, get_property, update_property},
    tenants::{create_tenant, delete_tenant, get_tenant, get_tenants, update_tenant},
    units::{create_unit, delete_unit, get_unit, get_units, update_unit},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
};
use std::any::Any;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Turns a handler panic into the generic 500 body
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", details);
    error_body(
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE.to_string(),
        "INTERNAL_ERROR",
    )
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin)
    }
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        // Property CRUD routes
        .route("/api/v1/properties", get(get_properties).post(create_property))
        .route(
            "/api/v1/properties/:property_id",
            get(get_property).put(update_property).delete(delete_property),
        )
        // Unit CRUD routes
        .route("/api/v1/units", get(get_units).post(create_unit))
        .route(
            "/api/v1/units/:unit_id",
            get(get_unit).put(update_unit).delete(delete_unit),
        )
        // Tenant CRUD routes
        .route("/api/v1/tenants", get(get_tenants).post(create_tenant))
        .route(
            "/api/v1/tenants/:tenant_id",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
        // Lease CRUD routes
        .route("/api/v1/leases", get(get_leases).post(create_lease))
        .route(
            "/api/v1/leases/:lease_id",
            get(get_lease).put(update_lease).delete(delete_lease),
        )
        // Payments
        .route("/api/v1/payments", post(create_payment))
        .route("/api/v1/leases/:lease_id/payments", get(get_lease_payments))
        .route(
            "/api/v1/leases/:lease_id/payments/total",
            get(get_lease_payment_total),
        )
        // Maintenance requests
        .route(
            "/api/v1/maintenance",
            get(get_maintenance_requests).post(create_maintenance_request),
        )
        .route(
            "/api/v1/maintenance/:request_id",
            get(get_maintenance_request)
                .put(update_maintenance_request)
                .delete(delete_maintenance_request),
        )
        // Administration
        .route("/api/v1/admin/audit", get(get_audit_logs))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(cors),
        )
        .with_state(state)
}
