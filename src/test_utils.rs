use crate::auth::{jwt::issue_token, password::hash_password};
use crate::config::{JwtSettings, Settings};
use crate::router::create_router;
use crate::schemas::AppState;
use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use axum_test::{TestRequest, TestServer};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::user::{self, Role};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const TEST_PASSWORD: &str = "Passw0rd!";

pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        jwt: JwtSettings {
            secret: "integration-test-secret-integration-test".to_string(),
            issuer: "rentwise-test".to_string(),
            audience: "rentwise-test-clients".to_string(),
            access_token_minutes: 30,
        },
        cors_origins: Vec::new(),
    }
}

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Insert a user with [`TEST_PASSWORD`] and return a bearer token for it
pub async fn create_user_with_token(state: &AppState, username: &str, role: Role) -> String {
    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set(hash_password(TEST_PASSWORD).expect("Failed to hash password")),
        role: Set(role),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .expect("Failed to create test user");

    issue_token(&state.settings.jwt, &created)
        .expect("Failed to issue token")
        .token
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is determined by the RUST_LOG environment variable,
/// defaulting to WARN if not set.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// A running test server with one signed-in user per role
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub admin: String,
    pub manager: String,
    pub staff: String,
    pub tenant: String,
    _tracing: tracing::subscriber::DefaultGuard,
}

/// `Authorization` header for a token
fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header value"),
    )
}

impl TestApp {
    pub fn get(&self, path: &str, token: &str) -> TestRequest {
        let (name, value) = bearer(token);
        self.server.get(path).add_header(name, value)
    }

    pub fn post(&self, path: &str, token: &str) -> TestRequest {
        let (name, value) = bearer(token);
        self.server.post(path).add_header(name, value)
    }

    pub fn put(&self, path: &str, token: &str) -> TestRequest {
        let (name, value) = bearer(token);
        self.server.put(path).add_header(name, value)
    }

    pub fn delete(&self, path: &str, token: &str) -> TestRequest {
        let (name, value) = bearer(token);
        self.server.delete(path).add_header(name, value)
    }
}

pub async fn setup_test_app() -> TestApp {
    let guard = init_test_tracing();

    let state = AppState::new(setup_test_db().await, test_settings());
    let admin = create_user_with_token(&state, "admin_user", Role::Admin).await;
    let manager = create_user_with_token(&state, "manager_user", Role::Manager).await;
    let staff = create_user_with_token(&state, "staff_user", Role::Staff).await;
    let tenant = create_user_with_token(&state, "tenant_user", Role::Tenant).await;

    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
    TestApp {
        server,
        state,
        admin,
        manager,
        staff,
        tenant,
        _tracing: guard,
    }
}
