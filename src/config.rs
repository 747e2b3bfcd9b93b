use anyhow::Result;
use config::{Config, Environment};
use sea_orm::Database;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rentwise.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Signing parameters for access tokens
#[derive(Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_minutes: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_minutes", &self.access_token_minutes)
            .finish()
    }
}

/// Runtime configuration, layered from defaults and `RENTWISE__*` variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt: JwtSettings,
    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Settings {
    /// Load settings, e.g. `RENTWISE__JWT__SECRET=...` or
    /// `RENTWISE__CORS_ORIGINS=http://localhost:5173,https://app.example.com`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("jwt.secret", "change-me-in-production-please-32-bytes!")?
            .set_default("jwt.issuer", "rentwise")?
            .set_default("jwt.audience", "rentwise-clients")?
            .set_default("jwt.access_token_minutes", 120)?
            .set_default("cors_origins", Vec::<String>::new())?
            .add_source(
                Environment::with_prefix("RENTWISE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        debug!(
            "Loaded settings: bind_address={}, issuer={}, {} CORS origin(s)",
            settings.bind_address,
            settings.jwt.issuer,
            settings.cors_origins.len()
        );
        Ok(settings)
    }

    /// Command-line values win over file and environment values
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }
}

/// Initialize application state from already resolved settings
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    Ok(AppState::new(db, settings))
}
