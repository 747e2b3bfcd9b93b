use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::connect_and_migrate;
use super::serve::run_server;
use crate::config::Settings;
use crate::router::create_router;
use crate::schemas::AppState;

pub async fn migrate_and_serve(settings: Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);

    // Reuse the migrated connection for serving
    let db = connect_and_migrate(&settings.database_url).await?;
    let bind_address = settings.bind_address.clone();
    let app = create_router(AppState::new(db, settings));
    debug!("Router created successfully");

    run_server(app, &bind_address).await
}
