use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shoppy_cart::entities::{connect, seed_admin, setup_schema};
use shoppy_cart::{create_api_router, AppConfig, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let db = connect(&config.database_url).await?;
    setup_schema(&db).await?;
    if let Some(admin) = &config.admin {
        seed_admin(&db, &admin.email, &admin.password).await?;
    }

    let state = AppState::new(Arc::new(db), &config);
    let app = create_api_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
