use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldview_dashboard::api;
use worldview_dashboard::app::AppState;
use worldview_dashboard::model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application");
        std::io::Error::other(e)
    })?;

    let store = web::Data::from(Arc::clone(&state.store));
    let worldview_service = web::Data::from(Arc::clone(&state.worldview_service));
    let counter_service = web::Data::from(Arc::clone(&state.counter_service));

    tracing::info!("Starting worldview dashboard on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(worldview_service.clone())
            .app_data(counter_service.clone())
            .configure(api::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
