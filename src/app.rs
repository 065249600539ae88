//! Application state and service initialization
//!
//! Builds the datastore client and the services layered on top of it so
//! the HTTP server and tests share one wiring path.

use std::sync::Arc;

use crate::model::{BackendConfig, Config, ConfigError};
use crate::service::{CounterArgumentService, WorldviewService};
use crate::store::{DiscourseStore, PostgrestStore};

/// Application state containing all services and shared resources
#[derive(Clone)]
pub struct AppState {
    /// Datastore shared by every service and the readiness check
    pub store: Arc<dyn DiscourseStore>,
    pub worldview_service: Arc<WorldviewService>,
    pub counter_service: Arc<CounterArgumentService>,
}

impl AppState {
    /// Read backend credentials from the environment and build the services
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let backend = BackendConfig::from_env()?;
        let store: Arc<dyn DiscourseStore> = Arc::new(PostgrestStore::new(&backend));

        tracing::info!(backend = %backend.url, "Connecting to discourse datastore");

        Ok(Self::with_store(store, config))
    }

    /// Build the services around an existing store
    pub fn with_store(store: Arc<dyn DiscourseStore>, config: &Config) -> Self {
        let worldview_service = Arc::new(WorldviewService::new(
            Arc::clone(&store),
            config.views.clone(),
        ));
        let counter_service = Arc::new(CounterArgumentService::new(
            Arc::clone(&store),
            config.counters.list_limit,
        ));

        Self {
            store,
            worldview_service,
            counter_service,
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing(name) => AppError::MissingConfig(name),
            ConfigError::Invalid(reason) => AppError::InvalidConfig(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use serde_json::{Value, json};

    use super::*;
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn test_state_serves_every_route_group() {
        let store = MemoryStore::new();
        store.add_worldview(json!({"id": "w1", "title": "Steady decline"}));
        let state = AppState::with_store(Arc::new(store), &Config::default());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(Arc::clone(&state.worldview_service)))
                .app_data(web::Data::from(Arc::clone(&state.counter_service)))
                .app_data(web::Data::from(Arc::clone(&state.store)))
                .configure(crate::api::configure),
        )
        .await;

        for uri in [
            "/api/worldviews",
            "/api/views/categories",
            "/api/patterns/p1/counter-arguments",
            "/health/ready",
            "/openapi.json",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        }

        let req = test::TestRequest::get().uri("/api/worldviews/w1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], json!("Steady decline"));
    }

    #[::core::prelude::v1::test]
    fn test_config_error_conversion() {
        let err: AppError = ConfigError::Missing("SUPABASE_URL").into();
        assert!(matches!(err, AppError::MissingConfig("SUPABASE_URL")));
    }
}
