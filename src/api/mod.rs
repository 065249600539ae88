pub mod counter;
pub mod error;
pub mod health;
pub mod openapi;
pub mod views;
pub mod worldview;

use actix_web::web;

use crate::api::error::ApiError;

/// Register every route plus extractor error handlers that answer
/// malformed query strings and bodies with the standard error shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .configure(worldview::configure)
    .configure(views::configure)
    .configure(counter::configure)
    .configure(health::configure)
    .configure(openapi::configure);
}
