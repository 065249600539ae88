//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::error::ErrorResponse;
use crate::api::{counter, health, views, worldview};

#[derive(OpenApi)]
#[openapi(
    paths(
        worldview::list_worldviews,
        worldview::create_worldview,
        worldview::get_worldview,
        worldview::update_worldview,
        worldview::delete_worldview,
        worldview::get_patterns,
        worldview::get_deconstruction,
        worldview::queue_deconstruction,
        worldview::get_comparison,
        views::categories,
        views::actors,
        views::mechanisms,
        views::priority,
        counter::list_counter_arguments,
        counter::submit_counter_argument,
        counter::vote,
        counter::list_attacks,
        counter::related_logics,
        health::liveness,
        health::readiness,
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "worldviews", description = "Worldview records, detail and deconstruction"),
        (name = "views", description = "Aggregated list views"),
        (name = "counter-arguments", description = "Counter-arguments and voting"),
        (name = "health", description = "Liveness and readiness checks")
    ),
    info(
        title = "Worldview Dashboard API",
        description = "Browse worldview analysis results and discuss their patterns"
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI document as YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/worldviews",
            "/api/worldviews/{id}",
            "/api/worldviews/{id}/deconstruction",
            "/api/views/priority",
            "/api/patterns/{id}/counter-arguments",
            "/api/counter-arguments/{id}/votes",
            "/api/attacks",
            "/api/attacks/{id}/related",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
