//! Aggregated list views: by category, actor, mechanism and priority

use actix_web::{HttpResponse, get, web};

use crate::api::error::{ApiError, ErrorContext, ErrorResponse};
use crate::service::WorldviewService;
use crate::service::aggregate::{ActorView, CategoryView, MechanismView, PriorityView};

const VIEW_FAILED: &str = "Failed to fetch worldviews";

/// Worldviews grouped by frame category, largest group first
#[utoipa::path(
    get,
    path = "/api/views/categories",
    responses(
        (status = 200, description = "Category hierarchy", body = CategoryView),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "views"
)]
#[get("/api/views/categories")]
pub async fn categories(service: web::Data<WorldviewService>) -> Result<HttpResponse, ApiError> {
    let view = service.category_view().await.context(VIEW_FAILED)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Worldviews grouped by actor with the union of their mechanism tags
#[utoipa::path(
    get,
    path = "/api/views/actors",
    responses(
        (status = 200, description = "Actor hierarchy", body = ActorView),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "views"
)]
#[get("/api/views/actors")]
pub async fn actors(service: web::Data<WorldviewService>) -> Result<HttpResponse, ApiError> {
    let view = service.actor_view().await.context(VIEW_FAILED)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Worldviews bucketed by their primary mechanism
#[utoipa::path(
    get,
    path = "/api/views/mechanisms",
    responses(
        (status = 200, description = "Five mechanism buckets", body = MechanismView),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "views"
)]
#[get("/api/views/mechanisms")]
pub async fn mechanisms(service: web::Data<WorldviewService>) -> Result<HttpResponse, ApiError> {
    let view = service.mechanism_view().await.context(VIEW_FAILED)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Worldviews ranked by priority, split into top three and the rest
#[utoipa::path(
    get,
    path = "/api/views/priority",
    responses(
        (status = 200, description = "Priority ranking", body = PriorityView),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "views"
)]
#[get("/api/views/priority")]
pub async fn priority(service: web::Data<WorldviewService>) -> Result<HttpResponse, ApiError> {
    let view = service.priority_view().await.context(VIEW_FAILED)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Configure aggregated view routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(categories)
        .service(actors)
        .service(mechanisms)
        .service(priority);
}
