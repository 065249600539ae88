//! REST API endpoints for worldviews

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, ErrorContext, ErrorResponse};
use crate::model::{Trend, Worldview};
use crate::service::WorldviewService;
use crate::service::render::WorldviewComparison;
use crate::service::worldview::{
    LayeredPatterns, PendingDeconstruction, QueuedJob, WorldviewDetail, WorldviewPage,
};
use crate::store::{SortOrder, WorldviewQuery};

/// Query parameters for listing worldviews
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListWorldviewsParams {
    /// Page size (default: 50)
    pub limit: Option<u32>,
    /// Rows to skip (default: 0)
    pub offset: Option<u32>,
    /// Column to sort by (default: strength_overall)
    pub sort_by: Option<String>,
    /// Sort direction, asc or desc (default: desc)
    pub order: Option<SortOrder>,
    /// Only worldviews with this trend
    pub trend: Option<Trend>,
    /// Minimum overall strength (default: 0)
    pub min_strength: Option<f64>,
    /// Filter on the archived flag
    pub archived: Option<bool>,
}

impl TryFrom<ListWorldviewsParams> for WorldviewQuery {
    type Error = ApiError;

    fn try_from(params: ListWorldviewsParams) -> Result<Self, Self::Error> {
        let defaults = WorldviewQuery::default();

        let min_strength = params.min_strength.unwrap_or(defaults.min_strength);
        if !min_strength.is_finite() {
            return Err(ApiError::BadRequest(
                "min_strength must be a finite number".to_string(),
            ));
        }

        Ok(WorldviewQuery {
            limit: params.limit.unwrap_or(defaults.limit),
            offset: params.offset.unwrap_or(defaults.offset),
            sort_by: params
                .sort_by
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sort_by),
            order: params.order.unwrap_or(defaults.order),
            trend: params.trend,
            min_strength,
            archived: params.archived,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeconstructionParams {
    /// Skip the cached marker and return the stored copy as-is
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// List worldviews with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/worldviews",
    params(ListWorldviewsParams),
    responses(
        (status = 200, description = "Worldviews retrieved successfully", body = WorldviewPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[get("/api/worldviews")]
pub async fn list_worldviews(
    service: web::Data<WorldviewService>,
    query: web::Query<ListWorldviewsParams>,
) -> Result<HttpResponse, ApiError> {
    let query = WorldviewQuery::try_from(query.into_inner())?;
    let page = service.list(&query).await.context("Failed to fetch worldviews")?;
    Ok(HttpResponse::Ok().json(page))
}

/// Create a worldview
#[utoipa::path(
    post,
    path = "/api/worldviews",
    request_body = Worldview,
    responses(
        (status = 201, description = "Worldview created", body = Worldview),
        (status = 400, description = "Body is not an object", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[post("/api/worldviews")]
pub async fn create_worldview(
    service: web::Data<WorldviewService>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let created = service
        .create(&body)
        .await
        .context("Failed to create worldview")?;
    Ok(HttpResponse::Created().json(created))
}

/// Get a worldview with its perceptions, source posts, history and stats
#[utoipa::path(
    get,
    path = "/api/worldviews/{id}",
    params(("id" = String, Path, description = "Worldview ID")),
    responses(
        (status = 200, description = "Worldview retrieved successfully", body = WorldviewDetail),
        (status = 404, description = "Worldview not found", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[get("/api/worldviews/{id}")]
pub async fn get_worldview(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let detail = service.detail(&id).await.context("Failed to fetch worldview")?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Update worldview columns
#[utoipa::path(
    patch,
    path = "/api/worldviews/{id}",
    params(("id" = String, Path, description = "Worldview ID")),
    request_body = Worldview,
    responses(
        (status = 200, description = "Worldview updated", body = Worldview),
        (status = 404, description = "Worldview not found", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[patch("/api/worldviews/{id}")]
pub async fn update_worldview(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let updated = service
        .update(&id, &body)
        .await
        .context("Failed to update worldview")?;
    tracing::info!(id = %id, "Worldview updated");
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete a worldview
#[utoipa::path(
    delete,
    path = "/api/worldviews/{id}",
    params(("id" = String, Path, description = "Worldview ID")),
    responses(
        (status = 200, description = "Worldview deleted", body = DeleteResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[delete("/api/worldviews/{id}")]
pub async fn delete_worldview(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    service
        .delete(&id)
        .await
        .context("Failed to delete worldview")?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true }))
}

/// Active and fading patterns grouped by layer
#[utoipa::path(
    get,
    path = "/api/worldviews/{id}/patterns",
    params(("id" = String, Path, description = "Worldview ID")),
    responses(
        (status = 200, description = "Patterns by layer", body = LayeredPatterns),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[get("/api/worldviews/{id}/patterns")]
pub async fn get_patterns(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let patterns = service
        .patterns(&path.into_inner())
        .await
        .context("Failed to fetch patterns")?;
    Ok(HttpResponse::Ok().json(patterns))
}

/// Stored deconstruction, or a placeholder naming what is missing
#[utoipa::path(
    get,
    path = "/api/worldviews/{id}/deconstruction",
    params(("id" = String, Path, description = "Worldview ID"), DeconstructionParams),
    responses(
        (status = 200, description = "Stored deconstruction (with `cached: true` unless regenerating) or placeholder", body = PendingDeconstruction),
        (status = 404, description = "Worldview not found", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[get("/api/worldviews/{id}/deconstruction")]
pub async fn get_deconstruction(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
    params: web::Query<DeconstructionParams>,
) -> Result<HttpResponse, ApiError> {
    let view = service
        .deconstruction(&path.into_inner(), params.regenerate)
        .await
        .context("Failed to fetch deconstruction")?;
    Ok(HttpResponse::Ok().json(view))
}

/// Request deconstruction generation by the analysis pipeline
#[utoipa::path(
    post,
    path = "/api/worldviews/{id}/deconstruction",
    params(("id" = String, Path, description = "Worldview ID")),
    responses(
        (status = 202, description = "Generation queued", body = QueuedJob)
    ),
    tag = "worldviews"
)]
#[post("/api/worldviews/{id}/deconstruction")]
pub async fn queue_deconstruction(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
) -> HttpResponse {
    HttpResponse::Accepted().json(service.queue_deconstruction(&path.into_inner()))
}

/// Logic chain and interpretation comparisons for one worldview
#[utoipa::path(
    get,
    path = "/api/worldviews/{id}/comparison",
    params(("id" = String, Path, description = "Worldview ID")),
    responses(
        (status = 200, description = "Comparison view", body = WorldviewComparison),
        (status = 404, description = "Worldview not found", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "worldviews"
)]
#[get("/api/worldviews/{id}/comparison")]
pub async fn get_comparison(
    service: web::Data<WorldviewService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = service
        .comparison(&path.into_inner())
        .await
        .context("Failed to build comparison")?;
    Ok(HttpResponse::Ok().json(view))
}

/// Configure worldview routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_worldviews)
        .service(create_worldview)
        .service(get_worldview)
        .service(update_worldview)
        .service(delete_worldview)
        .service(get_patterns)
        .service(get_deconstruction)
        .service(queue_deconstruction)
        .service(get_comparison);
}
