//! REST API endpoints for counter-arguments

use actix_web::{HttpResponse, get, post, web};

use crate::api::error::{ApiError, ErrorContext, ErrorResponse};
use crate::model::{AttackLogic, CounterArgument, CounterArgumentDraft, VoteOutcome, VoteRequest};
use crate::service::CounterArgumentService;

/// Counter-arguments for a pattern, best quality first
#[utoipa::path(
    get,
    path = "/api/patterns/{id}/counter-arguments",
    params(("id" = String, Path, description = "Pattern ID")),
    responses(
        (status = 200, description = "Counter-arguments", body = Vec<CounterArgument>),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "counter-arguments"
)]
#[get("/api/patterns/{id}/counter-arguments")]
pub async fn list_counter_arguments(
    service: web::Data<CounterArgumentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let counters = service
        .list(&path.into_inner())
        .await
        .context("Failed to fetch counter-arguments")?;
    Ok(HttpResponse::Ok().json(counters))
}

/// Submit a counter-argument for a pattern
#[utoipa::path(
    post,
    path = "/api/patterns/{id}/counter-arguments",
    params(("id" = String, Path, description = "Pattern ID")),
    request_body = CounterArgumentDraft,
    responses(
        (status = 201, description = "Counter-argument stored", body = CounterArgument),
        (status = 400, description = "Blank content", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "counter-arguments"
)]
#[post("/api/patterns/{id}/counter-arguments")]
pub async fn submit_counter_argument(
    service: web::Data<CounterArgumentService>,
    path: web::Path<String>,
    draft: web::Json<CounterArgumentDraft>,
) -> Result<HttpResponse, ApiError> {
    let pattern_id = path.into_inner();
    let created = service
        .submit(&pattern_id, &draft)
        .await
        .context("Failed to submit counter-argument")?;
    Ok(HttpResponse::Created().json(created))
}

/// Vote on a counter-argument. Repeating a vote withdraws it.
#[utoipa::path(
    post,
    path = "/api/counter-arguments/{id}/votes",
    params(("id" = String, Path, description = "Counter-argument ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "What the vote did", body = VoteOutcome),
        (status = 400, description = "Missing voter or bad direction", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "counter-arguments"
)]
#[post("/api/counter-arguments/{id}/votes")]
pub async fn vote(
    service: web::Data<CounterArgumentService>,
    path: web::Path<String>,
    request: web::Json<VoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = service
        .vote(&path.into_inner(), &request.voter_id, request.direction)
        .await
        .context("Failed to record vote")?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Attack patterns, newest first, with their counter-argument counts
#[utoipa::path(
    get,
    path = "/api/attacks",
    responses(
        (status = 200, description = "Attack patterns", body = Vec<AttackLogic>),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "counter-arguments"
)]
#[get("/api/attacks")]
pub async fn list_attacks(
    service: web::Data<CounterArgumentService>,
) -> Result<HttpResponse, ApiError> {
    let attacks = service
        .list_attacks()
        .await
        .context("Failed to fetch attacks")?;
    Ok(HttpResponse::Ok().json(attacks))
}

/// Attacks with a similar embedding, most similar first
#[utoipa::path(
    get,
    path = "/api/attacks/{id}/related",
    params(("id" = String, Path, description = "Attack ID")),
    responses(
        (status = 200, description = "Related attacks; empty when the attack has no embedding", body = Vec<AttackLogic>),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    ),
    tag = "counter-arguments"
)]
#[get("/api/attacks/{id}/related")]
pub async fn related_logics(
    service: web::Data<CounterArgumentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let related = service
        .related_logics(&path.into_inner())
        .await
        .context("Failed to fetch related logics")?;
    Ok(HttpResponse::Ok().json(related))
}

/// Configure counter-argument routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_counter_arguments)
        .service(submit_counter_argument)
        .service(vote)
        .service(list_attacks)
        .service(related_logics);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::store::memory::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_counter_argument("a1", json!({"id": "c1", "content": "first", "quality_score": 0.2}));
        store.add_counter_argument("a1", json!({"id": "c2", "content": "second", "quality_score": 0.7}));
        store
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(CounterArgumentService::new($store, 100)))
                    .configure(crate::api::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_list_sorted() {
        let app = app!(store());
        let req = test::TestRequest::get()
            .uri("/api/patterns/a1/counter-arguments")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["id"], json!("c2"));
        assert_eq!(body[1]["author_name"], json!("Anonymous"));
    }

    #[actix_web::test]
    async fn test_submit_blank_is_400() {
        let app = app!(store());
        let req = test::TestRequest::post()
            .uri("/api/patterns/a1/counter-arguments")
            .set_json(json!({"content": "  \t "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_submit_created() {
        let app = app!(store());
        let req = test::TestRequest::post()
            .uri("/api/patterns/a1/counter-arguments")
            .set_json(json!({
                "content": "The contract went to the lowest bidder.",
                "source_type": "article",
                "source_url": "https://example.org/contract"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["source_type"], json!("article"));
        assert_eq!(body["author_name"], json!("Anonymous"));
    }

    #[actix_web::test]
    async fn test_vote_toggle_over_http() {
        let store = store();
        let app = app!(store.clone());

        for expected in ["added", "removed"] {
            let req = test::TestRequest::post()
                .uri("/api/counter-arguments/c1/votes")
                .set_json(json!({"voter_id": "voter-1", "direction": 1}))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["action"], json!(expected));
        }
        assert_eq!(store.counter_argument("c1").unwrap().upvotes, 0);
    }

    #[actix_web::test]
    async fn test_vote_bad_direction_is_400() {
        let app = app!(store());
        let req = test::TestRequest::post()
            .uri("/api/counter-arguments/c1/votes")
            .set_json(json!({"voter_id": "voter-1", "direction": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_attacks_and_related() {
        let store = store();
        store.add_attack(
            json!({"id": "a1", "core_argument": "They hide the budget", "created_at": "2024-03-01T00:00:00Z"}),
            Some(vec![1.0, 0.0]),
        );
        store.add_attack(
            json!({"id": "a2", "core_argument": "The budget is secret", "created_at": "2024-03-02T00:00:00Z"}),
            Some(vec![0.8, 0.2]),
        );
        let app = app!(store);

        let req = test::TestRequest::get().uri("/api/attacks").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["id"], json!("a2"));
        assert_eq!(body[1]["counter_count"], json!(2));

        let req = test::TestRequest::get()
            .uri("/api/attacks/a1/related")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["id"], json!("a2"));
    }

    #[actix_web::test]
    async fn test_attacks_backend_down_is_500() {
        let app = app!(Arc::new(MemoryStore::offline()));
        let req = test::TestRequest::get().uri("/api/attacks").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
