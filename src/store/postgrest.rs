//! PostgREST client for the hosted datastore
//!
//! Talks to the `/rest/v1` surface with the anonymous key. Tables are read
//! with column filters (`col=eq.v`), counted with `Prefer: count=exact`, and
//! the vote/list procedures are invoked through `/rest/v1/rpc/<name>`.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::query::in_filter;
use super::{DiscourseStore, Page, StoreError, WorldviewQuery};
use crate::model::{
    AttackLogic, BackendConfig, Content, CounterArgument, LayeredPerception, NewCounterArgument,
    PatternStatus, PerceptionLink, SimilarityQuery, StrengthSnapshot, VoteDirection, VoteOutcome,
    Worldview, WorldviewPattern,
};

const TABLE_WORLDVIEWS: &str = "worldviews";
const TABLE_PERCEPTIONS: &str = "layered_perceptions";
const TABLE_CONTENTS: &str = "contents";
const TABLE_LINKS: &str = "perception_worldview_links";
const TABLE_STRENGTH_HISTORY: &str = "worldview_strength_history";
const TABLE_PATTERNS: &str = "worldview_patterns";
const TABLE_COUNTER_ARGUMENTS: &str = "counter_arguments";
const TABLE_ATTACKS: &str = "attack_logic_with_counters";
const TABLE_LOGIC_REPOSITORY: &str = "logic_repository";

const RPC_LIST_COUNTERS: &str = "get_counter_arguments_for_attack";
const RPC_VOTE: &str = "vote_counter_argument";
const RPC_SIMILAR_LOGIC: &str = "find_similar_logic";

const PREFER_COUNT: &str = "count=exact";
const PREFER_REPRESENTATION: &str = "return=representation";

/// Store backed by a PostgREST endpoint
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_url: String,
    anon_key: String,
}

impl PostgrestStore {
    pub fn new(config: &BackendConfig) -> Self {
        let rest_url = format!("{}/rest/v1", config.url.as_str().trim_end_matches('/'));

        tracing::debug!(rest_url = %rest_url, "Configured PostgREST store");

        Self {
            client: Client::new(),
            rest_url,
            anon_key: config.anon_key.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, StoreError> {
        let response = check_status(request.send().await?).await?;
        decode_body(response, what).await
    }

    async fn first_row<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Option<T>, StoreError> {
        let rows: Vec<T> = self.fetch_json(request, what).await?;
        Ok(rows.into_iter().next())
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

async fn decode_body<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, StoreError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(format!("{}: {}", what, e)))
}

/// Total row count from a `Content-Range` header (`0-49/312`, `*/0`)
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl DiscourseStore for PostgrestStore {
    async fn list_worldviews(&self, query: &WorldviewQuery) -> Result<Page<Worldview>, StoreError> {
        let request = self
            .request(Method::GET, TABLE_WORLDVIEWS)
            .query(&query.to_params())
            .header("Prefer", PREFER_COUNT);

        let response = check_status(request.send().await?).await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let items: Vec<Worldview> = decode_body(response, "worldview list").await?;
        let total = total.unwrap_or(query.offset as u64 + items.len() as u64);

        tracing::debug!(count = items.len(), total = total, "Fetched worldview page");

        Ok(Page { items, total })
    }

    async fn get_worldview(&self, id: &str) -> Result<Option<Worldview>, StoreError> {
        let request = self
            .request(Method::GET, TABLE_WORLDVIEWS)
            .query(&[("select", "*"), ("id", &eq(id)), ("limit", "1")]);

        self.first_row(request, "worldview").await
    }

    async fn insert_worldview(&self, record: &Value) -> Result<Worldview, StoreError> {
        let request = self
            .request(Method::POST, TABLE_WORLDVIEWS)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(record);

        let created: Option<Worldview> = self.first_row(request, "created worldview").await?;
        let created =
            created.ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;

        tracing::info!(id = %created.id, "Inserted worldview");
        Ok(created)
    }

    async fn update_worldview(
        &self,
        id: &str,
        changes: &Value,
    ) -> Result<Option<Worldview>, StoreError> {
        let request = self
            .request(Method::PATCH, TABLE_WORLDVIEWS)
            .query(&[("id", eq(id))])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(changes);

        self.first_row(request, "updated worldview").await
    }

    async fn delete_worldview(&self, id: &str) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, TABLE_WORLDVIEWS)
            .query(&[("id", eq(id))]);

        check_status(request.send().await?).await?;
        tracing::info!(id = %id, "Deleted worldview");
        Ok(())
    }

    async fn perception_links(&self, worldview_id: &str) -> Result<Vec<PerceptionLink>, StoreError> {
        let request = self.request(Method::GET, TABLE_LINKS).query(&[
            ("select", "perception_id,relevance_score"),
            ("worldview_id", &eq(worldview_id)),
        ]);

        self.fetch_json(request, "perception links").await
    }

    async fn perceptions_by_ids(&self, ids: &[String]) -> Result<Vec<LayeredPerception>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .request(Method::GET, TABLE_PERCEPTIONS)
            .query(&[("select", "*".to_string()), ("id", in_filter(ids))]);

        self.fetch_json(request, "layered perceptions").await
    }

    async fn contents_by_ids(&self, ids: &[String]) -> Result<Vec<Content>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .request(Method::GET, TABLE_CONTENTS)
            .query(&[("select", "*".to_string()), ("id", in_filter(ids))]);

        self.fetch_json(request, "contents").await
    }

    async fn strength_history(
        &self,
        worldview_id: &str,
        limit: u32,
    ) -> Result<Vec<StrengthSnapshot>, StoreError> {
        let request = self.request(Method::GET, TABLE_STRENGTH_HISTORY).query(&[
            ("select", "*".to_string()),
            ("worldview_id", eq(worldview_id)),
            ("order", "recorded_at.asc".to_string()),
            ("limit", limit.to_string()),
        ]);

        self.fetch_json(request, "strength history").await
    }

    async fn worldview_patterns(
        &self,
        worldview_id: &str,
        statuses: &[PatternStatus],
    ) -> Result<Vec<WorldviewPattern>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let request = self.request(Method::GET, TABLE_PATTERNS).query(&[
            (
                "select",
                "id,layer,text,strength,status,appearance_count,last_seen".to_string(),
            ),
            ("worldview_id", eq(worldview_id)),
            ("status", in_filter(&statuses)),
        ]);

        self.fetch_json(request, "worldview patterns").await
    }

    async fn list_counter_arguments(
        &self,
        pattern_id: &str,
        limit: u32,
    ) -> Result<Vec<CounterArgument>, StoreError> {
        let request = self
            .request(Method::POST, &format!("rpc/{}", RPC_LIST_COUNTERS))
            .json(&json!({
                "p_attack_id": pattern_id,
                "p_limit": limit,
            }));

        self.fetch_json(request, "counter-arguments").await
    }

    async fn insert_counter_argument(
        &self,
        pattern_id: &str,
        counter: &NewCounterArgument,
    ) -> Result<CounterArgument, StoreError> {
        let request = self
            .request(Method::POST, TABLE_COUNTER_ARGUMENTS)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&json!({
                "attack_id": pattern_id,
                "content": counter.content,
                "source_type": counter.source_type,
                "source_url": counter.source_url,
                "author_name": counter.author_name,
            }));

        let created: Option<CounterArgument> =
            self.first_row(request, "created counter-argument").await?;
        let created =
            created.ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;

        tracing::info!(id = %created.id, pattern_id = %pattern_id, "Inserted counter-argument");
        Ok(created)
    }

    async fn vote_counter_argument(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, StoreError> {
        let request = self
            .request(Method::POST, &format!("rpc/{}", RPC_VOTE))
            .json(&json!({
                "p_counter_argument_id": counter_id,
                "p_voter_identifier": voter_id,
                "p_vote_type": i8::from(direction),
            }));

        self.fetch_json(request, "vote outcome").await
    }

    async fn list_attacks(&self, limit: u32) -> Result<Vec<AttackLogic>, StoreError> {
        let request = self.request(Method::GET, TABLE_ATTACKS).query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);

        self.fetch_json(request, "attack logics").await
    }

    async fn logic_embedding(&self, logic_id: &str) -> Result<Option<Value>, StoreError> {
        let request = self.request(Method::GET, TABLE_LOGIC_REPOSITORY).query(&[
            ("select", "vector_embedding".to_string()),
            ("id", eq(logic_id)),
            ("limit", "1".to_string()),
        ]);

        let row: Option<Value> = self.first_row(request, "logic embedding").await?;
        Ok(row
            .and_then(|mut row| row.get_mut("vector_embedding").map(Value::take))
            .filter(|embedding| !embedding.is_null()))
    }

    async fn similar_logics(
        &self,
        embedding: &Value,
        query: &SimilarityQuery,
    ) -> Result<Vec<AttackLogic>, StoreError> {
        let request = self
            .request(Method::POST, &format!("rpc/{}", RPC_SIMILAR_LOGIC))
            .json(&json!({
                "query_embedding": embedding,
                "match_threshold": query.threshold,
                "match_count": query.count,
                "logic_type_filter": query.logic_type,
            }));

        self.fetch_json(request, "similar logics").await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .request(Method::GET, TABLE_WORLDVIEWS)
            .query(&[("select", "id"), ("limit", "1")]);

        check_status(request.send().await?).await?;
        Ok(())
    }
}
