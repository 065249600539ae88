//! HTTP client for the dashboard service

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::ClientError;
use crate::model::{
    AttackLogic, CounterArgument, NewCounterArgument, Trend, VoteDirection, VoteOutcome,
};
use crate::store::SortOrder;

const ENV_API_URL: &str = "WORLDVIEW_API_URL";
const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Filters for the worldview list; unset fields use the server defaults
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// The aggregated list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewKind {
    Categories,
    Actors,
    Mechanisms,
    Priority,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Categories => "categories",
            ViewKind::Actors => "actors",
            ViewKind::Mechanisms => "mechanisms",
            ViewKind::Priority => "priority",
        }
    }
}

/// Counter-argument calls the panel depends on
#[async_trait]
pub trait CounterArgumentApi: Send + Sync {
    async fn list(&self, pattern_id: &str) -> Result<Vec<CounterArgument>, ClientError>;

    async fn submit(
        &self,
        pattern_id: &str,
        counter: &NewCounterArgument,
    ) -> Result<CounterArgument, ClientError>;

    async fn vote(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, ClientError>;

    /// Attack patterns with their counter-argument counts
    async fn attacks(&self) -> Result<Vec<AttackLogic>, ClientError>;

    async fn related(&self, attack_id: &str) -> Result<Vec<AttackLogic>, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Use `WORLDVIEW_API_URL`, falling back to the local default
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var(ENV_API_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `segments` to the base path, percent-encoding each one so ids
    /// containing `/`, `?` or spaces stay a single segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list_worldviews(&self, params: &ListParams) -> Result<Value, ClientError> {
        tracing::debug!(?params, "Fetching worldview list");
        self.send(self.client.get(self.url(&["api", "worldviews"])).query(params))
            .await
    }

    pub async fn worldview(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.client.get(self.url(&["api", "worldviews", id])))
            .await
    }

    pub async fn comparison(&self, id: &str) -> Result<Value, ClientError> {
        self.send(
            self.client
                .get(self.url(&["api", "worldviews", id, "comparison"])),
        )
        .await
    }

    pub async fn view(&self, kind: ViewKind) -> Result<Value, ClientError> {
        self.send(self.client.get(self.url(&["api", "views", kind.as_str()])))
            .await
    }
}

#[async_trait]
impl CounterArgumentApi for DashboardClient {
    async fn list(&self, pattern_id: &str) -> Result<Vec<CounterArgument>, ClientError> {
        self.send(
            self.client
                .get(self.url(&["api", "patterns", pattern_id, "counter-arguments"])),
        )
        .await
    }

    async fn submit(
        &self,
        pattern_id: &str,
        counter: &NewCounterArgument,
    ) -> Result<CounterArgument, ClientError> {
        self.send(
            self.client
                .post(self.url(&["api", "patterns", pattern_id, "counter-arguments"]))
                .json(counter),
        )
        .await
    }

    async fn vote(
        &self,
        counter_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, ClientError> {
        self.send(
            self.client
                .post(self.url(&["api", "counter-arguments", counter_id, "votes"]))
                .json(&json!({"voter_id": voter_id, "direction": direction})),
        )
        .await
    }

    async fn attacks(&self) -> Result<Vec<AttackLogic>, ClientError> {
        self.send(self.client.get(self.url(&["api", "attacks"])))
            .await
    }

    async fn related(&self, attack_id: &str) -> Result<Vec<AttackLogic>, ClientError> {
        self.send(
            self.client
                .get(self.url(&["api", "attacks", attack_id, "related"])),
        )
        .await
    }
}

/// Turn a non-success response into [`ClientError::Api`], keeping the
/// server's own message when it sent one
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    tracing::debug!(status = status.as_u16(), message = %message, "Dashboard request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_worldviews_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/worldviews"))
            .and(query_param("trend", "rising"))
            .and(query_param("order", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "worldviews": [],
                "pagination": {"total": 0, "limit": 50, "offset": 0, "hasMore": false}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DashboardClient::new(&server.uri()).unwrap();
        let params = ListParams {
            trend: Some(Trend::Rising),
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let page = client.list_worldviews(&params).await.unwrap();
        assert_eq!(page["pagination"]["hasMore"], json!(false));
    }

    #[tokio::test]
    async fn test_server_error_message_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/patterns/p1/counter-arguments"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "Failed to submit counter-argument",
                "request_id": "0b9d"
            })))
            .mount(&server)
            .await;

        let client = DashboardClient::new(&server.uri()).unwrap();
        let counter = NewCounterArgument {
            content: "The audit was published".to_string(),
            source_type: Default::default(),
            source_url: None,
            author_name: "Anonymous".to_string(),
        };
        let err = client.submit("p1", &counter).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to submit counter-argument");
    }

    #[tokio::test]
    async fn test_vote_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/counter-arguments/c1/votes"))
            .and(body_json(json!({"voter_id": "v-1", "direction": -1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"action": "changed"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = DashboardClient::new(&server.uri()).unwrap();
        let outcome = client.vote("c1", "v-1", VoteDirection::Down).await.unwrap();
        assert_eq!(outcome.action, crate::model::VoteAction::Changed);
    }

    #[tokio::test]
    async fn test_ids_are_encoded_as_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/worldviews/a%2Fb%20c/comparison"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"comparisons": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = DashboardClient::new(&server.uri()).unwrap();
        client.comparison("a/b c").await.unwrap();
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = DashboardClient::new("http://dashboard.local/prefix/").unwrap();
        assert_eq!(
            client.url(&["api", "attacks", "x?y", "related"]).as_str(),
            "http://dashboard.local/prefix/api/attacks/x%3Fy/related"
        );
        assert!(DashboardClient::new("not a url").is_err());
        assert!(DashboardClient::new("mailto:someone@example.org").is_err());
    }

    #[tokio::test]
    async fn test_attacks_and_related() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/attacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a1", "core_argument": "They hide the budget", "counter_count": 2}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/attacks/a1/related"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a2", "core_argument": "The budget is secret", "similarity": 0.91}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = DashboardClient::new(&server.uri()).unwrap();
        let attacks = client.attacks().await.unwrap();
        assert_eq!(attacks[0].counter_count, 2);
        let related = client.related("a1").await.unwrap();
        assert_eq!(related[0].similarity, Some(0.91));
    }
}
