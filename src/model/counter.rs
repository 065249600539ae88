use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::de::{lenient_timestamp, null_as_default};

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Article,
    Video,
    Tweet,
    #[default]
    Text,
    Other,
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "article" => Ok(SourceType::Article),
            "video" => Ok(SourceType::Video),
            "tweet" => Ok(SourceType::Tweet),
            "text" => Ok(SourceType::Text),
            "other" => Ok(SourceType::Other),
            other => Err(format!("unknown source type: {}", other)),
        }
    }
}

/// A user-submitted rebuttal attached to a discourse pattern
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CounterArgument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default = "anonymous", deserialize_with = "author_or_anonymous")]
    pub author_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upvotes: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub downvotes: i64,
    /// Recomputed by the backend after each vote
    #[serde(default, deserialize_with = "null_as_default")]
    pub quality_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_best: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn anonymous() -> String {
    ANONYMOUS_AUTHOR.to_string()
}

fn author_or_anonymous<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|a| !a.trim().is_empty()).unwrap_or_else(anonymous))
}

/// Unvalidated form input for a new counter-argument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CounterArgumentDraft {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Counter-argument content must not be empty")]
    EmptyContent,
}

/// Validated counter-argument ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCounterArgument {
    pub content: String,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub author_name: String,
}

impl CounterArgumentDraft {
    /// Trim and validate the draft. Blank content is rejected; a blank
    /// author becomes [`ANONYMOUS_AUTHOR`] and a blank URL is dropped.
    pub fn validate(&self) -> Result<NewCounterArgument, DraftError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(DraftError::EmptyContent);
        }

        // Free text is allowed: citations are not always links
        let source_url = self
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::to_string);

        let author_name = self
            .author_name
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
            .to_string();

        Ok(NewCounterArgument {
            content: content.to_string(),
            source_type: self.source_type,
            source_url,
            author_name,
        })
    }
}

/// Direction of a vote, `+1` or `-1` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn opposite(&self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }
}

impl TryFrom<i8> for VoteDirection {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(format!("vote direction must be 1 or -1, got {}", other)),
        }
    }
}

impl From<VoteDirection> for i8 {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// What the backend did with a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteAction {
    Added,
    /// Same direction repeated, vote withdrawn
    Removed,
    /// Opposite direction, vote flipped
    Changed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoteOutcome {
    pub action: VoteAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub voter_id: String,
    /// `1` for up, `-1` for down
    #[schema(value_type = i8)]
    pub direction: VoteDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_content_rejected() {
        let draft = CounterArgumentDraft {
            content: "   \n\t ".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(DraftError::EmptyContent));
    }

    #[test]
    fn test_defaults_applied() {
        let draft = CounterArgumentDraft {
            content: "  The budget passed a public committee.  ".to_string(),
            source_type: SourceType::Article,
            source_url: Some("   ".to_string()),
            author_name: Some("".to_string()),
        };
        let new = draft.validate().unwrap();
        assert_eq!(new.content, "The budget passed a public committee.");
        assert_eq!(new.author_name, ANONYMOUS_AUTHOR);
        assert_eq!(new.source_url, None);
        assert_eq!(new.source_type, SourceType::Article);
    }

    #[test]
    fn test_source_accepts_any_non_blank_text() {
        for source in ["example.org/report", "Assembly minutes, p. 3"] {
            let draft = CounterArgumentDraft {
                content: "See the minutes".to_string(),
                source_url: Some(format!("  {}  ", source)),
                ..Default::default()
            };
            let new = draft.validate().unwrap();
            assert_eq!(new.source_url.as_deref(), Some(source));
        }
    }

    #[test]
    fn test_vote_direction_wire_format() {
        assert_eq!(serde_json::to_string(&VoteDirection::Down).unwrap(), "-1");
        let up: VoteDirection = serde_json::from_str("1").unwrap();
        assert_eq!(up, VoteDirection::Up);
        assert!(serde_json::from_str::<VoteDirection>("0").is_err());
        assert_eq!(VoteDirection::Up.opposite(), VoteDirection::Down);
    }

    #[test]
    fn test_counter_argument_defaults() {
        let counter: CounterArgument = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "content": "Minutes are public",
            "upvotes": null,
            "author_name": null,
            "quality_score": 0.8
        }))
        .unwrap();
        assert_eq!(counter.author_name, ANONYMOUS_AUTHOR);
        assert_eq!(counter.source_type, SourceType::Text);
        assert_eq!(counter.upvotes, 0);
    }
}
