//! Query parameters for worldview list reads

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::Trend;

pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_SORT_FIELD: &str = "strength_overall";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filter, sort and pagination for a worldview list
#[derive(Debug, Clone, PartialEq)]
pub struct WorldviewQuery {
    pub limit: u32,
    pub offset: u32,
    /// Column name, passed to the backend as-is
    pub sort_by: String,
    pub order: SortOrder,
    pub trend: Option<Trend>,
    pub min_strength: f64,
    pub archived: Option<bool>,
}

impl Default for WorldviewQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            order: SortOrder::Desc,
            trend: None,
            min_strength: 0.0,
            archived: None,
        }
    }
}

impl WorldviewQuery {
    /// PostgREST query-string pairs for this query
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            (
                "strength_overall".to_string(),
                format!("gte.{}", self.min_strength),
            ),
        ];

        if let Some(trend) = self.trend {
            params.push(("trend".to_string(), format!("eq.{}", trend.as_str())));
        }

        if let Some(archived) = self.archived {
            params.push(("archived".to_string(), format!("is.{}", archived)));
        }

        params.push((
            "order".to_string(),
            format!("{}.{}", self.sort_by, self.order.as_str()),
        ));
        params.push(("limit".to_string(), self.limit.to_string()));
        params.push(("offset".to_string(), self.offset.to_string()));

        params
    }

    pub fn has_more(&self, total: u64) -> bool {
        (self.offset as u64) + (self.limit as u64) < total
    }
}

/// A page of rows with the total count across all pages
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Build a PostgREST `in.(...)` filter value
pub fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}
