//! Client side of the dashboard
//!
//! Talks to the dashboard HTTP service and keeps the per-user state a
//! browser would: the anonymous voter identity, the local vote ledger and
//! the counter-argument form.

pub mod api;
pub mod counter;
pub mod display;
pub mod identity;
pub mod poll;
pub mod view_state;

pub use api::{CounterArgumentApi, DashboardClient, ListParams, ViewKind};
pub use counter::CounterArgumentPanel;
pub use identity::{IdentityProvider, LocalIdentityStore};
pub use poll::PollHandle;
pub use view_state::ViewState;

use crate::model::DraftError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success answer; `message` is the server's error text
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid dashboard URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Invalid(#[from] DraftError),

    #[error("Local state error: {0}")]
    State(String),
}
