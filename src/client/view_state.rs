use std::fmt::Display;

/// What a list view currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Empty,
    Ready(T),
    /// Load failed; holds the message shown to the user
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    /// Settle a finished load. `is_empty` decides between `Empty` and `Ready`.
    pub fn from_result<E: Display>(result: Result<T, E>, is_empty: impl FnOnce(&T) -> bool) -> Self {
        match result {
            Ok(value) if is_empty(&value) => ViewState::Empty,
            Ok(value) => ViewState::Ready(value),
            Err(e) => ViewState::Error(e.to_string()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}
