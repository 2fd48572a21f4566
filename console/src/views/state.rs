//! Load state shared by the views

/// Remote data as seen by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    /// Nothing requested yet
    Idle,
    /// First request in flight, nothing to show
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}
