use serde::{Deserialize, Serialize};

/// What a rendered shelf shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    Content,
    Empty,
}

/// Recoverable presenter failures, each shown inline with a retry action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ContainerTimeout,
    FetchFailed,
}

/// Presenter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenterState {
    /// Nothing painted; still listening for notifications
    #[default]
    Idle,
    AwaitingContainer,
    /// One-time placeholder pointing at the source page
    FirstRun,
    Rendered(RenderKind),
    Error(FailureKind),
}

impl PresenterState {
    /// States whose view self-heals when the host page removes it
    pub fn is_painted(&self) -> bool {
        matches!(self, PresenterState::Rendered(_) | PresenterState::FirstRun)
    }
}
