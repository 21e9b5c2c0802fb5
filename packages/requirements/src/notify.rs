// ABOUTME: Notification seam for committed workflow changes
// ABOUTME: Events are handed off without blocking; delivery failures never reach the caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AcceptanceStatus, ReviewActionKind, Requirement};

/// What happened to the requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ReviewEventKind {
    Transition(ReviewActionKind),
    Acceptance(AcceptanceStatus),
}

impl ReviewEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewEventKind::Transition(action) => action.as_str(),
            ReviewEventKind::Acceptance(AcceptanceStatus::Accepted) => "ACCEPTED",
            ReviewEventKind::Acceptance(AcceptanceStatus::Rejected) => "ACCEPTANCE_REJECTED",
            ReviewEventKind::Acceptance(AcceptanceStatus::Pending) => "ACCEPTANCE_PENDING",
        }
    }
}

/// A committed change, carrying the requirement as it was after the commit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub kind: ReviewEventKind,
    pub requirement: Requirement,
    pub actor_id: String,
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel is closed")]
    ChannelClosed,
    #[error("Notification failed: {0}")]
    Other(String),
}

/// Receives workflow events after they are committed.
///
/// Implementations must return promptly; slow work belongs on a background task.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: ReviewEvent) -> Result<(), NotifyError>;
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: ReviewEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
