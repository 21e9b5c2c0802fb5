// ABOUTME: Notification type definitions
// ABOUTME: Stored in-app notices that users poll for review activity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub requirement_id: String,
    pub kind: String,
    pub actor_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationCreateInput {
    pub user_id: String,
    pub requirement_id: String,
    pub kind: String,
    pub actor_id: String,
    pub message: String,
}
