// ABOUTME: Requirement type definitions
// ABOUTME: Requirements, their typed details document, review actions, and acting users

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casebook_users::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    Draft,
    PendingReview,
    Approved,
    InProgress,
    Completed,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::Draft => "DRAFT",
            RequirementStatus::PendingReview => "PENDING_REVIEW",
            RequirementStatus::Approved => "APPROVED",
            RequirementStatus::InProgress => "IN_PROGRESS",
            RequirementStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AcceptanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceStatus::Pending => "PENDING",
            AcceptanceStatus::Accepted => "ACCEPTED",
            AcceptanceStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AcceptanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Status transitions a user can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewActionKind {
    Submit,
    Approve,
    Reject,
    RequestChanges,
    Start,
    Complete,
    Reopen,
}

impl ReviewActionKind {
    pub const ALL: [ReviewActionKind; 7] = [
        ReviewActionKind::Submit,
        ReviewActionKind::Approve,
        ReviewActionKind::Reject,
        ReviewActionKind::RequestChanges,
        ReviewActionKind::Start,
        ReviewActionKind::Complete,
        ReviewActionKind::Reopen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewActionKind::Submit => "SUBMIT",
            ReviewActionKind::Approve => "APPROVE",
            ReviewActionKind::Reject => "REJECT",
            ReviewActionKind::RequestChanges => "REQUEST_CHANGES",
            ReviewActionKind::Start => "START",
            ReviewActionKind::Complete => "COMPLETE",
            ReviewActionKind::Reopen => "REOPEN",
        }
    }
}

impl fmt::Display for ReviewActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict on the acceptance axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceDecision {
    Accept,
    Reject,
}

impl AcceptanceDecision {
    pub fn resulting_status(&self) -> AcceptanceStatus {
        match self {
            AcceptanceDecision::Accept => AcceptanceStatus::Accepted,
            AcceptanceDecision::Reject => AcceptanceStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub as_a: String,
    pub i_want: String,
    pub so_that: String,
}

/// Structured body of a requirement, persisted as a single JSON column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequirementDetails {
    pub tags: Vec<String>,
    pub user_stories: Vec<UserStory>,
    pub business_rules: Vec<String>,
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub details: RequirementDetails,
    pub status: RequirementStatus,
    pub acceptance_status: AcceptanceStatus,
    pub author_id: String,
    pub reviewer_id: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub acceptance_notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One applied status transition. Never updated or removed once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAction {
    pub id: String,
    pub requirement_id: String,
    pub reviewer_id: String,
    pub action: ReviewActionKind,
    pub comment: Option<String>,
    pub from_status: RequirementStatus,
    pub to_status: RequirementStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCreateInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub details: RequirementDetails,
    pub reviewer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub details: Option<RequirementDetails>,
}

/// A resolved acting user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Result of an applied transition: the updated requirement and its audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub requirement: Requirement,
    pub action: ReviewAction,
}

/// What a given user may do to a requirement right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActions {
    pub requirement_id: String,
    pub actions: Vec<ReviewActionKind>,
    pub can_decide_acceptance: bool,
    pub can_edit: bool,
}
