// ABOUTME: Persistence seams for the review workflow
// ABOUTME: ReviewStore owns requirements and their audit trail, ActorDirectory resolves users

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use casebook_storage::StorageResult;
use casebook_users::{UserRole, UserStorage};

use crate::types::{Actor, ReviewAction, Requirement, RequirementStatus};

/// Everything needed to commit one validated transition atomically
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub requirement_id: String,
    pub expected_status: RequirementStatus,
    pub expected_version: i64,
    pub to_status: RequirementStatus,
    /// Set when the transition counts as a review
    pub reviewed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub action: ReviewAction,
}

#[derive(Debug, Clone, Default)]
pub struct RequirementFilter {
    pub status: Option<RequirementStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Storage for requirements and review actions.
///
/// Writers pass the version they read; a write against a stale version fails with
/// `StorageError::VersionConflict` and leaves the stored state untouched.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_requirement(&self, requirement: &Requirement) -> StorageResult<()>;

    /// Fetch a live (not soft-deleted) requirement
    async fn get_requirement(&self, requirement_id: &str) -> StorageResult<Option<Requirement>>;

    /// Live requirements of a project, newest first, with the unpaginated total
    async fn list_requirements(
        &self,
        project_id: &str,
        filter: &RequirementFilter,
    ) -> StorageResult<(Vec<Requirement>, i64)>;

    /// Overwrite the mutable fields of `requirement` if the stored version equals
    /// `expected_version`. Returns the stored record with its version bumped.
    async fn save_requirement(
        &self,
        requirement: &Requirement,
        expected_version: i64,
    ) -> StorageResult<Requirement>;

    /// Move the requirement to `to_status` and append the review action as one unit
    async fn commit_transition(&self, commit: TransitionCommit) -> StorageResult<Requirement>;

    /// Review actions for a requirement, oldest first
    async fn list_review_actions(&self, requirement_id: &str) -> StorageResult<Vec<ReviewAction>>;
}

/// Resolves acting users and reviewer candidates
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn find_actor(&self, user_id: &str) -> StorageResult<Option<Actor>>;

    async fn actors_with_roles(&self, roles: &[UserRole]) -> StorageResult<Vec<Actor>>;
}

#[async_trait]
impl ActorDirectory for UserStorage {
    async fn find_actor(&self, user_id: &str) -> StorageResult<Option<Actor>> {
        Ok(self.find_user(user_id).await?.as_ref().map(Actor::from))
    }

    async fn actors_with_roles(&self, roles: &[UserRole]) -> StorageResult<Vec<Actor>> {
        Ok(self
            .list_users_by_roles(roles)
            .await?
            .iter()
            .map(Actor::from)
            .collect())
    }
}
