// ABOUTME: In-memory implementation of ReviewStore and ActorDirectory
// ABOUTME: RwLock-guarded maps for unit tests and embedders without a database file

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use casebook_storage::{StorageError, StorageResult};
use casebook_users::UserRole;

use crate::store::{ActorDirectory, RequirementFilter, ReviewStore, TransitionCommit};
use crate::types::{Actor, ReviewAction, Requirement};

#[derive(Default)]
struct Inner {
    requirements: HashMap<String, Requirement>,
    actions: Vec<ReviewAction>,
    /// Insertion sequence, used for stable newest-first listing
    sequence: HashMap<String, u64>,
    next_sequence: u64,
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    inner: RwLock<Inner>,
    actors: RwLock<HashMap<String, Actor>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user that commands can act as
    pub async fn add_actor(&self, actor: Actor) {
        self.actors.write().await.insert(actor.id.clone(), actor);
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn insert_requirement(&self, requirement: &Requirement) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        if inner.requirements.contains_key(&requirement.id) {
            return Err(StorageError::Duplicate(format!(
                "requirement '{}'",
                requirement.id
            )));
        }
        let seq = inner.next_sequence;
        inner.next_sequence += 1;
        inner.sequence.insert(requirement.id.clone(), seq);
        inner
            .requirements
            .insert(requirement.id.clone(), requirement.clone());
        Ok(())
    }

    async fn get_requirement(&self, requirement_id: &str) -> StorageResult<Option<Requirement>> {
        let inner = self.inner.read().await;
        Ok(inner
            .requirements
            .get(requirement_id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn list_requirements(
        &self,
        project_id: &str,
        filter: &RequirementFilter,
    ) -> StorageResult<(Vec<Requirement>, i64)> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Requirement> = inner
            .requirements
            .values()
            .filter(|r| r.deleted_at.is_none() && r.project_id == project_id)
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .collect();

        matching.sort_by_key(|r| std::cmp::Reverse(inner.sequence.get(&r.id).copied()));
        let total = matching.len() as i64;

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn save_requirement(
        &self,
        requirement: &Requirement,
        expected_version: i64,
    ) -> StorageResult<Requirement> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .requirements
            .get_mut(&requirement.id)
            .filter(|r| r.deleted_at.is_none() && r.version == expected_version)
            .ok_or_else(|| StorageError::VersionConflict(requirement.id.clone()))?;

        stored.title = requirement.title.clone();
        stored.description = requirement.description.clone();
        stored.priority = requirement.priority;
        stored.details = requirement.details.clone();
        stored.acceptance_status = requirement.acceptance_status;
        stored.reviewer_id = requirement.reviewer_id.clone();
        stored.accepted_at = requirement.accepted_at;
        stored.acceptance_notes = requirement.acceptance_notes.clone();
        stored.updated_at = requirement.updated_at;
        stored.deleted_at = requirement.deleted_at;
        stored.version += 1;

        Ok(stored.clone())
    }

    async fn commit_transition(&self, commit: TransitionCommit) -> StorageResult<Requirement> {
        // One write guard covers both the status change and the append
        let mut inner = self.inner.write().await;
        let stored = inner
            .requirements
            .get_mut(&commit.requirement_id)
            .filter(|r| {
                r.deleted_at.is_none()
                    && r.status == commit.expected_status
                    && r.version == commit.expected_version
            })
            .ok_or_else(|| StorageError::VersionConflict(commit.requirement_id.clone()))?;

        stored.status = commit.to_status;
        if commit.reviewed_at.is_some() {
            stored.reviewed_at = commit.reviewed_at;
        }
        stored.updated_at = commit.updated_at;
        stored.version += 1;
        let updated = stored.clone();

        inner.actions.push(commit.action);
        Ok(updated)
    }

    async fn list_review_actions(&self, requirement_id: &str) -> StorageResult<Vec<ReviewAction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .actions
            .iter()
            .filter(|a| a.requirement_id == requirement_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActorDirectory for InMemoryReviewStore {
    async fn find_actor(&self, user_id: &str) -> StorageResult<Option<Actor>> {
        Ok(self.actors.read().await.get(user_id).cloned())
    }

    async fn actors_with_roles(&self, roles: &[UserRole]) -> StorageResult<Vec<Actor>> {
        let actors = self.actors.read().await;
        let mut matching: Vec<Actor> = actors
            .values()
            .filter(|a| roles.contains(&a.role))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }
}
