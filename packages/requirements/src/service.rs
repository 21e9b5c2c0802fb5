// ABOUTME: Review service exposing requirement management and workflow commands
// ABOUTME: Validates against the transition table, commits through ReviewStore, then notifies

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use casebook_core::{generate_id, normalize_text};
use casebook_users::UserStorage;

use crate::capability::{can_review, is_admin};
use crate::error::{WorkflowError, WorkflowResult};
use crate::notify::{Notifier, ReviewEvent, ReviewEventKind};
use crate::storage::RequirementStorage;
use crate::store::{ActorDirectory, RequirementFilter, ReviewStore, TransitionCommit};
use crate::types::{
    AcceptanceDecision, AcceptanceStatus, Actor, AllowedActions, ReviewAction, ReviewActionKind,
    Requirement, RequirementCreateInput, RequirementStatus, RequirementUpdateInput,
    TransitionOutcome,
};
use crate::workflow::{allowed_actions, can_decide_acceptance, can_edit, validate_acceptance, validate_action};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    actors: Arc<dyn ActorDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        actors: Arc<dyn ActorDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            actors,
            notifier,
        }
    }

    /// Service backed by the SQLite requirement and user tables
    pub fn with_pool(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(
            Arc::new(RequirementStorage::new(pool.clone())),
            Arc::new(UserStorage::new(pool)),
            notifier,
        )
    }

    // ------------------------------------------------------------------
    // Requirement management
    // ------------------------------------------------------------------

    pub async fn create_requirement(
        &self,
        project_id: &str,
        author_id: &str,
        input: RequirementCreateInput,
    ) -> WorkflowResult<Requirement> {
        let author = self.resolve_actor(author_id).await?;

        let project_id = normalize_text(Some(project_id))
            .ok_or_else(|| WorkflowError::Validation("project id must not be empty".to_string()))?;
        let title = normalize_text(Some(&input.title))
            .ok_or_else(|| WorkflowError::Validation("title must not be empty".to_string()))?;

        let reviewer_id = match normalize_text(input.reviewer_id.as_deref()) {
            Some(reviewer_id) => {
                self.ensure_reviewer_candidate(&reviewer_id).await?;
                Some(reviewer_id)
            }
            None => None,
        };

        let now = Utc::now();
        let requirement = Requirement {
            id: generate_id("req"),
            project_id,
            title,
            description: normalize_text(input.description.as_deref()),
            priority: input.priority,
            details: input.details,
            status: RequirementStatus::Draft,
            acceptance_status: AcceptanceStatus::Pending,
            author_id: author.id,
            reviewer_id,
            reviewed_at: None,
            accepted_at: None,
            acceptance_notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.store.insert_requirement(&requirement).await?;
        info!(
            "Created requirement {} in project {}",
            requirement.id, requirement.project_id
        );

        Ok(requirement)
    }

    pub async fn get_requirement(&self, requirement_id: &str) -> WorkflowResult<Requirement> {
        self.load_requirement(requirement_id).await
    }

    pub async fn list_requirements(
        &self,
        project_id: &str,
        filter: &RequirementFilter,
    ) -> WorkflowResult<(Vec<Requirement>, i64)> {
        Ok(self.store.list_requirements(project_id, filter).await?)
    }

    /// Edit the body of a draft. Only the author or an admin may do so.
    pub async fn update_requirement(
        &self,
        requirement_id: &str,
        actor_id: &str,
        input: RequirementUpdateInput,
    ) -> WorkflowResult<Requirement> {
        let current = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;
        ensure_editable(&current, &actor, "edited")?;

        let mut updated = current.clone();
        if let Some(title) = input.title {
            updated.title = normalize_text(Some(&title))
                .ok_or_else(|| WorkflowError::Validation("title must not be empty".to_string()))?;
        }
        if let Some(description) = input.description {
            updated.description = normalize_text(Some(&description));
        }
        if let Some(priority) = input.priority {
            updated.priority = priority;
        }
        if let Some(details) = input.details {
            updated.details = details;
        }
        updated.updated_at = Utc::now();

        let saved = self.store.save_requirement(&updated, current.version).await?;
        info!("Updated requirement {} (version {})", saved.id, saved.version);
        Ok(saved)
    }

    /// Assign, replace, or clear the reviewer. Takes effect for the next action.
    pub async fn assign_reviewer(
        &self,
        requirement_id: &str,
        actor_id: &str,
        reviewer_id: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        let current = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;

        if current.status == RequirementStatus::Completed {
            return Err(WorkflowError::InvalidState(
                "reviewer cannot change on a completed requirement".to_string(),
            ));
        }
        if actor.id != current.author_id && !can_review(&actor) {
            return Err(WorkflowError::Unauthorized(format!(
                "role {} cannot assign reviewers",
                actor.role
            )));
        }

        let reviewer_id = normalize_text(reviewer_id);
        if let Some(candidate) = &reviewer_id {
            self.ensure_reviewer_candidate(candidate).await?;
        }

        let mut updated = current.clone();
        updated.reviewer_id = reviewer_id;
        updated.updated_at = Utc::now();

        let saved = self.store.save_requirement(&updated, current.version).await?;
        info!(
            "Reviewer of {} set to {:?} by {}",
            saved.id, saved.reviewer_id, actor.id
        );
        Ok(saved)
    }

    /// Soft-delete a draft; its audit trail is kept
    pub async fn delete_requirement(&self, requirement_id: &str, actor_id: &str) -> WorkflowResult<()> {
        let current = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;
        ensure_editable(&current, &actor, "deleted")?;

        let now = Utc::now();
        let mut deleted = current.clone();
        deleted.deleted_at = Some(now);
        deleted.updated_at = now;

        self.store.save_requirement(&deleted, current.version).await?;
        info!("Deleted requirement {} by {}", requirement_id, actor.id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Review transitions
    // ------------------------------------------------------------------

    /// Validate and commit one transition, appending its audit record
    pub async fn apply_review_action(
        &self,
        requirement_id: &str,
        actor_id: &str,
        action: ReviewActionKind,
        comment: Option<&str>,
    ) -> WorkflowResult<TransitionOutcome> {
        let requirement = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;

        let validated = validate_action(&requirement, &actor, action, comment).map_err(|e| {
            warn!(
                "Rejected {} on {} by {}: {}",
                action, requirement_id, actor_id, e
            );
            e
        })?;

        let now = Utc::now();
        let record = ReviewAction {
            id: generate_id("rva"),
            requirement_id: requirement.id.clone(),
            reviewer_id: actor.id.clone(),
            action,
            comment: validated.comment.clone(),
            from_status: validated.from,
            to_status: validated.to,
            created_at: now,
        };

        let commit = TransitionCommit {
            requirement_id: requirement.id.clone(),
            expected_status: requirement.status,
            expected_version: requirement.version,
            to_status: validated.to,
            reviewed_at: validated.touches_reviewed_at.then_some(now),
            updated_at: now,
            action: record.clone(),
        };

        let updated = self.store.commit_transition(commit).await.map_err(|e| {
            let err = WorkflowError::from(e);
            if matches!(err, WorkflowError::ConcurrentModification(_)) {
                warn!("Concurrent change lost {} on {}", action, requirement_id);
            }
            err
        })?;

        info!(
            "{} applied to {} by {}: {} -> {}",
            action, updated.id, actor.id, validated.from, validated.to
        );

        self.publish(ReviewEvent {
            kind: ReviewEventKind::Transition(action),
            requirement: updated.clone(),
            actor_id: actor.id,
            comment: validated.comment,
            occurred_at: now,
        });

        Ok(TransitionOutcome {
            requirement: updated,
            action: record,
        })
    }

    pub async fn submit_for_review(&self, requirement_id: &str, actor_id: &str) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Submit, None)
            .await
    }

    pub async fn approve_review(
        &self,
        requirement_id: &str,
        actor_id: &str,
        comment: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Approve, comment)
            .await
    }

    pub async fn reject_review(
        &self,
        requirement_id: &str,
        actor_id: &str,
        comment: &str,
    ) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Reject, Some(comment))
            .await
    }

    pub async fn request_changes(
        &self,
        requirement_id: &str,
        actor_id: &str,
        comment: &str,
    ) -> WorkflowResult<Requirement> {
        self.transition(
            requirement_id,
            actor_id,
            ReviewActionKind::RequestChanges,
            Some(comment),
        )
        .await
    }

    pub async fn start_implementation(&self, requirement_id: &str, actor_id: &str) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Start, None)
            .await
    }

    pub async fn complete_implementation(
        &self,
        requirement_id: &str,
        actor_id: &str,
    ) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Complete, None)
            .await
    }

    pub async fn reopen(
        &self,
        requirement_id: &str,
        actor_id: &str,
        comment: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        self.transition(requirement_id, actor_id, ReviewActionKind::Reopen, comment)
            .await
    }

    async fn transition(
        &self,
        requirement_id: &str,
        actor_id: &str,
        action: ReviewActionKind,
        comment: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        self.apply_review_action(requirement_id, actor_id, action, comment)
            .await
            .map(|outcome| outcome.requirement)
    }

    // ------------------------------------------------------------------
    // Acceptance
    // ------------------------------------------------------------------

    pub async fn accept_requirement(
        &self,
        requirement_id: &str,
        actor_id: &str,
        notes: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        self.decide_acceptance(requirement_id, actor_id, AcceptanceDecision::Accept, notes)
            .await
    }

    pub async fn reject_requirement(
        &self,
        requirement_id: &str,
        actor_id: &str,
        notes: &str,
    ) -> WorkflowResult<Requirement> {
        self.decide_acceptance(requirement_id, actor_id, AcceptanceDecision::Reject, Some(notes))
            .await
    }

    /// Record an acceptance verdict. No review action is written for it.
    pub async fn decide_acceptance(
        &self,
        requirement_id: &str,
        actor_id: &str,
        decision: AcceptanceDecision,
        notes: Option<&str>,
    ) -> WorkflowResult<Requirement> {
        let current = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;

        let notes = validate_acceptance(&current, &actor, decision, notes).map_err(|e| {
            warn!(
                "Rejected acceptance {:?} on {} by {}: {}",
                decision, requirement_id, actor_id, e
            );
            e
        })?;

        let now = Utc::now();
        let mut decided = current.clone();
        decided.acceptance_status = decision.resulting_status();
        decided.accepted_at = Some(now);
        decided.acceptance_notes = notes.clone();
        decided.updated_at = now;

        let saved = self.store.save_requirement(&decided, current.version).await?;
        info!(
            "Acceptance of {} set to {} by {}",
            saved.id, saved.acceptance_status, actor.id
        );

        self.publish(ReviewEvent {
            kind: ReviewEventKind::Acceptance(saved.acceptance_status),
            requirement: saved.clone(),
            actor_id: actor.id,
            comment: notes,
            occurred_at: now,
        });

        Ok(saved)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Audit trail, oldest first. Empty for an unknown id; kept after soft deletion.
    pub async fn load_review_history(&self, requirement_id: &str) -> WorkflowResult<Vec<ReviewAction>> {
        Ok(self.store.list_review_actions(requirement_id).await?)
    }

    pub async fn allowed_actions(&self, requirement_id: &str, actor_id: &str) -> WorkflowResult<AllowedActions> {
        let requirement = self.load_requirement(requirement_id).await?;
        let actor = self.resolve_actor(actor_id).await?;

        Ok(AllowedActions {
            requirement_id: requirement.id.clone(),
            actions: allowed_actions(&requirement, &actor),
            can_decide_acceptance: can_decide_acceptance(&requirement, &actor),
            can_edit: can_edit(&requirement, &actor),
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn load_requirement(&self, requirement_id: &str) -> WorkflowResult<Requirement> {
        self.store
            .get_requirement(requirement_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Requirement {}", requirement_id)))
    }

    async fn resolve_actor(&self, actor_id: &str) -> WorkflowResult<Actor> {
        self.actors
            .find_actor(actor_id)
            .await?
            .ok_or_else(|| WorkflowError::Unauthorized(format!("unknown user {}", actor_id)))
    }

    async fn ensure_reviewer_candidate(&self, reviewer_id: &str) -> WorkflowResult<()> {
        match self.actors.find_actor(reviewer_id).await? {
            Some(reviewer) if can_review(&reviewer) => Ok(()),
            Some(reviewer) => Err(WorkflowError::Validation(format!(
                "user {} has role {} and cannot review",
                reviewer.id, reviewer.role
            ))),
            None => Err(WorkflowError::Validation(format!(
                "reviewer {} does not exist",
                reviewer_id
            ))),
        }
    }

    fn publish(&self, event: ReviewEvent) {
        let kind = event.kind;
        let requirement_id = event.requirement.id.clone();
        if let Err(e) = self.notifier.notify(event) {
            warn!(
                "Failed to queue {} notification for {}: {}",
                kind.as_str(),
                requirement_id,
                e
            );
        }
    }
}

fn ensure_editable(requirement: &Requirement, actor: &Actor, verb: &str) -> WorkflowResult<()> {
    if requirement.status != RequirementStatus::Draft {
        return Err(WorkflowError::InvalidState(format!(
            "only draft requirements can be {} (status is {})",
            verb, requirement.status
        )));
    }
    if actor.id != requirement.author_id && !is_admin(actor) {
        return Err(WorkflowError::Unauthorized(format!(
            "only the author or an admin can edit {}",
            requirement.id
        )));
    }
    Ok(())
}
