// ABOUTME: Review state machine: transition table and pure command validation
// ABOUTME: Decides whether an action or acceptance decision may be applied, without touching storage

use casebook_core::normalize_text;

use crate::capability::{can_accept, can_review, is_admin};
use crate::error::{WorkflowError, WorkflowResult};
use crate::types::{
    AcceptanceDecision, AcceptanceStatus, Actor, ReviewActionKind, Requirement, RequirementStatus,
};

/// Who may perform a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRule {
    /// Only the requirement's author
    Author,
    /// Reviewer-capable, and the assigned reviewer when one is set (admins exempt)
    AssignedReviewer,
    /// Any reviewer-capable user
    Reviewer,
    /// Any known user
    Anyone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: ReviewActionKind,
    pub from: &'static [RequirementStatus],
    pub to: RequirementStatus,
    pub actor: ActorRule,
    pub comment_required: bool,
    pub touches_reviewed_at: bool,
}

const SUBMIT: TransitionRule = TransitionRule {
    action: ReviewActionKind::Submit,
    from: &[RequirementStatus::Draft],
    to: RequirementStatus::PendingReview,
    actor: ActorRule::Author,
    comment_required: false,
    touches_reviewed_at: false,
};

const APPROVE: TransitionRule = TransitionRule {
    action: ReviewActionKind::Approve,
    from: &[RequirementStatus::PendingReview],
    to: RequirementStatus::Approved,
    actor: ActorRule::AssignedReviewer,
    comment_required: false,
    touches_reviewed_at: true,
};

const REJECT: TransitionRule = TransitionRule {
    action: ReviewActionKind::Reject,
    from: &[RequirementStatus::PendingReview],
    to: RequirementStatus::Draft,
    actor: ActorRule::AssignedReviewer,
    comment_required: true,
    touches_reviewed_at: true,
};

const REQUEST_CHANGES: TransitionRule = TransitionRule {
    action: ReviewActionKind::RequestChanges,
    from: &[RequirementStatus::PendingReview],
    to: RequirementStatus::Draft,
    actor: ActorRule::AssignedReviewer,
    comment_required: true,
    touches_reviewed_at: true,
};

const START: TransitionRule = TransitionRule {
    action: ReviewActionKind::Start,
    from: &[RequirementStatus::Approved],
    to: RequirementStatus::InProgress,
    actor: ActorRule::Anyone,
    comment_required: false,
    touches_reviewed_at: false,
};

const COMPLETE: TransitionRule = TransitionRule {
    action: ReviewActionKind::Complete,
    from: &[RequirementStatus::InProgress],
    to: RequirementStatus::Completed,
    actor: ActorRule::Anyone,
    comment_required: false,
    touches_reviewed_at: false,
};

const REOPEN: TransitionRule = TransitionRule {
    action: ReviewActionKind::Reopen,
    from: &[
        RequirementStatus::Approved,
        RequirementStatus::InProgress,
        RequirementStatus::Completed,
    ],
    to: RequirementStatus::InProgress,
    actor: ActorRule::Reviewer,
    comment_required: false,
    touches_reviewed_at: true,
};

/// Every legal status transition. Anything not listed here is rejected.
pub const TRANSITIONS: &[TransitionRule] = &[
    SUBMIT,
    APPROVE,
    REJECT,
    REQUEST_CHANGES,
    START,
    COMPLETE,
    REOPEN,
];

pub fn rule_for(action: ReviewActionKind) -> &'static TransitionRule {
    match action {
        ReviewActionKind::Submit => &SUBMIT,
        ReviewActionKind::Approve => &APPROVE,
        ReviewActionKind::Reject => &REJECT,
        ReviewActionKind::RequestChanges => &REQUEST_CHANGES,
        ReviewActionKind::Start => &START,
        ReviewActionKind::Complete => &COMPLETE,
        ReviewActionKind::Reopen => &REOPEN,
    }
}

/// A transition that passed every check and is ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransition {
    pub action: ReviewActionKind,
    pub from: RequirementStatus,
    pub to: RequirementStatus,
    pub comment: Option<String>,
    pub touches_reviewed_at: bool,
}

/// Validate a transition request.
///
/// Checks run in a fixed order so callers see the most fundamental problem first:
/// the transition itself, then the actor's authority, then the comment.
pub fn validate_action(
    requirement: &Requirement,
    actor: &Actor,
    action: ReviewActionKind,
    comment: Option<&str>,
) -> WorkflowResult<ValidatedTransition> {
    let rule = rule_for(action);

    if !rule.from.contains(&requirement.status) {
        return Err(WorkflowError::InvalidTransition {
            action,
            from: requirement.status,
        });
    }

    check_actor(rule, requirement, actor)?;

    let comment = normalize_text(comment);
    if rule.comment_required && comment.is_none() {
        return Err(WorkflowError::CommentRequired(
            action.as_str().to_lowercase().replace('_', " "),
        ));
    }

    Ok(ValidatedTransition {
        action,
        from: requirement.status,
        to: rule.to,
        comment,
        touches_reviewed_at: rule.touches_reviewed_at,
    })
}

fn check_actor(rule: &TransitionRule, requirement: &Requirement, actor: &Actor) -> WorkflowResult<()> {
    match rule.actor {
        ActorRule::Author => {
            if actor.id != requirement.author_id {
                return Err(WorkflowError::Unauthorized(format!(
                    "only the author can {}",
                    rule.action.as_str().to_lowercase()
                )));
            }
        }
        ActorRule::AssignedReviewer => {
            if !can_review(actor) {
                return Err(WorkflowError::Unauthorized(format!(
                    "role {} cannot review requirements",
                    actor.role
                )));
            }
            if let Some(reviewer_id) = &requirement.reviewer_id {
                if reviewer_id != &actor.id && !is_admin(actor) {
                    return Err(WorkflowError::Unauthorized(format!(
                        "requirement is assigned to reviewer {}",
                        reviewer_id
                    )));
                }
            }
        }
        ActorRule::Reviewer => {
            if !can_review(actor) {
                return Err(WorkflowError::Unauthorized(format!(
                    "role {} cannot {}",
                    actor.role,
                    rule.action.as_str().to_lowercase()
                )));
            }
        }
        ActorRule::Anyone => {}
    }
    Ok(())
}

/// Validate an acceptance decision, returning the normalised notes.
///
/// Acceptance is only decided once, and never on a draft.
pub fn validate_acceptance(
    requirement: &Requirement,
    actor: &Actor,
    decision: AcceptanceDecision,
    notes: Option<&str>,
) -> WorkflowResult<Option<String>> {
    if requirement.status == RequirementStatus::Draft {
        return Err(WorkflowError::InvalidState(
            "a draft requirement cannot be accepted or rejected".to_string(),
        ));
    }
    if requirement.acceptance_status != AcceptanceStatus::Pending {
        return Err(WorkflowError::InvalidState(format!(
            "acceptance was already decided ({})",
            requirement.acceptance_status
        )));
    }

    if !can_accept(actor) {
        return Err(WorkflowError::Unauthorized(format!(
            "role {} cannot decide acceptance",
            actor.role
        )));
    }

    let notes = normalize_text(notes);
    if decision == AcceptanceDecision::Reject && notes.is_none() {
        return Err(WorkflowError::CommentRequired(
            "reject acceptance".to_string(),
        ));
    }

    Ok(notes)
}

/// Whether the actor may edit or delete the requirement body
pub fn can_edit(requirement: &Requirement, actor: &Actor) -> bool {
    requirement.status == RequirementStatus::Draft
        && (actor.id == requirement.author_id || is_admin(actor))
}

/// Transitions the actor could apply right now, ignoring comment requirements
pub fn allowed_actions(requirement: &Requirement, actor: &Actor) -> Vec<ReviewActionKind> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.from.contains(&requirement.status))
        .filter(|rule| check_actor(rule, requirement, actor).is_ok())
        .map(|rule| rule.action)
        .collect()
}

/// Whether the actor could accept or reject the requirement right now
pub fn can_decide_acceptance(requirement: &Requirement, actor: &Actor) -> bool {
    validate_acceptance(requirement, actor, AcceptanceDecision::Accept, None).is_ok()
}
