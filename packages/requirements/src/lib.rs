// ABOUTME: Requirement review and acceptance workflow for Casebook
// ABOUTME: Transition table, capability rules, persistence seams, and the ReviewService

pub mod capability;
pub mod error;
pub mod memory;
pub mod notify;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;
pub mod workflow;

pub use capability::{can_accept, can_review, is_admin, REVIEWER_ROLES};
pub use error::{WorkflowError, WorkflowResult};
pub use memory::InMemoryReviewStore;
pub use notify::{NoopNotifier, Notifier, NotifyError, ReviewEvent, ReviewEventKind};
pub use service::ReviewService;
pub use storage::RequirementStorage;
pub use store::{ActorDirectory, RequirementFilter, ReviewStore, TransitionCommit};
pub use types::{
    AcceptanceDecision, AcceptanceStatus, Actor, AllowedActions, Priority, ReviewAction,
    ReviewActionKind, Requirement, RequirementCreateInput, RequirementDetails,
    RequirementStatus, RequirementUpdateInput, TransitionOutcome, UserStory,
};
pub use workflow::{allowed_actions, rule_for, validate_acceptance, validate_action, TRANSITIONS};
