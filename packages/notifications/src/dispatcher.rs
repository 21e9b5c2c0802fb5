// ABOUTME: Fire-and-forget notification dispatch for committed review events
// ABOUTME: Queues events on an unbounded channel and fans them out to recipients on a worker task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use casebook_core::truncate;
use casebook_requirements::{
    AcceptanceStatus, Actor, ActorDirectory, Notifier, NotifyError, ReviewActionKind, ReviewEvent,
    ReviewEventKind, REVIEWER_ROLES,
};

use crate::storage::NotificationStorage;
use crate::types::NotificationCreateInput;

const TITLE_PREVIEW_CHARS: usize = 60;

/// `Notifier` that hands events to a background worker
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<ReviewEvent>,
}

impl NotificationDispatcher {
    /// Start the worker. It runs until every dispatcher clone is dropped.
    pub fn spawn(
        storage: NotificationStorage,
        actors: Arc<dyn ActorDirectory>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(receiver, storage, actors));
        (Self { sender }, handle)
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, event: ReviewEvent) -> Result<(), NotifyError> {
        self.sender
            .send(event)
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<ReviewEvent>,
    storage: NotificationStorage,
    actors: Arc<dyn ActorDirectory>,
) {
    debug!("Notification worker started");

    while let Some(event) = receiver.recv().await {
        if let Err(e) = deliver(&event, &storage, actors.as_ref()).await {
            warn!(
                "Dropping {} notification for {}: {}",
                event.kind.as_str(),
                event.requirement.id,
                e
            );
        }
    }

    debug!("Notification worker stopped");
}

async fn deliver(
    event: &ReviewEvent,
    storage: &NotificationStorage,
    actors: &dyn ActorDirectory,
) -> Result<(), casebook_storage::StorageError> {
    let needs_pool = matches!(event.kind, ReviewEventKind::Transition(ReviewActionKind::Submit))
        && event.requirement.reviewer_id.is_none();
    let reviewer_pool = if needs_pool {
        actors.actors_with_roles(&REVIEWER_ROLES).await?
    } else {
        Vec::new()
    };

    let recipients = recipients_for(event, &reviewer_pool);
    let message = message_for(event);

    let mut delivered = 0;
    for user_id in &recipients {
        let result = storage
            .create(NotificationCreateInput {
                user_id: user_id.clone(),
                requirement_id: event.requirement.id.clone(),
                kind: event.kind.as_str().to_string(),
                actor_id: event.actor_id.clone(),
                message: message.clone(),
            })
            .await;

        match result {
            Ok(_) => delivered += 1,
            Err(e) => warn!(
                "Failed to store {} notification for {} on {}: {}",
                event.kind.as_str(),
                user_id,
                event.requirement.id,
                e
            ),
        }
    }

    info!(
        "Delivered {} notification for {} to {}/{} recipient(s)",
        event.kind.as_str(),
        event.requirement.id,
        delivered,
        recipients.len()
    );
    Ok(())
}

/// Users to notify about an event, deduplicated, never including the actor.
///
/// `reviewer_pool` is only consulted for a submission with no assigned reviewer.
pub fn recipients_for(event: &ReviewEvent, reviewer_pool: &[Actor]) -> Vec<String> {
    let requirement = &event.requirement;
    let candidates: Vec<String> = match event.kind {
        ReviewEventKind::Transition(ReviewActionKind::Submit) => match &requirement.reviewer_id {
            Some(reviewer_id) => vec![reviewer_id.clone()],
            None => reviewer_pool.iter().map(|a| a.id.clone()).collect(),
        },
        ReviewEventKind::Transition(
            ReviewActionKind::Approve
            | ReviewActionKind::Reject
            | ReviewActionKind::RequestChanges
            | ReviewActionKind::Reopen,
        ) => vec![requirement.author_id.clone()],
        ReviewEventKind::Transition(ReviewActionKind::Start | ReviewActionKind::Complete) => {
            std::iter::once(requirement.author_id.clone())
                .chain(requirement.reviewer_id.clone())
                .collect()
        }
        ReviewEventKind::Acceptance(_) => vec![requirement.author_id.clone()],
    };

    let mut recipients: Vec<String> = Vec::with_capacity(candidates.len());
    for id in candidates {
        if id != event.actor_id && !recipients.contains(&id) {
            recipients.push(id);
        }
    }
    recipients
}

/// Human-readable one-liner for the notification list
pub fn message_for(event: &ReviewEvent) -> String {
    let title = truncate(&event.requirement.title, TITLE_PREVIEW_CHARS);
    let base = match event.kind {
        ReviewEventKind::Transition(ReviewActionKind::Submit) => {
            format!("\"{}\" was submitted for review", title)
        }
        ReviewEventKind::Transition(ReviewActionKind::Approve) => format!("\"{}\" was approved", title),
        ReviewEventKind::Transition(ReviewActionKind::Reject) => format!("\"{}\" was rejected", title),
        ReviewEventKind::Transition(ReviewActionKind::RequestChanges) => {
            format!("Changes were requested on \"{}\"", title)
        }
        ReviewEventKind::Transition(ReviewActionKind::Start) => {
            format!("Implementation of \"{}\" started", title)
        }
        ReviewEventKind::Transition(ReviewActionKind::Complete) => {
            format!("Implementation of \"{}\" completed", title)
        }
        ReviewEventKind::Transition(ReviewActionKind::Reopen) => format!("\"{}\" was reopened", title),
        ReviewEventKind::Acceptance(AcceptanceStatus::Accepted) => format!("\"{}\" was accepted", title),
        ReviewEventKind::Acceptance(AcceptanceStatus::Rejected) => {
            format!("\"{}\" failed acceptance", title)
        }
        ReviewEventKind::Acceptance(AcceptanceStatus::Pending) => {
            format!("Acceptance of \"{}\" is pending", title)
        }
    };

    match &event.comment {
        Some(comment) => format!("{}: {}", base, comment),
        None => base,
    }
}
