// ABOUTME: In-app notifications for Casebook
// ABOUTME: Notification storage and the background dispatcher fed by the review workflow

pub mod dispatcher;
pub mod storage;
pub mod types;

pub use dispatcher::{message_for, recipients_for, NotificationDispatcher};
pub use storage::NotificationStorage;
pub use types::{Notification, NotificationCreateInput};
