// ABOUTME: Shared handler state wrapping the database pool and domain services
// ABOUTME: Wires user, notification, and review storage onto a single SQLite pool

use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use casebook_notifications::{NotificationDispatcher, NotificationStorage};
use casebook_requirements::{Notifier, ReviewService};
use casebook_storage::{init_pool_with_path, PoolSettings, StorageResult};
use casebook_users::UserStorage;

/// State handed to every axum handler
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub user_storage: Arc<UserStorage>,
    pub notification_storage: Arc<NotificationStorage>,
    pub review_service: ReviewService,
}

impl DbState {
    /// Build state around an already-migrated pool
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            user_storage: Arc::new(UserStorage::new(pool.clone())),
            notification_storage: Arc::new(NotificationStorage::new(pool.clone())),
            review_service: ReviewService::with_pool(pool.clone(), notifier),
            pool,
        }
    }

    /// Build state with a running notification worker.
    ///
    /// Must be called inside a tokio runtime. The worker exits once the state and
    /// all of its clones are dropped.
    pub fn with_dispatcher(pool: SqlitePool) -> (Self, JoinHandle<()>) {
        let (dispatcher, worker) = NotificationDispatcher::spawn(
            NotificationStorage::new(pool.clone()),
            Arc::new(UserStorage::new(pool.clone())),
        );
        (Self::new(pool, Arc::new(dispatcher)), worker)
    }

    /// Open (and migrate) the database at `path`, then start the notification worker
    pub async fn init_with_path(
        path: &Path,
        settings: &PoolSettings,
    ) -> StorageResult<(Self, JoinHandle<()>)> {
        let pool = init_pool_with_path(path, settings).await?;
        Ok(Self::with_dispatcher(pool))
    }
}
