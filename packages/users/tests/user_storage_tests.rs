// ABOUTME: Integration tests for user storage against a migrated SQLite file
// ABOUTME: Covers creation, lookups, role filtering, and duplicate email handling

use casebook_storage::{init_pool_with_path, PoolSettings, StorageError};
use casebook_users::{UserCreateInput, UserRole, UserStorage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn setup() -> (UserStorage, TempDir) {
    let dir = TempDir::new().unwrap();
    let pool = init_pool_with_path(&dir.path().join("users.db"), &PoolSettings::default())
        .await
        .unwrap();
    (UserStorage::new(pool), dir)
}

fn input(name: &str, email: &str, role: UserRole) -> UserCreateInput {
    UserCreateInput {
        name: name.to_string(),
        email: email.to_string(),
        role,
    }
}

#[tokio::test]
async fn test_create_and_get_user() {
    let (storage, _dir) = setup().await;

    let created = storage
        .create_user(input("  Grace Hopper ", "Grace@Example.com", UserRole::QaLead))
        .await
        .unwrap();

    assert!(created.id.starts_with("usr-"));
    assert_eq!(created.name, "Grace Hopper");
    assert_eq!(created.email, "grace@example.com");
    assert_eq!(created.role, UserRole::QaLead);

    let fetched = storage.get_user(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.role, UserRole::QaLead);

    let by_email = storage
        .get_user_by_email("GRACE@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, created.id);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let (storage, _dir) = setup().await;

    storage
        .create_user(input("Ada", "ada@example.com", UserRole::Pm))
        .await
        .unwrap();
    let err = storage
        .create_user(input("Ada Again", "ada@example.com", UserRole::Tester))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Duplicate(_)));
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let (storage, _dir) = setup().await;

    let blank_name = storage
        .create_user(input("   ", "x@example.com", UserRole::Pm))
        .await
        .unwrap_err();
    assert!(matches!(blank_name, StorageError::InvalidInput(_)));

    let bad_email = storage
        .create_user(input("X", "not-an-email", UserRole::Pm))
        .await
        .unwrap_err();
    assert!(matches!(bad_email, StorageError::InvalidInput(_)));
}

#[tokio::test]
async fn test_missing_user() {
    let (storage, _dir) = setup().await;

    assert!(matches!(
        storage.get_user("usr-missing").await,
        Err(StorageError::NotFound)
    ));
    assert!(storage.find_user("usr-missing").await.unwrap().is_none());
    assert!(matches!(
        storage.update_role("usr-missing", UserRole::Admin).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn test_list_users_by_roles() {
    let (storage, _dir) = setup().await;

    storage
        .create_user(input("Bea", "bea@example.com", UserRole::QaLead))
        .await
        .unwrap();
    storage
        .create_user(input("Al", "al@example.com", UserRole::Admin))
        .await
        .unwrap();
    storage
        .create_user(input("Cy", "cy@example.com", UserRole::Tester))
        .await
        .unwrap();

    let reviewers = storage
        .list_users_by_roles(&[UserRole::Admin, UserRole::Pm, UserRole::QaLead])
        .await
        .unwrap();
    let names: Vec<&str> = reviewers.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Al", "Bea"]);

    assert!(storage.list_users_by_roles(&[]).await.unwrap().is_empty());
    assert_eq!(storage.list_users().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_role() {
    let (storage, _dir) = setup().await;

    let user = storage
        .create_user(input("Dee", "dee@example.com", UserRole::Viewer))
        .await
        .unwrap();
    let updated = storage.update_role(&user.id, UserRole::Pm).await.unwrap();

    assert_eq!(updated.role, UserRole::Pm);
    assert!(updated.updated_at >= user.updated_at);
}
