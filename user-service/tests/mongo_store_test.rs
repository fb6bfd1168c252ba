//! Requires a running MongoDB at `MONGODB_URI`.

use mongodb::Client;
use user_service::models::User;
use user_service::store::{MongoUserStore, StoreError, UserStore};
use uuid::Uuid;

async fn store() -> MongoUserStore {
    let uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = Client::with_uri_str(&uri).await.unwrap();
    let db = client.database(&format!("usersvc_test_{}", Uuid::new_v4().simple()));
    MongoUserStore::new(&db).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn unique_index_rejects_duplicate_username() {
    let store = store().await;
    let user = User::new("ivan".into(), "Ivan".into(), "hash".into());
    store.insert(&user).await.unwrap();

    let again = User::new("ivan".into(), "Other".into(), "hash2".into());
    assert!(matches!(
        store.insert(&again).await,
        Err(StoreError::Duplicate)
    ));
}

#[tokio::test]
#[ignore]
async fn find_one_and_update_returns_new_hash() {
    let store = store().await;
    let user = User::new("judy".into(), "Judy".into(), "h1".into());
    store.insert(&user).await.unwrap();

    assert!(store
        .replace_password_hash("judy", "wrong", "h2")
        .await
        .unwrap()
        .is_none());

    let updated = store
        .replace_password_hash("judy", "h1", "h2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.password_hash, "h2");
    assert_eq!(updated.id, user.id);
}
