use async_trait::async_trait;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::{StoreError, UserStore};
use crate::models::User;

const COLLECTION: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    /// Opens the `users` collection and makes sure the unique username index
    /// exists.
    pub async fn new(db: &Database) -> Result<Self, AppError> {
        let users = db.collection::<User>(COLLECTION);

        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        users.create_index(username_index, None).await.map_err(|e| {
            tracing::error!("Failed to create username index on users collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created unique index on users.username");

        Ok(Self { users })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        }))
    )
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
            Err(e) => Err(StoreError::Backend(e.into())),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn replace_password_hash(
        &self,
        username: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .users
            .find_one_and_update(
                doc! { "username": username, "password_hash": current_hash },
                doc! { "$set": { "password_hash": new_hash } },
                options,
            )
            .await?)
    }
}
