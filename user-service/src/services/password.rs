//! Argon2id hashing. Both operations are CPU-bound and run on the blocking
//! pool so they never stall a runtime worker.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use service_core::error::AppError;

/// Argon2id with a random salt; the result is a self-describing PHC string.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| AppError::InternalError(e.into()))?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(e.into()))?
}

fn hash_blocking(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to hash password: {}", e)))
}

fn verify_blocking(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let first = hash_password("hunter2").await.unwrap();
        let second = hash_password("hunter2").await.unwrap();

        assert_ne!(first, "hunter2");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &first).await.unwrap());
        assert!(!verify_password("hunter3", &first).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash").await.is_err());
    }

    // On a single-threaded runtime another task can only make progress while
    // hashing if the work has left the runtime thread.
    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_thread_free() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        let hash = hash_password("hunter2").await.unwrap();
        assert!(ran.load(Ordering::SeqCst));

        ran.store(false, Ordering::SeqCst);
        let flag = ran.clone();
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });
        assert!(verify_password("hunter2", &hash).await.unwrap());
        assert!(ran.load(Ordering::SeqCst));
    }
}
