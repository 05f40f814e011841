use anyhow::{anyhow, Result};
use argon2::Config as ArgonConfig;
use rand::Rng;

/// Hashes a password with Argon2 and a fresh random 16-byte salt.
/// The returned string is self-describing (PHC encoded) and carries the salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();
    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map_err(|e| anyhow!("Password hashing failed: {e}"))
}

/// Verifies a password against an encoded hash. Malformed hashes verify as false.
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}

/// Runs hashing on the blocking pool; Argon2 is deliberately CPU-heavy.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(encoded: String, password: String) -> Result<bool> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&encoded, &password)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "password123"));
        assert!(!verify_password(&hash, "password124"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        assert!(!verify_password("not-a-hash", "anything"));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("s3cret!".to_string()).await.unwrap();
        assert!(verify_password_blocking(hash, "s3cret!".to_string())
            .await
            .unwrap());
    }
}
