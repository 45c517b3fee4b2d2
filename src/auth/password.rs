use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn stored_hash_is_not_the_password() {
        let hash = hash_password("rewards-2024").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("rewards-2024"));
    }

    #[test]
    fn verify_accepts_only_the_hashed_password() {
        let hash = hash_password("rewards-2024").expect("hashing should succeed");
        assert!(verify_password("rewards-2024", &hash).expect("verify should succeed"));
        assert!(!verify_password("rewards-2025", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "plain-text-password").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
