use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

/// Hash a plaintext password into a salted PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored hash.
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
mod tests {
    use super::*;

    #[test]
    fn stored_hash_verifies_the_original_password() {
        let hash = hash_password("Rec0rds&Forms").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Rec0rds&Forms", &hash).unwrap());
    }

    #[test]
    fn near_miss_passwords_do_not_verify() {
        let hash = hash_password("Firstapp1@").unwrap();
        assert!(!verify_password("Firstapp2@", &hash).unwrap());
        assert!(!verify_password("firstapp1@", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn unparsable_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("Firstapp1@", "$argon2id$garbage").is_err());
        assert!(verify_password("Firstapp1@", "").is_err());
    }

    #[test]
    fn equal_passwords_get_distinct_salted_hashes() {
        let a = hash_password("Firstapp1@").unwrap();
        let b = hash_password("Firstapp1@").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("Firstapp1@", &a).unwrap());
        assert!(verify_password("Firstapp1@", &b).unwrap());
    }
}
