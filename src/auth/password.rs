use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::AuthError;

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// The result is a PHC string that carries the algorithm, parameters and salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify `password` against a stored PHC hash using the hash's own scheme and salt.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(AuthError::IncorrectPassword),
        Err(e) => Err(AuthError::Hash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret123", &hash).is_ok());
    }

    #[test]
    fn wrong_password_is_incorrect() {
        let hash = hash_password("secret123").unwrap();
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::IncorrectPassword)
        ));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret123", &b).is_ok());
    }

    #[test]
    fn corrupted_hash_is_a_hash_error() {
        assert!(matches!(verify_password("secret123", "secret123"), Err(AuthError::Hash(_))));
        assert!(matches!(verify_password("secret123", ""), Err(AuthError::Hash(_))));
    }
}
