//! Argon2id password hashing and random secrets for invites.
//!
//! Hashes use the PHC string format, so algorithm parameters and salt travel
//! with the hash itself.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distr::Alphanumeric};

use crate::{EngineError, ResultEngine};

/// Minimum length of a permanent password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const INVITE_TOKEN_BYTES: usize = 20;
const TEMP_PASSWORD_LENGTH: usize = 8;

pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Internal(format!("password hashing failed: {err}")))
}

/// Returns `Ok(false)` on mismatch; errors only for a corrupt stored hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> ResultEngine<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| EngineError::Internal(format!("stored password hash is invalid: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(EngineError::Internal(format!(
            "password verification failed: {err}"
        ))),
    }
}

pub(crate) fn validate_password_strength(password: &str) -> ResultEngine<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(EngineError::InvalidArgument(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// 20 random bytes, hex encoded.
pub(crate) fn generate_invite_token() -> String {
    let bytes: [u8; INVITE_TOKEN_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn generate_temp_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(EngineError::Internal(_))
        ));
    }

    #[test]
    fn password_strength_boundary() {
        assert!(validate_password_strength("12345").is_err());
        assert!(validate_password_strength("123456").is_ok());
    }

    #[test]
    fn generated_secrets_have_expected_shape() {
        let token = generate_invite_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_invite_token());

        let temp = generate_temp_password();
        assert_eq!(temp.len(), 8);
        assert!(temp.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
