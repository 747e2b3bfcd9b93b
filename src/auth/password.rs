use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(String);

/// Hashes into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// At least 8 characters with upper, lower, digit and a symbol.
pub fn is_strong(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Admin@12345").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Admin@12345", &hash));
        assert!(!verify_password("admin@12345", &hash));
        assert!(!verify_password("Admin@12345", "not-a-phc-string"));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("Same#Pass1").unwrap(), hash_password("Same#Pass1").unwrap());
    }

    #[test]
    fn test_strength_rules() {
        assert!(is_strong("Admin@12345"));
        assert!(!is_strong("Ab1!"));
        assert!(!is_strong("alllower1!"));
        assert!(!is_strong("ALLUPPER1!"));
        assert!(!is_strong("NoDigits!!"));
        assert!(!is_strong("NoSymbol12"));
    }
}
