//! Password hashing and policy

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Registration password policy: at least 8 characters, with at least one
/// letter and one digit.
pub fn is_valid_password(password: &str) -> bool {
    if password.chars().count() < 8 {
        return false;
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    has_letter && has_digit
}

/// Hash a password using argon2 (PHC string format)
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(
    password: &str,
    stored_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_requires_length_letter_and_digit() {
        assert!(is_valid_password("passw0rd"));
        assert!(is_valid_password("Str0ngEnough"));
        assert!(!is_valid_password("short1"));
        assert!(!is_valid_password("onlyletters"));
        assert!(!is_valid_password("12345678"));
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("passw0rd").expect("hashing failed");
        assert!(verify_password("passw0rd", &hash).unwrap());
        assert!(!verify_password("wrongpass1", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("passw0rd").unwrap();
        let b = hash_password("passw0rd").unwrap();
        assert_ne!(a, b);
    }
}
