//! Password hashing helper for expression contexts.
//!
//! Seed data frequently carries user credentials that have to be stored the
//! way the application would store them. This helper is not part of the
//! resolution engine; callers opt in by registering it as a context function
//! and invoking it from an expression, e.g.
//! `"password": "=>ctx.hash_password(rec.name)"`.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::expression::ast::Value;
use crate::expression::interpreter::ContextFunction;

/// Hashes a password into a PHC-format Argon2id string with a fresh random
/// salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("password hashing failed: {}", e))
}

/// Wraps [`hash_password`] as a context function for registration under a
/// name of the caller's choice, conventionally `hash_password`.
pub fn hash_password_fn() -> ContextFunction {
    Box::new(|args| match args.as_slice() {
        [Value::String(password)] => hash_password(password).map(Value::String),
        _ => Err("hash_password() requires exactly 1 string argument".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::hash_password;

    #[test]
    fn test_hash_password_produces_phc_string() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2"));

        // Fresh salt per call
        let again = hash_password("secret").unwrap();
        assert_ne!(hash, again);
    }
}
