//! Salted one-way password hashing (bcrypt).

use crate::error::AppError;

/// Hash a password with a fresh random salt.
pub fn hash(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("bcrypt hash: {e}")))
}

/// Check a password against a stored bcrypt hash.
pub fn verify(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash).map_err(|e| AppError::Internal(format!("bcrypt verify: {e}")))
}
