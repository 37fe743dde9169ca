//! Authentication and ownership checks.
//!
//! - **signup** stores a bcrypt-hashed credential, refusing a taken email.
//! - **login** checks the email shape and password presence before touching
//!   the store, then verifies the password and issues a bearer token.
//! - **verify** validates a bearer token and yields its claims.
//! - [`authorize_owner`] is the gate in front of every book mutation. It
//!   returns a `Result` so callers stop with `?`.
//!
//! Email uniqueness is a read-then-write check. Two concurrent signups with
//! the same email can both succeed.

mod password;
mod token;
mod user;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::store::{CollectionsExt, RecordStore};

pub use token::{Claims, TokenSigner};
pub use user::User;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Fails with `Forbidden` unless the caller owns the resource.
pub fn authorize_owner(owner_id: &str, caller_id: &str) -> Result<(), AppError> {
    if owner_id == caller_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub user_id: String,
    pub token: String,
}

/// Credential store operations plus token issuing.
#[derive(Debug, Clone)]
pub struct Auth<S> {
    store: S,
    tokens: TokenSigner,
    bcrypt_cost: u32,
}

impl<S: RecordStore> Auth<S> {
    pub fn new(store: S, tokens: TokenSigner, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(
            store,
            TokenSigner::new(config.jwt_secret.as_bytes(), config.token_ttl),
            config.bcrypt_cost,
        )
    }

    pub fn signup(&self, email: &str, password: &str) -> Result<User, AppError> {
        let users = self.store.collection::<User>();

        if users.find_one(&|u| u.email == email)?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let user = User::new(email, password::hash(password, self.bcrypt_cost)?);
        users.insert(&user)?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Login, AppError> {
        if email.is_empty() || !is_valid_email(email) || password.is_empty() {
            return Err(AppError::validation("Invalid email or password"));
        }

        let user = self
            .store
            .collection::<User>()
            .find_one(&|u| u.email == email)?
            .ok_or(AppError::UnknownEmail)?;

        if !password::verify(password, &user.password_hash)? {
            return Err(AppError::WrongPassword);
        }

        let token = self.tokens.issue(&user.id)?;
        Ok(Login {
            user_id: user.id,
            token,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify(token)
    }
}
