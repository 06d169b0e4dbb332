//! The module contains the errors the engine can throw.
//!
//! Every business rule violation is reported through [`EngineError`], so the
//! HTTP layer can map each variant to one response status:
//!
//! - [`KeyNotFound`] thrown when a journey, expense, invite or account is missing.
//! - [`Forbidden`] thrown when the caller is neither the owner nor an administrator.
//! - [`InvalidState`] thrown when a terminal expense is mutated.
//! - [`ExistingKey`] thrown on duplicate active invites or accounts.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`ExistingKey`]: EngineError::ExistingKey
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Expired: {0}")]
    Expired(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error("Receipt storage failure: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Expired(a), Self::Expired(b)) => a == b,
            (Self::InvalidCredential(a), Self::InvalidCredential(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
