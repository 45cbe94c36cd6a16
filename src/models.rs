use thiserror::Error;

pub mod bank_accounts;
pub mod banks;
pub mod pix_keys;
pub mod transactions;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid pix key kind: {0}")]
    InvalidKind(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("The amount must be greater than 0")]
    NonPositiveAmount,
    #[error("Balance must not be negative")]
    NegativeBalance,
    #[error("The source and destination account cannot be the same")]
    SameAccount,
    #[error("Pix key {0} is not active")]
    InactivePixKey(String),
    #[error("Pix key {0} is already inactive")]
    AlreadyInactive(String),
    #[error("Cannot {action} a transaction with status {status}")]
    InvalidTransition { action: &'static str, status: String },
}
