//! Error types for the CardBridge core.
//!
//! All errors use the `CB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Lifecycle errors (pause, reentrancy)
//! - 3xx: Intake errors
//! - 4xx: Settlement errors
//! - 5xx: Treasury and custody errors
//! - 9xx: General errors (configuration, serialization, I/O)
//!
//! Every rejected precondition maps to its own variant. Nothing here is
//! retried inside the core; retries belong to the caller.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Denomination, PaymentFingerprint, Principal, Role};

/// Central error enum for all CardBridge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller does not hold any role allowed to perform the action.
    #[error("CB_ERR_100: Unauthorized: {principal} lacks {required}")]
    Unauthorized { principal: Principal, required: Role },

    /// Removing this membership would leave no SuperAdmin.
    #[error("CB_ERR_101: Cannot remove the last SuperAdmin")]
    LastSuperAdmin,

    /// The null principal cannot hold roles.
    #[error("CB_ERR_102: Invalid principal: {0}")]
    InvalidPrincipal(Principal),

    // =================================================================
    // Lifecycle Errors (2xx)
    // =================================================================
    /// Intake attempted while the bridge is paused.
    #[error("CB_ERR_200: System paused")]
    SystemPaused,

    /// Unpause attempted while the bridge is active.
    #[error("CB_ERR_201: System not paused")]
    NotPaused,

    /// A guarded entry point was re-entered from inside an external call.
    #[error("CB_ERR_202: Reentrant call rejected")]
    Reentrancy,

    // =================================================================
    // Intake Errors (3xx)
    // =================================================================
    /// Amount under the configured floor for its denomination.
    #[error("CB_ERR_300: {denomination} amount {amount} below minimum {minimum}")]
    BelowMinimum {
        denomination: Denomination,
        amount: Decimal,
        minimum: Decimal,
    },

    /// The fingerprint has already been accepted (or is being accepted).
    #[error("CB_ERR_301: Duplicate transaction: {0}")]
    DuplicateTransaction(PaymentFingerprint),

    /// The external transfer primitive reported failure.
    #[error("CB_ERR_302: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// A configured minimum must be strictly positive.
    #[error("CB_ERR_303: Invalid minimum for {denomination}: {value}")]
    InvalidMinimum {
        denomination: Denomination,
        value: Decimal,
    },

    /// The payer's nonce cannot be incremented any further.
    #[error("CB_ERR_304: Nonce exhausted for {0}")]
    NonceExhausted(Principal),

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// No accepted payment matches this (payer, fingerprint).
    #[error("CB_ERR_400: Unknown transaction: {0}")]
    UnknownTransaction(PaymentFingerprint),

    /// Fulfillment for this fingerprint was already confirmed.
    #[error("CB_ERR_401: Already confirmed: {0}")]
    AlreadyConfirmed(PaymentFingerprint),

    /// The external reference id is empty.
    #[error("CB_ERR_402: Invalid external reference")]
    InvalidReference,

    // =================================================================
    // Treasury Errors (5xx)
    // =================================================================
    /// Not enough funds in custody for the withdrawal.
    #[error("CB_ERR_500: Insufficient {denomination} funds: need {requested}, have {available}")]
    InsufficientFunds {
        denomination: Denomination,
        requested: Decimal,
        available: Decimal,
    },

    /// Withdrawal destination is the null principal.
    #[error("CB_ERR_501: Invalid destination")]
    InvalidDestination,

    /// Withdrawal amount must be strictly positive.
    #[error("CB_ERR_502: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Custody balance drifted from received minus withdrawn.
    #[error("CB_ERR_503: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    /// Crediting custody would exceed the representable amount range.
    #[error("CB_ERR_504: {denomination} custody overflow adding {amount}")]
    AmountOverflow {
        denomination: Denomination,
        amount: Decimal,
    },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("CB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("CB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("CB_ERR_903: I/O error: {0}")]
    Io(String),
}

impl BridgeError {
    /// The `CB_ERR_nnn` code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "CB_ERR_100",
            Self::LastSuperAdmin => "CB_ERR_101",
            Self::InvalidPrincipal(_) => "CB_ERR_102",
            Self::SystemPaused => "CB_ERR_200",
            Self::NotPaused => "CB_ERR_201",
            Self::Reentrancy => "CB_ERR_202",
            Self::BelowMinimum { .. } => "CB_ERR_300",
            Self::DuplicateTransaction(_) => "CB_ERR_301",
            Self::TransferFailed { .. } => "CB_ERR_302",
            Self::InvalidMinimum { .. } => "CB_ERR_303",
            Self::NonceExhausted(_) => "CB_ERR_304",
            Self::UnknownTransaction(_) => "CB_ERR_400",
            Self::AlreadyConfirmed(_) => "CB_ERR_401",
            Self::InvalidReference => "CB_ERR_402",
            Self::InsufficientFunds { .. } => "CB_ERR_500",
            Self::InvalidDestination => "CB_ERR_501",
            Self::InvalidAmount(_) => "CB_ERR_502",
            Self::ConservationViolation { .. } => "CB_ERR_503",
            Self::AmountOverflow { .. } => "CB_ERR_504",
            Self::Serialization(_) => "CB_ERR_901",
            Self::Configuration(_) => "CB_ERR_902",
            Self::Io(_) => "CB_ERR_903",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

// Conversion from std::io::Error
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
