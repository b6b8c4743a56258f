//! Seams to the two payment rails.
//!
//! The bridge treats each rail as a trusted "debit sender, credit
//! recipient" primitive with a synchronous success/failure outcome. There
//! is no partial or streaming transfer and no timeout: the call returns
//! once the rail has decided.
//!
//! Rail implementations are untrusted with respect to control flow: they
//! may attempt to call back into the bridge. The bridge rejects such calls
//! with `Reentrancy`.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::Principal;

/// Failure reported by a rail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("allowance {allowance} below requested {requested}")]
    InsufficientAllowance {
        allowance: Decimal,
        requested: Decimal,
    },

    #[error("balance {balance} below requested {requested}")]
    InsufficientBalance { balance: Decimal, requested: Decimal },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// The token rail. Pulls are authorized by an allowance the payer granted
/// to the bridge beforehand; the core never checks the allowance itself.
pub trait TokenTransfer: Send + Sync {
    /// Move `amount` from `payer` into the bridge's custody.
    fn transfer_from(&self, payer: &Principal, amount: Decimal) -> Result<(), TransferError>;

    /// Move `amount` out of the bridge's custody to `destination`.
    fn transfer(&self, destination: &Principal, amount: Decimal) -> Result<(), TransferError>;
}

/// The native rail. Inbound native value arrives attached to the call, so
/// only the outbound direction is needed.
pub trait NativeTransfer: Send + Sync {
    /// Send `amount` of native currency out of custody to `destination`.
    fn send(&self, destination: &Principal, amount: Decimal) -> Result<(), TransferError>;
}
