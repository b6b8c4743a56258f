//! # cardbridge-settlement
//!
//! The back half of a payment's life:
//!
//! 1. **SettlementAcknowledger**: an Operator reports that the card tied to
//!    an accepted payment was issued; each fingerprint settles once
//! 2. **Treasury**: balance queries and Admin withdrawals out of custody
//!
//! Neither consults the pause gate. Funds can be recovered and fulfilment
//! closed out while intake is stopped for an incident.
//!
//! ## Withdrawal
//!
//! ```text
//! reentrancy guard → Admin check → custody debit → rail transfer
//!     → emit FundsWithdrawn   (rail Ok)
//!     → custody restore       (rail Err)
//! ```

pub mod acknowledger;
pub mod treasury;

pub use acknowledger::SettlementAcknowledger;
pub use treasury::Treasury;
