//! # cardbridge-intake
//!
//! **Payment intake** for both denominations. One acceptance algorithm,
//! parameterized by denomination:
//!
//! ```text
//! reentrancy guard → pause gate → minimum check
//!     → ReplayLedger::record {
//!           settle:    custody credit → token pull (Token only)
//!           committed: emit PaymentAccepted
//!       }
//! ```
//!
//! Native value arrives attached to the call, so only the token rail is
//! invoked on the way in. Either the whole acceptance commits or nothing
//! changes.

pub mod payment_intake;

pub use payment_intake::PaymentIntake;
