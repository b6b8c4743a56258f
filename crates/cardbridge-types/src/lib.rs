//! # cardbridge-types
//!
//! Shared types, errors, and configuration for the **CardBridge** payment
//! intake core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Principal`], [`PaymentFingerprint`], [`EnvironmentId`], [`EventId`]
//! - **Authorization**: [`Role`]
//! - **Payment model**: [`Denomination`], [`Minimums`], [`Balances`], [`OperationalState`]
//! - **Emitted records**: [`AcceptanceEvent`], [`SettlementRecord`], [`BridgeEvent`], [`EventEnvelope`]
//! - **Collaborator seams**: [`TokenTransfer`], [`NativeTransfer`], [`Clock`]
//! - **Configuration**: [`BridgeConfig`]
//! - **Errors**: [`BridgeError`] with `CB_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod denomination;
pub mod error;
pub mod event;
pub mod ids;
pub mod rail;
pub mod role;

// Re-export all primary types at crate root for ergonomic imports:
//   use cardbridge_types::{Principal, Role, Denomination, BridgeError, ...};

pub use clock::*;
pub use config::*;
pub use denomination::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use rail::*;
pub use role::*;

// Constants are accessed via `cardbridge_types::constants::FOO`
// (not re-exported to avoid name collisions).
