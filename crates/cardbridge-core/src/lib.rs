//! # cardbridge-core
//!
//! The **CardBridge** facade. Deploying a bridge wires every component
//! around shared, explicitly owned stores:
//!
//! ```text
//! caller ─▶ CardBridge
//!   ├─ purchase / purchase_with_token ─▶ PaymentIntake ─▶ PauseGate, ReplayLedger, Custody, token rail
//!   ├─ confirm                        ─▶ SettlementAcknowledger ─▶ ReplayLedger
//!   ├─ withdraw / balances            ─▶ Treasury ─▶ Custody, token or native rail
//!   ├─ pause / unpause                ─▶ PauseGate
//!   └─ grant / revoke / renounce      ─▶ RoleRegistry
//!
//! every component ─▶ EventLog ─▶ fulfillment collaborator (poll or subscribe)
//! ```
//!
//! Intake and treasury share one reentrancy guard.

pub mod bridge;

pub use bridge::CardBridge;
