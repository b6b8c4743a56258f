//! # cardbridge-access
//!
//! **Authorization and lifecycle** for the bridge.
//!
//! 1. **RoleRegistry**: who holds which privilege tier
//! 2. **PauseGate**: the Active/Paused switch consulted by intake
//! 3. **ReentrancyGuard**: rejects calls back into guarded entry points
//!    from inside an external transfer
//!
//! Privilege checks are a pure predicate ([`RoleRegistry::require`])
//! consulted at the top of each privileged operation.

pub mod pause_gate;
pub mod reentrancy;
pub mod role_registry;

pub use pause_gate::PauseGate;
pub use reentrancy::{EntryGuard, ReentrancyGuard};
pub use role_registry::RoleRegistry;
