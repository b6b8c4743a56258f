//! Pause gate — the Active/Paused switch in front of payment intake.
//!
//! Pausing is restricted to Guardian so an incident responder can stop
//! intake quickly; resuming requires Admin. Only intake consults the gate:
//! treasury withdrawals, settlement acknowledgment and role administration
//! keep working while paused.

use std::sync::Arc;

use cardbridge_ledger::EventSink;
use cardbridge_types::{BridgeError, BridgeEvent, OperationalState, Principal, Result, Role};
use parking_lot::RwLock;

use crate::role_registry::RoleRegistry;

/// Two-state switch consulted by every intake entry point.
pub struct PauseGate {
    state: RwLock<OperationalState>,
    roles: Arc<RoleRegistry>,
    events: Arc<dyn EventSink>,
}

impl PauseGate {
    /// Create a gate in the Active state.
    #[must_use]
    pub fn new(roles: Arc<RoleRegistry>, events: Arc<dyn EventSink>) -> Self {
        Self {
            state: RwLock::new(OperationalState::Active),
            roles,
            events,
        }
    }

    #[must_use]
    pub fn state(&self) -> OperationalState {
        *self.state.read()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state() == OperationalState::Paused
    }

    /// Guard an intake attempt.
    ///
    /// # Errors
    /// Returns [`BridgeError::SystemPaused`] if paused.
    pub fn ensure_active(&self) -> Result<()> {
        match self.state() {
            OperationalState::Active => Ok(()),
            OperationalState::Paused => Err(BridgeError::SystemPaused),
        }
    }

    /// Active → Paused.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` holds Guardian
    /// - `SystemPaused` if already paused
    pub fn pause(&self, caller: &Principal) -> Result<()> {
        self.roles.require(caller, Role::Guardian)?;
        let mut state = self.state.write();
        if *state == OperationalState::Paused {
            return Err(BridgeError::SystemPaused);
        }
        *state = OperationalState::Paused;
        self.events.emit(BridgeEvent::Paused { by: *caller });
        tracing::warn!(by = %caller, "Intake paused");
        Ok(())
    }

    /// Paused → Active.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` holds Admin
    /// - `NotPaused` if already active
    pub fn unpause(&self, caller: &Principal) -> Result<()> {
        self.roles.require(caller, Role::Admin)?;
        let mut state = self.state.write();
        if *state == OperationalState::Active {
            return Err(BridgeError::NotPaused);
        }
        *state = OperationalState::Active;
        self.events.emit(BridgeEvent::Unpaused { by: *caller });
        tracing::info!(by = %caller, "Intake resumed");
        Ok(())
    }
}
