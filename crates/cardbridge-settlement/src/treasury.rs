//! Treasury — balances and privileged withdrawals out of custody.
//!
//! Withdrawal is independent of the pause gate. It shares the reentrancy
//! guard with intake, so a rail cannot call back into either family while
//! a transfer is in progress.

use std::sync::Arc;

use cardbridge_access::{ReentrancyGuard, RoleRegistry};
use cardbridge_ledger::{Custody, EventSink};
use cardbridge_types::{
    Balances, BridgeError, BridgeEvent, Clock, Denomination, NativeTransfer, Principal, Result,
    Role, TokenTransfer,
};
use rust_decimal::Decimal;

/// Custody balances and the withdrawal entry point.
pub struct Treasury {
    roles: Arc<RoleRegistry>,
    custody: Arc<Custody>,
    token: Arc<dyn TokenTransfer>,
    native: Arc<dyn NativeTransfer>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    guard: Arc<ReentrancyGuard>,
}

impl Treasury {
    #[must_use]
    pub fn new(
        roles: Arc<RoleRegistry>,
        custody: Arc<Custody>,
        token: Arc<dyn TokenTransfer>,
        native: Arc<dyn NativeTransfer>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        guard: Arc<ReentrancyGuard>,
    ) -> Self {
        Self {
            roles,
            custody,
            token,
            native,
            events,
            clock,
            guard,
        }
    }

    #[must_use]
    pub fn balances(&self) -> Balances {
        self.custody.balances()
    }

    #[must_use]
    pub fn balance(&self, denomination: Denomination) -> Decimal {
        self.custody.balance(denomination)
    }

    /// Send `amount` of `denomination` from custody to `destination`.
    ///
    /// Custody is debited first; if the rail then fails the debit is
    /// restored, so the call either moves funds and emits `FundsWithdrawn`
    /// or changes nothing.
    ///
    /// # Errors
    /// - `Reentrancy` if called from inside a rail transfer
    /// - `Unauthorized` unless `caller` holds Admin
    /// - `InvalidDestination` if `destination` is the null principal
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `InsufficientFunds` if custody holds less than `amount`
    /// - `TransferFailed` if the rail rejects the transfer
    pub fn withdraw(
        &self,
        caller: &Principal,
        destination: Principal,
        amount: Decimal,
        denomination: Denomination,
    ) -> Result<()> {
        let _entry = self.guard.enter()?;
        self.roles.require(caller, Role::Admin)?;
        if destination.is_zero() {
            return Err(BridgeError::InvalidDestination);
        }
        if amount <= Decimal::ZERO {
            return Err(BridgeError::InvalidAmount(amount));
        }

        self.custody.debit(denomination, amount)?;

        let sent = match denomination {
            Denomination::Native => self.native.send(&destination, amount),
            Denomination::Token => self.token.transfer(&destination, amount),
        };
        if let Err(err) = sent {
            self.custody.restore(denomination, amount)?;
            tracing::warn!(
                destination = %destination,
                amount = %amount,
                denomination = %denomination,
                error = %err,
                "Withdrawal transfer failed, custody restored"
            );
            return Err(BridgeError::TransferFailed {
                reason: err.to_string(),
            });
        }

        self.events.emit(BridgeEvent::FundsWithdrawn {
            destination,
            amount,
            denomination,
            withdrawn_by: *caller,
            timestamp: self.clock.now(),
        });
        tracing::info!(
            destination = %destination,
            amount = %amount,
            denomination = %denomination,
            by = %caller,
            "Funds withdrawn"
        );
        Ok(())
    }

    /// Check `balance == received - withdrawn` for both denominations.
    pub fn verify_conservation(&self) -> Result<()> {
        self.custody.verify_conservation()
    }
}
