//! Custody of accepted funds.
//!
//! Tracks the bridge's balance per denomination alongside the totals it
//! has received and paid out, so the conservation identity can be checked
//! at any time:
//! ```text
//! ∀ denomination: balance == Σ(received) - Σ(withdrawn)
//! ```

use cardbridge_types::{Balances, BridgeError, Denomination, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;

#[derive(Debug, Default)]
struct CustodyState {
    balances: Balances,
    received: Balances,
    withdrawn: Balances,
}

/// Funds held by the bridge. All mutations are atomic: either the full
/// operation succeeds or the state is unchanged.
#[derive(Debug, Default)]
pub struct Custody {
    state: Mutex<CustodyState>,
}

impl Custody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record funds arriving with an accepted payment.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the balance or the received total would
    /// leave the `Decimal` range; nothing changes.
    pub fn credit(&self, denomination: Denomination, amount: Decimal) -> Result<()> {
        let mut state = self.state.lock();
        let overflow = || BridgeError::AmountOverflow {
            denomination,
            amount,
        };
        let balance = state
            .balances
            .get(denomination)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let received = state
            .received
            .get(denomination)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        *state.balances.get_mut(denomination) = balance;
        *state.received.get_mut(denomination) = received;
        Ok(())
    }

    /// Undo a [`Custody::credit`] whose payment did not go through.
    pub fn revert_credit(&self, denomination: Denomination, amount: Decimal) {
        let mut state = self.state.lock();
        *state.balances.get_mut(denomination) -= amount;
        *state.received.get_mut(denomination) -= amount;
    }

    /// Take funds out for a withdrawal.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the balance is below `amount`.
    pub fn debit(&self, denomination: Denomination, amount: Decimal) -> Result<()> {
        let mut state = self.state.lock();
        let available = state.balances.get(denomination);
        if available < amount {
            return Err(BridgeError::InsufficientFunds {
                denomination,
                requested: amount,
                available,
            });
        }
        let withdrawn = state
            .withdrawn
            .get(denomination)
            .checked_add(amount)
            .ok_or(BridgeError::AmountOverflow {
                denomination,
                amount,
            })?;
        *state.balances.get_mut(denomination) -= amount;
        *state.withdrawn.get_mut(denomination) = withdrawn;
        Ok(())
    }

    /// Undo a [`Custody::debit`] whose outbound transfer failed.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the balance would leave the `Decimal`
    /// range; nothing changes.
    pub fn restore(&self, denomination: Denomination, amount: Decimal) -> Result<()> {
        let mut state = self.state.lock();
        let balance = state
            .balances
            .get(denomination)
            .checked_add(amount)
            .ok_or(BridgeError::AmountOverflow {
                denomination,
                amount,
            })?;
        *state.balances.get_mut(denomination) = balance;
        *state.withdrawn.get_mut(denomination) -= amount;
        Ok(())
    }

    #[must_use]
    pub fn balances(&self) -> Balances {
        self.state.lock().balances
    }

    #[must_use]
    pub fn balance(&self, denomination: Denomination) -> Decimal {
        self.state.lock().balances.get(denomination)
    }

    #[must_use]
    pub fn total_received(&self) -> Balances {
        self.state.lock().received
    }

    #[must_use]
    pub fn total_withdrawn(&self) -> Balances {
        self.state.lock().withdrawn
    }

    /// Verify the conservation identity for both denominations.
    ///
    /// # Errors
    /// Returns [`BridgeError::ConservationViolation`] if balance ≠ received - withdrawn.
    pub fn verify_conservation(&self) -> Result<()> {
        let state = self.state.lock();
        for denomination in [Denomination::Native, Denomination::Token] {
            let actual = state.balances.get(denomination);
            let received = state.received.get(denomination);
            let withdrawn = state.withdrawn.get(denomination);
            let expected = received - withdrawn;
            if actual != expected || actual < Decimal::ZERO {
                return Err(BridgeError::ConservationViolation {
                    reason: format!(
                        "{denomination}: balance {actual} != expected {expected} \
                         (received={received}, withdrawn={withdrawn})"
                    ),
                });
            }
        }
        Ok(())
    }

    #[cfg(any(test, feature = "test-helpers"))]
    pub fn corrupt_balance(&self, denomination: Denomination, delta: Decimal) {
        *self.state.lock().balances.get_mut(denomination) += delta;
    }
}
