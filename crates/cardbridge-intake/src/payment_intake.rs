//! Payment intake — validates and records incoming payments.
//!
//! `purchase` accepts native value attached to the call; `purchase_with_token`
//! pulls tokens from the payer through the token rail, within an allowance
//! the payer granted beforehand. Both share [`PaymentIntake::accept`].
//!
//! Check order is fixed: a paused bridge rejects with `SystemPaused` before
//! the amount is ever looked at.

use std::sync::Arc;

use cardbridge_access::{PauseGate, ReentrancyGuard, RoleRegistry};
use cardbridge_ledger::{Custody, EventSink, PendingPayment, ReplayLedger};
use cardbridge_types::{
    AcceptanceEvent, BridgeError, BridgeEvent, Clock, Denomination, Minimums, Principal, Result,
    Role, TokenTransfer,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Accepts payments in either denomination.
pub struct PaymentIntake {
    ledger: Arc<ReplayLedger>,
    gate: Arc<PauseGate>,
    roles: Arc<RoleRegistry>,
    custody: Arc<Custody>,
    token: Arc<dyn TokenTransfer>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    guard: Arc<ReentrancyGuard>,
    minimums: RwLock<Minimums>,
}

impl PaymentIntake {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        ledger: Arc<ReplayLedger>,
        gate: Arc<PauseGate>,
        roles: Arc<RoleRegistry>,
        custody: Arc<Custody>,
        token: Arc<dyn TokenTransfer>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        guard: Arc<ReentrancyGuard>,
        minimums: Minimums,
    ) -> Self {
        Self {
            ledger,
            gate,
            roles,
            custody,
            token,
            events,
            clock,
            guard,
            minimums: RwLock::new(minimums),
        }
    }

    /// Accept a native payment; `amount` is the value attached to the call.
    pub fn purchase(&self, payer: Principal, amount: Decimal) -> Result<AcceptanceEvent> {
        self.accept(payer, amount, Denomination::Native)
    }

    /// Accept a token payment, pulling `amount` from `payer`.
    pub fn purchase_with_token(&self, payer: Principal, amount: Decimal) -> Result<AcceptanceEvent> {
        self.accept(payer, amount, Denomination::Token)
    }

    /// The shared acceptance algorithm.
    ///
    /// # Errors
    /// - `Reentrancy` if called from inside a rail transfer
    /// - `SystemPaused` if intake is paused
    /// - `BelowMinimum` if `amount` is under the configured floor
    /// - `DuplicateTransaction` / `NonceExhausted` from the ledger
    /// - `AmountOverflow` if custody cannot hold `amount` (nothing is recorded)
    /// - `TransferFailed` if the token pull fails (nothing is recorded)
    pub fn accept(
        &self,
        payer: Principal,
        amount: Decimal,
        denomination: Denomination,
    ) -> Result<AcceptanceEvent> {
        let _entry = self.guard.enter()?;
        self.gate.ensure_active()?;

        let minimum = self.minimum_for(denomination);
        if amount < minimum {
            tracing::warn!(
                payer = %payer,
                amount = %amount,
                minimum = %minimum,
                denomination = %denomination,
                "Payment below minimum rejected"
            );
            return Err(BridgeError::BelowMinimum {
                denomination,
                amount,
                minimum,
            });
        }

        let timestamp = self.clock.now();
        self.ledger.record(
            payer,
            amount,
            timestamp,
            |pending| self.settle(pending, denomination),
            |pending| self.announce(pending, denomination),
        )
    }

    /// Replace both minimums.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` holds Admin
    /// - `InvalidMinimum` if either value is not strictly positive; nothing changes
    pub fn set_minimums(&self, caller: &Principal, native: Decimal, token: Decimal) -> Result<()> {
        self.roles.require(caller, Role::Admin)?;
        for (denomination, value) in [(Denomination::Native, native), (Denomination::Token, token)] {
            if value <= Decimal::ZERO {
                return Err(BridgeError::InvalidMinimum {
                    denomination,
                    value,
                });
            }
        }

        let updated = Minimums::new(native, token);
        let previous = std::mem::replace(&mut *self.minimums.write(), updated);
        let timestamp = self.clock.now();

        for denomination in [Denomination::Native, Denomination::Token] {
            let before = previous.for_denomination(denomination);
            let after = updated.for_denomination(denomination);
            if before == after {
                continue;
            }
            self.events.emit(BridgeEvent::MinimumAmountUpdated {
                denomination,
                previous: before,
                current: after,
                updated_by: *caller,
                timestamp,
            });
            tracing::info!(
                denomination = %denomination,
                previous = %before,
                current = %after,
                by = %caller,
                "Minimum updated"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn minimums(&self) -> Minimums {
        *self.minimums.read()
    }

    #[must_use]
    pub fn minimum_for(&self, denomination: Denomination) -> Decimal {
        self.minimums.read().for_denomination(denomination)
    }

    // ------------------------------------------------------------------
    // Transaction steps (run under the payer's ledger lock)
    // ------------------------------------------------------------------

    /// Credit custody, then pull tokens. Crediting first means a full
    /// custody is refused before any funds leave the payer.
    fn settle(&self, pending: &PendingPayment, denomination: Denomination) -> Result<()> {
        self.custody
            .credit(denomination, pending.amount)
            .inspect_err(|err| {
                tracing::warn!(
                    payer = %pending.payer,
                    amount = %pending.amount,
                    error = %err,
                    "Custody credit refused"
                );
            })?;
        if denomination == Denomination::Native {
            return Ok(());
        }
        if let Err(err) = self.token.transfer_from(&pending.payer, pending.amount) {
            self.custody.revert_credit(denomination, pending.amount);
            tracing::warn!(
                payer = %pending.payer,
                amount = %pending.amount,
                error = %err,
                "Token pull failed"
            );
            return Err(BridgeError::TransferFailed {
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    fn announce(&self, pending: &PendingPayment, denomination: Denomination) -> AcceptanceEvent {
        let event = AcceptanceEvent {
            payer: pending.payer,
            amount: pending.amount,
            fingerprint: pending.fingerprint,
            timestamp: pending.timestamp,
            nonce: pending.nonce,
            denomination,
        };
        self.events.emit(BridgeEvent::PaymentAccepted(event.clone()));
        tracing::info!(
            payer = %event.payer,
            amount = %event.amount,
            denomination = %denomination,
            nonce = event.nonce,
            fingerprint = %event.fingerprint,
            "Payment accepted"
        );
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbridge_ledger::{EventLog, SimulatedToken};
    use cardbridge_types::{EnvironmentId, FixedClock, OperationalState};
    use chrono::{TimeZone, Utc};

    struct Fixture {
        intake: PaymentIntake,
        ledger: Arc<ReplayLedger>,
        gate: Arc<PauseGate>,
        roles: Arc<RoleRegistry>,
        custody: Arc<Custody>,
        token: Arc<SimulatedToken>,
        log: Arc<EventLog>,
        admin: Principal,
    }

    fn setup() -> Fixture {
        let admin = Principal::random();
        let log = Arc::new(EventLog::new(64));
        let roles = Arc::new(RoleRegistry::bootstrap(admin, log.clone()).unwrap());
        let gate = Arc::new(PauseGate::new(Arc::clone(&roles), log.clone()));
        let ledger = Arc::new(ReplayLedger::new(EnvironmentId::default()));
        let custody = Arc::new(Custody::new());
        let token = Arc::new(SimulatedToken::new());
        let clock = Arc::new(FixedClock::new(
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        ));
        let intake = PaymentIntake::new(
            Arc::clone(&ledger),
            Arc::clone(&gate),
            Arc::clone(&roles),
            Arc::clone(&custody),
            token.clone(),
            log.clone(),
            clock,
            Arc::new(ReentrancyGuard::new()),
            Minimums::new(Decimal::new(1, 3), Decimal::TEN),
        );
        Fixture {
            intake,
            ledger,
            gate,
            roles,
            custody,
            token,
            log,
            admin,
        }
    }

    fn funded(token: &SimulatedToken, amount: Decimal) -> Principal {
        let payer = Principal::random();
        token.mint(payer, amount);
        token.approve(payer, amount);
        payer
    }

    #[test]
    fn native_at_minimum_accepted() {
        let f = setup();
        let payer = Principal::random();
        let event = f.intake.purchase(payer, Decimal::new(1, 3)).unwrap();

        assert_eq!(event.nonce, 0);
        assert_eq!(event.denomination, Denomination::Native);
        assert_eq!(f.ledger.next_nonce(&payer), 1);
        assert!(f.ledger.is_processed(&event.fingerprint));
        assert_eq!(f.custody.balance(Denomination::Native), Decimal::new(1, 3));
        assert_eq!(f.log.acceptances(), vec![event]);
    }

    #[test]
    fn below_minimum_changes_nothing() {
        let f = setup();
        let payer = Principal::random();
        let err = f.intake.purchase(payer, Decimal::new(9, 4)).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::BelowMinimum {
                denomination: Denomination::Native,
                ..
            }
        ));
        assert_eq!(f.ledger.next_nonce(&payer), 0);
        assert!(f.log.is_empty());
    }

    #[test]
    fn paused_rejects_before_minimum() {
        let f = setup();
        let guardian = Principal::random();
        f.roles
            .grant_role(&f.admin, Role::Guardian, guardian)
            .unwrap();
        f.gate.pause(&guardian).unwrap();
        assert_eq!(f.gate.state(), OperationalState::Paused);

        let payer = Principal::random();
        for amount in [Decimal::ZERO, Decimal::ONE, Decimal::new(1000, 0)] {
            assert!(matches!(
                f.intake.purchase(payer, amount).unwrap_err(),
                BridgeError::SystemPaused
            ));
            assert!(matches!(
                f.intake.purchase_with_token(payer, amount).unwrap_err(),
                BridgeError::SystemPaused
            ));
        }
        assert_eq!(f.ledger.next_nonce(&payer), 0);
    }

    #[test]
    fn token_pull_moves_funds() {
        let f = setup();
        let payer = funded(&f.token, Decimal::new(50, 0));
        let event = f
            .intake
            .purchase_with_token(payer, Decimal::new(20, 0))
            .unwrap();
        assert_eq!(event.denomination, Denomination::Token);
        assert_eq!(f.token.balance_of(&payer), Decimal::new(30, 0));
        assert_eq!(f.token.custody_balance(), Decimal::new(20, 0));
        assert_eq!(f.custody.balance(Denomination::Token), Decimal::new(20, 0));
    }

    #[test]
    fn failed_pull_rolls_back() {
        let f = setup();
        let payer = Principal::random();
        f.token.mint(payer, Decimal::new(50, 0));

        let err = f
            .intake
            .purchase_with_token(payer, Decimal::new(20, 0))
            .unwrap_err();
        assert!(matches!(err, BridgeError::TransferFailed { .. }));
        assert_eq!(f.ledger.next_nonce(&payer), 0);
        assert_eq!(f.ledger.processed_count(), 0);
        assert_eq!(f.custody.balance(Denomination::Token), Decimal::ZERO);
        assert!(f.log.is_empty());

        f.token.approve(payer, Decimal::new(20, 0));
        let event = f
            .intake
            .purchase_with_token(payer, Decimal::new(20, 0))
            .unwrap();
        assert_eq!(event.nonce, 0);
    }

    #[test]
    fn full_custody_refuses_before_pulling() {
        let f = setup();
        let whale = funded(&f.token, Decimal::MAX);
        f.intake.purchase_with_token(whale, Decimal::MAX).unwrap();

        let payer = funded(&f.token, Decimal::new(50, 0));
        let err = f
            .intake
            .purchase_with_token(payer, Decimal::new(20, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::AmountOverflow {
                denomination: Denomination::Token,
                ..
            }
        ));
        assert_eq!(f.token.balance_of(&payer), Decimal::new(50, 0));
        assert_eq!(f.ledger.next_nonce(&payer), 0);
        assert_eq!(f.custody.balance(Denomination::Token), Decimal::MAX);
        assert!(f.custody.verify_conservation().is_ok());
    }

    #[test]
    fn failed_pull_reverts_custody_credit() {
        let f = setup();
        let payer = funded(&f.token, Decimal::new(50, 0));
        f.token.fail_next("rpc down");
        assert!(f.intake.purchase_with_token(payer, Decimal::new(20, 0)).is_err());
        assert_eq!(f.custody.balances(), cardbridge_types::Balances::default());
        assert_eq!(f.custody.total_received(), cardbridge_types::Balances::default());
    }

    #[test]
    fn set_minimums_requires_admin() {
        let f = setup();
        let outsider = Principal::random();
        let err = f
            .intake
            .set_minimums(&outsider, Decimal::ONE, Decimal::ONE)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Unauthorized {
                required: Role::Admin,
                ..
            }
        ));
    }

    #[test]
    fn set_minimums_rejects_non_positive() {
        let f = setup();
        let before = f.intake.minimums();
        let err = f
            .intake
            .set_minimums(&f.admin, Decimal::ONE, Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidMinimum {
                denomination: Denomination::Token,
                ..
            }
        ));
        assert_eq!(f.intake.minimums(), before);
        assert!(f.log.is_empty());
    }

    #[test]
    fn set_minimums_emits_per_changed_denomination() {
        let f = setup();
        f.intake
            .set_minimums(&f.admin, Decimal::ONE, Decimal::TEN)
            .unwrap();
        let records = f.log.records();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].event,
            BridgeEvent::MinimumAmountUpdated {
                denomination: Denomination::Native,
                ..
            }
        ));
        assert_eq!(f.intake.minimum_for(Denomination::Native), Decimal::ONE);
    }
}
