//! Settlement acknowledger — closes the loop on an accepted payment.
//!
//! Each fingerprint can be confirmed once. A second confirmation returns
//! [`BridgeError::AlreadyConfirmed`] so the fulfillment collaborator never
//! sees two settlement records for one card.

use std::collections::HashSet;
use std::sync::Arc;

use cardbridge_access::RoleRegistry;
use cardbridge_ledger::{EventSink, ReplayLedger};
use cardbridge_types::{
    BridgeError, BridgeEvent, Clock, PaymentFingerprint, Principal, Result, Role,
    SettlementRecord,
};
use parking_lot::Mutex;

/// Records fulfillment outcomes against accepted payments.
pub struct SettlementAcknowledger {
    ledger: Arc<ReplayLedger>,
    roles: Arc<RoleRegistry>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    confirmed: Mutex<HashSet<PaymentFingerprint>>,
}

impl SettlementAcknowledger {
    #[must_use]
    pub fn new(
        ledger: Arc<ReplayLedger>,
        roles: Arc<RoleRegistry>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            roles,
            events,
            clock,
            confirmed: Mutex::new(HashSet::new()),
        }
    }

    /// Confirm that the deliverable for `fingerprint` was produced.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` holds Operator
    /// - `InvalidReference` if `external_reference_id` is blank
    /// - `UnknownTransaction` if the fingerprint was never accepted, or was
    ///   accepted for a different payer
    /// - `AlreadyConfirmed` if the fingerprint was confirmed before
    pub fn confirm(
        &self,
        caller: &Principal,
        payer: Principal,
        fingerprint: PaymentFingerprint,
        external_reference_id: impl Into<String>,
    ) -> Result<SettlementRecord> {
        self.roles.require(caller, Role::Operator)?;
        let external_reference_id = external_reference_id.into();
        if external_reference_id.trim().is_empty() {
            return Err(BridgeError::InvalidReference);
        }

        if self.ledger.accepted_payer(&fingerprint) != Some(payer) {
            tracing::warn!(
                payer = %payer,
                fingerprint = %fingerprint,
                by = %caller,
                "Confirmation for unknown payment rejected"
            );
            return Err(BridgeError::UnknownTransaction(fingerprint));
        }

        let mut confirmed = self.confirmed.lock();
        if !confirmed.insert(fingerprint) {
            tracing::warn!(fingerprint = %fingerprint, by = %caller, "Duplicate confirmation rejected");
            return Err(BridgeError::AlreadyConfirmed(fingerprint));
        }

        let record = SettlementRecord {
            payer,
            fingerprint,
            external_reference_id,
            timestamp: self.clock.now(),
            confirmed_by: *caller,
        };
        self.events.emit(BridgeEvent::PaymentSettled(record.clone()));
        drop(confirmed);

        tracing::info!(
            payer = %payer,
            fingerprint = %fingerprint,
            reference = %record.external_reference_id,
            by = %caller,
            "Payment settled"
        );
        Ok(record)
    }

    #[must_use]
    pub fn is_confirmed(&self, fingerprint: &PaymentFingerprint) -> bool {
        self.confirmed.lock().contains(fingerprint)
    }

    /// Number of confirmed fingerprints.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbridge_ledger::{EventLog, PendingPayment};
    use cardbridge_types::{EnvironmentId, SystemClock};
    use rust_decimal::Decimal;

    struct Fixture {
        ack: SettlementAcknowledger,
        ledger: Arc<ReplayLedger>,
        log: Arc<EventLog>,
        operator: Principal,
    }

    fn setup() -> Fixture {
        let operator = Principal::random();
        let log = Arc::new(EventLog::new(16));
        let roles = Arc::new(RoleRegistry::bootstrap(operator, log.clone()).unwrap());
        let ledger = Arc::new(ReplayLedger::new(EnvironmentId::default()));
        let ack = SettlementAcknowledger::new(
            Arc::clone(&ledger),
            roles,
            log.clone(),
            Arc::new(SystemClock),
        );
        Fixture {
            ack,
            ledger,
            log,
            operator,
        }
    }

    fn accept(ledger: &ReplayLedger, payer: Principal) -> PaymentFingerprint {
        ledger
            .record(payer, Decimal::ONE, chrono::Utc::now(), |_| Ok(()), |p| p.fingerprint)
            .unwrap()
    }

    #[test]
    fn confirms_accepted_payment() {
        let f = setup();
        let payer = Principal::random();
        let fp = accept(&f.ledger, payer);

        let record = f.ack.confirm(&f.operator, payer, fp, "card-001").unwrap();
        assert_eq!(record.fingerprint, fp);
        assert_eq!(record.confirmed_by, f.operator);
        assert!(f.ack.is_confirmed(&fp));
        assert_eq!(f.log.settlements(), vec![record]);
    }

    #[test]
    fn unknown_fingerprint_rejected() {
        let f = setup();
        let fp = PaymentFingerprint([7; 32]);
        let err = f
            .ack
            .confirm(&f.operator, Principal::random(), fp, "card-001")
            .unwrap_err();
        assert_eq!(err, BridgeError::UnknownTransaction(fp));
        assert!(f.log.is_empty());
    }

    #[test]
    fn wrong_payer_rejected() {
        let f = setup();
        let fp = accept(&f.ledger, Principal::random());
        let err = f
            .ack
            .confirm(&f.operator, Principal::random(), fp, "card-001")
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownTransaction(_)));
        assert!(!f.ack.is_confirmed(&fp));
    }

    #[test]
    fn double_confirm_blocked() {
        let f = setup();
        let payer = Principal::random();
        let fp = accept(&f.ledger, payer);
        f.ack.confirm(&f.operator, payer, fp, "card-001").unwrap();

        let err = f.ack.confirm(&f.operator, payer, fp, "card-002").unwrap_err();
        assert!(
            matches!(err, BridgeError::AlreadyConfirmed(id) if id == fp),
            "Expected AlreadyConfirmed, got: {err:?}"
        );
        assert_eq!(f.log.settlements().len(), 1);
        assert_eq!(f.ack.confirmed_count(), 1);
    }

    #[test]
    fn blank_reference_rejected() {
        let f = setup();
        let payer = Principal::random();
        let fp = accept(&f.ledger, payer);
        let err = f.ack.confirm(&f.operator, payer, fp, "  ").unwrap_err();
        assert_eq!(err, BridgeError::InvalidReference);
        assert!(!f.ack.is_confirmed(&fp));
    }

    #[test]
    fn requires_operator() {
        let f = setup();
        let payer = Principal::random();
        let fp = accept(&f.ledger, payer);
        let err = f
            .ack
            .confirm(&Principal::random(), payer, fp, "card-001")
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Unauthorized {
                required: Role::Operator,
                ..
            }
        ));
    }

    #[test]
    fn pending_payment_is_unknown() {
        let f = setup();
        let payer = Principal::random();
        let result: Result<PendingPayment> = f.ledger.record(
            payer,
            Decimal::ONE,
            chrono::Utc::now(),
            |pending| {
                let err = f
                    .ack
                    .confirm(&f.operator, payer, pending.fingerprint, "card-001")
                    .unwrap_err();
                assert!(matches!(err, BridgeError::UnknownTransaction(_)));
                Ok(())
            },
            PendingPayment::clone,
        );
        let pending = result.unwrap();
        assert!(f.ack.confirm(&f.operator, payer, pending.fingerprint, "card-001").is_ok());
    }
}
