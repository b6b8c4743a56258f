//! Replay ledger — per-payer nonces and the processed-fingerprint set.
//!
//! Each payer owns one nonce cell. Accepting a payment holds that cell's
//! lock for the whole transaction, so payments from one payer are strictly
//! ordered while payments from different payers run in parallel.
//!
//! A fingerprint moves `absent → PENDING → ACCEPTED`, or back to absent if
//! the transaction fails. Only ACCEPTED counts as processed, and ACCEPTED is
//! never removed or overwritten.

use std::sync::Arc;

use cardbridge_types::{BridgeError, EnvironmentId, PaymentFingerprint, Principal, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Reserved by an in-flight transaction.
    Pending(Principal),
    /// Accepted. Terminal.
    Accepted(Principal),
}

/// A payment that has been fingerprinted but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayment {
    pub payer: Principal,
    pub amount: Decimal,
    /// The payer's nonce before this payment.
    pub nonce: u64,
    pub fingerprint: PaymentFingerprint,
    pub timestamp: DateTime<Utc>,
}

/// Nonces and processed fingerprints for one environment.
pub struct ReplayLedger {
    environment: EnvironmentId,
    /// Payer → nonce cell. The cell's mutex serializes that payer.
    nonces: DashMap<Principal, Arc<Mutex<u64>>>,
    processed: DashMap<PaymentFingerprint, Mark>,
}

impl ReplayLedger {
    #[must_use]
    pub fn new(environment: EnvironmentId) -> Self {
        Self {
            environment,
            nonces: DashMap::new(),
            processed: DashMap::new(),
        }
    }

    #[must_use]
    pub fn environment(&self) -> EnvironmentId {
        self.environment
    }

    /// The nonce the payer's next payment will be fingerprinted with.
    ///
    /// Blocks while a payment from the same payer is in flight.
    #[must_use]
    pub fn next_nonce(&self, payer: &Principal) -> u64 {
        let cell = self.nonces.get(payer).map(|cell| Arc::clone(cell.value()));
        cell.map_or(0, |cell| *cell.lock())
    }

    /// Pure fingerprint derivation; see [`PaymentFingerprint::compute`].
    #[must_use]
    pub fn compute_fingerprint(
        payer: &Principal,
        amount: Decimal,
        nonce: u64,
        timestamp: DateTime<Utc>,
        environment: EnvironmentId,
    ) -> PaymentFingerprint {
        PaymentFingerprint::compute(payer, amount, nonce, timestamp, environment)
    }

    /// Whether the fingerprint belongs to an accepted payment.
    #[must_use]
    pub fn is_processed(&self, fingerprint: &PaymentFingerprint) -> bool {
        self.accepted_payer(fingerprint).is_some()
    }

    /// The payer of an accepted payment, if the fingerprint is processed.
    #[must_use]
    pub fn accepted_payer(&self, fingerprint: &PaymentFingerprint) -> Option<Principal> {
        match self.processed.get(fingerprint).map(|m| *m.value()) {
            Some(Mark::Accepted(payer)) => Some(payer),
            _ => None,
        }
    }

    /// Mark a fingerprint processed.
    ///
    /// # Errors
    /// Returns [`BridgeError::DuplicateTransaction`] if the fingerprint is
    /// already accepted or reserved.
    pub fn mark_processed(&self, fingerprint: PaymentFingerprint, payer: Principal) -> Result<()> {
        match self.processed.entry(fingerprint) {
            Entry::Occupied(_) => Err(BridgeError::DuplicateTransaction(fingerprint)),
            Entry::Vacant(slot) => {
                slot.insert(Mark::Accepted(payer));
                Ok(())
            }
        }
    }

    /// Run one acceptance transaction for `payer`.
    ///
    /// 1. Lock the payer's nonce cell and read the current nonce
    /// 2. Fingerprint (payer, amount, nonce, timestamp, environment)
    /// 3. Reserve the fingerprint (insert-if-absent)
    /// 4. Run `settle` (e.g. the token pull)
    /// 5. Commit: fingerprint ACCEPTED, nonce + 1
    /// 6. Run `committed` (e.g. emit the acceptance record)
    ///
    /// Both closures run under the payer's lock, so `committed` observes
    /// the payer's payments in nonce order. If `settle` fails or panics, the
    /// reservation is removed, the nonce is untouched and `committed` never
    /// runs.
    ///
    /// # Errors
    /// - `NonceExhausted` if the nonce cannot be incremented
    /// - `DuplicateTransaction` if the fingerprint is already present
    /// - whatever `settle` returns
    pub fn record<S, C, T>(
        &self,
        payer: Principal,
        amount: Decimal,
        timestamp: DateTime<Utc>,
        settle: S,
        committed: C,
    ) -> Result<T>
    where
        S: FnOnce(&PendingPayment) -> Result<()>,
        C: FnOnce(&PendingPayment) -> T,
    {
        let cell = self.nonce_cell(payer);
        let mut nonce = cell.lock();

        let current = *nonce;
        let next = current
            .checked_add(1)
            .ok_or(BridgeError::NonceExhausted(payer))?;

        let fingerprint =
            PaymentFingerprint::compute(&payer, amount, current, timestamp, self.environment);
        let reservation = self.reserve(fingerprint, payer)?;

        let pending = PendingPayment {
            payer,
            amount,
            nonce: current,
            fingerprint,
            timestamp,
        };

        tracing::debug!(
            payer = %payer,
            nonce = current,
            fingerprint = %fingerprint,
            "Fingerprint reserved"
        );

        settle(&pending)?;

        reservation.commit();
        *nonce = next;
        Ok(committed(&pending))
    }

    /// Number of accepted fingerprints.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed
            .iter()
            .filter(|m| matches!(m.value(), Mark::Accepted(_)))
            .count()
    }

    /// Number of payers that have a nonce cell.
    #[must_use]
    pub fn payer_count(&self) -> usize {
        self.nonces.len()
    }

    #[cfg(any(test, feature = "test-helpers"))]
    pub fn force_nonce(&self, payer: Principal, nonce: u64) {
        *self.nonce_cell(payer).lock() = nonce;
    }

    fn nonce_cell(&self, payer: Principal) -> Arc<Mutex<u64>> {
        let entry = self
            .nonces
            .entry(payer)
            .or_insert_with(|| Arc::new(Mutex::new(0)));
        Arc::clone(entry.value())
    }

    fn reserve(&self, fingerprint: PaymentFingerprint, payer: Principal) -> Result<Reservation<'_>> {
        match self.processed.entry(fingerprint) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    payer = %payer,
                    fingerprint = %fingerprint,
                    "Duplicate fingerprint rejected"
                );
                Err(BridgeError::DuplicateTransaction(fingerprint))
            }
            Entry::Vacant(slot) => {
                slot.insert(Mark::Pending(payer));
                Ok(Reservation {
                    processed: &self.processed,
                    fingerprint,
                    payer,
                    committed: false,
                })
            }
        }
    }
}

/// A PENDING mark that is removed on drop unless committed.
struct Reservation<'a> {
    processed: &'a DashMap<PaymentFingerprint, Mark>,
    fingerprint: PaymentFingerprint,
    payer: Principal,
    committed: bool,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.processed
            .insert(self.fingerprint, Mark::Accepted(self.payer));
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.processed
                .remove_if(&self.fingerprint, |_, mark| *mark == Mark::Pending(self.payer));
            tracing::debug!(
                payer = %self.payer,
                fingerprint = %self.fingerprint,
                "Reservation rolled back"
            );
        }
    }
}
