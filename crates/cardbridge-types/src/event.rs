//! Records emitted to the external fulfillment collaborator.
//!
//! Records are append-only: each is emitted exactly once and never mutated.
//! Every record carries enough fields (principal, amount, fingerprint,
//! timestamp) for the collaborator to correlate it without querying state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Denomination, EventId, PaymentFingerprint, Principal, Role};

/// Raised when a payment is validated, fingerprinted, and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceEvent {
    pub payer: Principal,
    pub amount: Decimal,
    pub fingerprint: PaymentFingerprint,
    pub timestamp: DateTime<Utc>,
    /// The payer's nonce before this payment incremented it.
    pub nonce: u64,
    pub denomination: Denomination,
}

/// Raised when an operator confirms that the deliverable was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub payer: Principal,
    pub fingerprint: PaymentFingerprint,
    /// Identifier assigned by the card issuer.
    pub external_reference_id: String,
    pub timestamp: DateTime<Utc>,
    pub confirmed_by: Principal,
}

/// Every record the bridge can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    PaymentAccepted(AcceptanceEvent),
    PaymentSettled(SettlementRecord),
    MinimumAmountUpdated {
        denomination: Denomination,
        previous: Decimal,
        current: Decimal,
        updated_by: Principal,
        timestamp: DateTime<Utc>,
    },
    FundsWithdrawn {
        destination: Principal,
        amount: Decimal,
        denomination: Denomination,
        withdrawn_by: Principal,
        timestamp: DateTime<Utc>,
    },
    RoleGranted {
        role: Role,
        principal: Principal,
        granted_by: Principal,
    },
    RoleRevoked {
        role: Role,
        principal: Principal,
        revoked_by: Principal,
    },
    Paused {
        by: Principal,
    },
    Unpaused {
        by: Principal,
    },
}

impl BridgeEvent {
    /// Short stable name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaymentAccepted(_) => "PAYMENT_ACCEPTED",
            Self::PaymentSettled(_) => "PAYMENT_SETTLED",
            Self::MinimumAmountUpdated { .. } => "MINIMUM_AMOUNT_UPDATED",
            Self::FundsWithdrawn { .. } => "FUNDS_WITHDRAWN",
            Self::RoleGranted { .. } => "ROLE_GRANTED",
            Self::RoleRevoked { .. } => "ROLE_REVOKED",
            Self::Paused { .. } => "PAUSED",
            Self::Unpaused { .. } => "UNPAUSED",
        }
    }

    #[must_use]
    pub fn as_acceptance(&self) -> Option<&AcceptanceEvent> {
        match self {
            Self::PaymentAccepted(event) => Some(event),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_settlement(&self) -> Option<&SettlementRecord> {
        match self {
            Self::PaymentSettled(record) => Some(record),
            _ => None,
        }
    }
}

/// A record as stored in the outbound log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    /// Position in the log, starting at 0 with no gaps.
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: BridgeEvent,
}
