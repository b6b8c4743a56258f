//! Identifiers used throughout CardBridge.
//!
//! Principals and fingerprints are raw 32-byte values compared by equality
//! only. Emitted records are keyed by UUIDv7 for time-ordered sorting.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An opaque caller identity (address / public-key equivalent).
///
/// Carries no structure beyond equality. [`Principal::ZERO`] is the null
/// principal and is never a valid destination or role holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Principal(pub [u8; 32]);

impl Principal {
    /// The null principal.
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// A random non-zero principal.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes[0] |= 1;
        Self(bytes)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// EnvironmentId
// ---------------------------------------------------------------------------

/// Chain / environment identifier mixed into every fingerprint so that a
/// payment accepted in one environment can never collide with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EnvironmentId(pub u64);

impl Default for EnvironmentId {
    fn default() -> Self {
        Self(constants::SEPOLIA_CHAIN_ID)
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PaymentFingerprint
// ---------------------------------------------------------------------------

/// Deterministic 256-bit identifier of one accepted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PaymentFingerprint(pub [u8; 32]);

impl PaymentFingerprint {
    /// Derive the fingerprint of a payment.
    ///
    /// Pure function of its inputs: the same (payer, amount, nonce,
    /// timestamp, environment) always yields the same fingerprint. The
    /// amount is normalized first, so `1.0` and `1` hash identically.
    /// Callers pass the payer's nonce *before* it is incremented.
    #[must_use]
    pub fn compute(
        payer: &Principal,
        amount: Decimal,
        nonce: u64,
        timestamp: DateTime<Utc>,
        environment: EnvironmentId,
    ) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(constants::FINGERPRINT_DOMAIN);
        hasher.update(payer.0);
        hasher.update(amount.normalize().serialize());
        hasher.update(nonce.to_le_bytes());
        hasher.update(timestamp.timestamp_millis().to_le_bytes());
        hasher.update(environment.0.to_le_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| crate::BridgeError::Serialization(format!("fingerprint hex: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            crate::BridgeError::Serialization("fingerprint must be 32 bytes".into())
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for PaymentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fp:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Unique identifier of an emitted record. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
