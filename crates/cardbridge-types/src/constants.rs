//! System-wide constants for the CardBridge core.

/// Domain separation tag mixed into every payment fingerprint.
pub const FINGERPRINT_DOMAIN: &[u8] = b"cardbridge:fingerprint:v1:";

/// Chain id of the Sepolia test network, the bridge's default environment.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Symbol of the token rail accepted by default.
pub const DEFAULT_TOKEN_SYMBOL: &str = "SOVR";

/// Default minimum native payment, as (mantissa, scale): 0.001.
pub const DEFAULT_NATIVE_MINIMUM: (i64, u32) = (1, 3);

/// Default minimum token payment, as (mantissa, scale): 10.
pub const DEFAULT_TOKEN_MINIMUM: (i64, u32) = (10, 0);

/// Default capacity of the event subscription channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Crate version, reported when a bridge is deployed.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name reported when a bridge is deployed.
pub const ENGINE_NAME: &str = "CardBridge";
