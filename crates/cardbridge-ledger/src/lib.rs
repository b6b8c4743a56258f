//! # cardbridge-ledger
//!
//! **State stores** shared by every bridge component. Each store owns its
//! own locking so components can be wired together by dependency injection
//! and tests can build isolated instances.
//!
//! 1. **ReplayLedger**: per-payer nonces and the processed-fingerprint set
//! 2. **Custody**: funds held per denomination, with conservation totals
//! 3. **EventLog**: append-only outbound record log (poll or subscribe)
//! 4. **Simulated rails**: in-memory token and native rails
//!
//! ## Acceptance Transaction
//!
//! ```text
//! lock payer's nonce cell → fingerprint(pre-increment nonce)
//!     → insert-if-absent PENDING → settle closure (token pull)
//!     → ACCEPTED + nonce += 1 → committed closure (emit)   (settle Ok)
//!     → remove PENDING, nonce as-is                        (settle Err / panic)
//! ```

pub mod custody;
pub mod event_log;
pub mod rails;
pub mod replay_ledger;

pub use custody::Custody;
pub use event_log::{EventLog, EventSink};
pub use rails::{SimulatedNative, SimulatedToken, TransferHook};
pub use replay_ledger::{PendingPayment, ReplayLedger};
