//! In-memory payment rails.
//!
//! [`SimulatedToken`] models an allowance-based token: holders approve the
//! bridge, and `transfer_from` pulls within that allowance. [`SimulatedNative`]
//! records outbound native sends. Both can be told to fail the next call,
//! and both can run a hook in the middle of a transfer, which is where a
//! real rail could hand control to untrusted code.

use std::collections::HashMap;
use std::sync::Arc;

use cardbridge_types::{NativeTransfer, Principal, TokenTransfer, TransferError};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Callback run inside a transfer, after validation and before the
/// balances move. No rail lock is held while it runs.
pub type TransferHook = Arc<dyn Fn(&Principal, Decimal) + Send + Sync>;

#[derive(Default)]
struct TokenBook {
    balances: HashMap<Principal, Decimal>,
    allowances: HashMap<Principal, Decimal>,
    custody: Decimal,
    fail_next: Option<String>,
}

/// Allowance-based token rail.
#[derive(Default)]
pub struct SimulatedToken {
    book: Mutex<TokenBook>,
    hook: Mutex<Option<TransferHook>>,
}

impl SimulatedToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `holder` tokens out of thin air. Saturates at `Decimal::MAX`.
    pub fn mint(&self, holder: Principal, amount: Decimal) {
        let mut book = self.book.lock();
        let balance = book.balances.entry(holder).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Set the allowance `holder` grants the bridge.
    pub fn approve(&self, holder: Principal, amount: Decimal) {
        self.book.lock().allowances.insert(holder, amount);
    }

    #[must_use]
    pub fn balance_of(&self, holder: &Principal) -> Decimal {
        self.book
            .lock()
            .balances
            .get(holder)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn allowance(&self, holder: &Principal) -> Decimal {
        self.book
            .lock()
            .allowances
            .get(holder)
            .copied()
            .unwrap_or_default()
    }

    /// Tokens held by the bridge on this rail.
    #[must_use]
    pub fn custody_balance(&self) -> Decimal {
        self.book.lock().custody
    }

    /// Make the next transfer in either direction fail with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.book.lock().fail_next = Some(reason.into());
    }

    pub fn set_hook(&self, hook: TransferHook) {
        *self.hook.lock() = Some(hook);
    }

    pub fn clear_hook(&self) {
        *self.hook.lock() = None;
    }

    fn run_hook(&self, counterparty: &Principal, amount: Decimal) {
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(counterparty, amount);
        }
    }
}

impl TokenTransfer for SimulatedToken {
    fn transfer_from(&self, payer: &Principal, amount: Decimal) -> Result<(), TransferError> {
        {
            let mut book = self.book.lock();
            if let Some(reason) = book.fail_next.take() {
                return Err(TransferError::Rejected(reason));
            }
            let allowance = book.allowances.get(payer).copied().unwrap_or_default();
            if allowance < amount {
                return Err(TransferError::InsufficientAllowance {
                    allowance,
                    requested: amount,
                });
            }
            let balance = book.balances.get(payer).copied().unwrap_or_default();
            if balance < amount {
                return Err(TransferError::InsufficientBalance {
                    balance,
                    requested: amount,
                });
            }
        }

        self.run_hook(payer, amount);

        let mut book = self.book.lock();
        // Re-check: the hook may have moved funds.
        let balance = book.balances.get(payer).copied().unwrap_or_default();
        let allowance = book.allowances.get(payer).copied().unwrap_or_default();
        if balance < amount || allowance < amount {
            return Err(TransferError::Rejected("state changed during transfer".into()));
        }
        let custody = book
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("custody overflow".into()))?;
        book.balances.insert(*payer, balance - amount);
        book.allowances.insert(*payer, allowance - amount);
        book.custody = custody;
        Ok(())
    }

    fn transfer(&self, destination: &Principal, amount: Decimal) -> Result<(), TransferError> {
        {
            let mut book = self.book.lock();
            if let Some(reason) = book.fail_next.take() {
                return Err(TransferError::Rejected(reason));
            }
            if book.custody < amount {
                return Err(TransferError::InsufficientBalance {
                    balance: book.custody,
                    requested: amount,
                });
            }
        }

        self.run_hook(destination, amount);

        let mut book = self.book.lock();
        if book.custody < amount {
            return Err(TransferError::Rejected("state changed during transfer".into()));
        }
        let received = book
            .balances
            .get(destination)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("recipient balance overflow".into()))?;
        book.custody -= amount;
        book.balances.insert(*destination, received);
        Ok(())
    }
}

/// Outbound native rail. Records every successful send.
#[derive(Default)]
pub struct SimulatedNative {
    sent: Mutex<Vec<(Principal, Decimal)>>,
    fail_next: Mutex<Option<String>>,
    hook: Mutex<Option<TransferHook>>,
}

impl SimulatedNative {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful sends, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(Principal, Decimal)> {
        self.sent.lock().clone()
    }

    /// Total sent to `destination`.
    #[must_use]
    pub fn received_by(&self, destination: &Principal) -> Decimal {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == destination)
            .fold(Decimal::ZERO, |total, (_, amount)| total.saturating_add(*amount))
    }

    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    pub fn set_hook(&self, hook: TransferHook) {
        *self.hook.lock() = Some(hook);
    }
}

impl NativeTransfer for SimulatedNative {
    fn send(&self, destination: &Principal, amount: Decimal) -> Result<(), TransferError> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(TransferError::Rejected(reason));
        }
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(destination, amount);
        }
        self.sent.lock().push((*destination, amount));
        Ok(())
    }
}
