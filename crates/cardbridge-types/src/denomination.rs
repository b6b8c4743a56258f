//! Payment rails, per-rail minimums, custody balances, and the intake switch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Which of the two supported payment rails a transaction uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Denomination {
    /// The chain's native currency, attached to the call itself.
    Native,
    /// The configured token, pulled from the payer through an allowance.
    Token,
}

impl std::fmt::Display for Denomination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "Native"),
            Self::Token => write!(f, "Token"),
        }
    }
}

/// Minimum acceptable payment per denomination. Both values are > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimums {
    pub native: Decimal,
    pub token: Decimal,
}

impl Minimums {
    #[must_use]
    pub fn new(native: Decimal, token: Decimal) -> Self {
        Self { native, token }
    }

    #[must_use]
    pub fn for_denomination(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Native => self.native,
            Denomination::Token => self.token,
        }
    }

    /// Whether both floors are strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.native > Decimal::ZERO && self.token > Decimal::ZERO
    }
}

impl Default for Minimums {
    fn default() -> Self {
        let (nm, ns) = constants::DEFAULT_NATIVE_MINIMUM;
        let (tm, ts) = constants::DEFAULT_TOKEN_MINIMUM;
        Self {
            native: Decimal::new(nm, ns),
            token: Decimal::new(tm, ts),
        }
    }
}

/// Funds held in custody by the bridge, per denomination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub native: Decimal,
    pub token: Decimal,
}

impl Balances {
    #[must_use]
    pub fn get(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Native => self.native,
            Denomination::Token => self.token,
        }
    }

    pub fn get_mut(&mut self, denomination: Denomination) -> &mut Decimal {
        match denomination {
            Denomination::Native => &mut self.native,
            Denomination::Token => &mut self.token,
        }
    }
}

/// Whether intake entry points may execute.
///
/// Cyclic, no terminal state: `Active → Paused → Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalState {
    #[default]
    Active,
    Paused,
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}
