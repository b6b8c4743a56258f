//! Shared harness for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cardbridge_core::CardBridge;
use cardbridge_ledger::{SimulatedNative, SimulatedToken};
use cardbridge_types::{BridgeConfig, FixedClock, Principal, Role};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Install a test-writer subscriber once per binary. `RUST_LOG` controls it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub bridge: Arc<CardBridge>,
    pub token: Arc<SimulatedToken>,
    pub native: Arc<SimulatedNative>,
    pub clock: Arc<FixedClock>,
    pub deployer: Principal,
    pub guardian: Principal,
}

impl Harness {
    /// Deploy with default config, a frozen clock and a Guardian granted.
    pub fn deploy() -> Self {
        Self::deploy_with(BridgeConfig::default())
    }

    pub fn deploy_with(config: BridgeConfig) -> Self {
        init_tracing();
        let deployer = Principal::random();
        let guardian = Principal::random();
        let token = Arc::new(SimulatedToken::new());
        let native = Arc::new(SimulatedNative::new());
        let clock = Arc::new(FixedClock::new(
            Utc.timestamp_millis_opt(1_735_689_600_000).unwrap(),
        ));
        let bridge = CardBridge::deploy_with_clock(
            config,
            deployer,
            token.clone(),
            native.clone(),
            clock.clone(),
        )
        .unwrap();
        bridge.grant_role(&deployer, Role::Guardian, guardian).unwrap();
        Self {
            bridge: Arc::new(bridge),
            token,
            native,
            clock,
            deployer,
            guardian,
        }
    }

    /// A payer holding `amount` tokens, all approved to the bridge.
    pub fn token_payer(&self, amount: Decimal) -> Principal {
        let payer = Principal::random();
        self.token.mint(payer, amount);
        self.token.approve(payer, amount);
        payer
    }
}
