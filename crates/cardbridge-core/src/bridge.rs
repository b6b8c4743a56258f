//! The deployed bridge and its external call surface.
//!
//! ## Deployment
//!
//! 1. Validate the [`BridgeConfig`]
//! 2. Create the event log that every component records into
//! 3. Bootstrap roles: the deployer holds SuperAdmin, Admin and Operator
//! 4. Create the stores (ledger, custody) and the pause gate
//! 5. Wire intake, acknowledger and treasury around them
//!
//! Every privileged method takes the calling principal explicitly; there is
//! no ambient caller.

use std::sync::Arc;

use cardbridge_access::{PauseGate, ReentrancyGuard, RoleRegistry};
use cardbridge_intake::PaymentIntake;
use cardbridge_ledger::{Custody, EventLog, EventSink, ReplayLedger};
use cardbridge_settlement::{SettlementAcknowledger, Treasury};
use cardbridge_types::{
    AcceptanceEvent, Balances, BridgeConfig, Clock, Denomination, EnvironmentId,
    Minimums, NativeTransfer, OperationalState, PaymentFingerprint, Principal, Result, Role,
    SettlementRecord, SystemClock, TokenTransfer, constants,
};
use rust_decimal::Decimal;

/// A deployed payment-intake bridge.
pub struct CardBridge {
    config: BridgeConfig,
    roles: Arc<RoleRegistry>,
    gate: Arc<PauseGate>,
    ledger: Arc<ReplayLedger>,
    custody: Arc<Custody>,
    events: Arc<EventLog>,
    intake: PaymentIntake,
    acknowledger: SettlementAcknowledger,
    treasury: Treasury,
}

impl CardBridge {
    /// Deploy a bridge using the system clock.
    ///
    /// # Errors
    /// - `Configuration` if `config` is invalid
    /// - `InvalidPrincipal` if `deployer` is the null principal
    pub fn deploy(
        config: BridgeConfig,
        deployer: Principal,
        token: Arc<dyn TokenTransfer>,
        native: Arc<dyn NativeTransfer>,
    ) -> Result<Self> {
        Self::deploy_with_clock(config, deployer, token, native, Arc::new(SystemClock))
    }

    /// Deploy a bridge reading time from `clock`.
    pub fn deploy_with_clock(
        config: BridgeConfig,
        deployer: Principal,
        token: Arc<dyn TokenTransfer>,
        native: Arc<dyn NativeTransfer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let events = Arc::new(EventLog::new(config.event_channel_capacity));
        let sink: Arc<dyn EventSink> = events.clone();
        let roles = Arc::new(RoleRegistry::bootstrap(deployer, Arc::clone(&sink))?);
        let gate = Arc::new(PauseGate::new(Arc::clone(&roles), Arc::clone(&sink)));
        let ledger = Arc::new(ReplayLedger::new(config.environment_id));
        let custody = Arc::new(Custody::new());
        let guard = Arc::new(ReentrancyGuard::new());

        let intake = PaymentIntake::new(
            Arc::clone(&ledger),
            Arc::clone(&gate),
            Arc::clone(&roles),
            Arc::clone(&custody),
            Arc::clone(&token),
            Arc::clone(&sink),
            Arc::clone(&clock),
            Arc::clone(&guard),
            config.minimums(),
        );
        let acknowledger = SettlementAcknowledger::new(
            Arc::clone(&ledger),
            Arc::clone(&roles),
            Arc::clone(&sink),
            Arc::clone(&clock),
        );
        let treasury = Treasury::new(
            Arc::clone(&roles),
            Arc::clone(&custody),
            token,
            native,
            sink,
            clock,
            guard,
        );

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            deployer = %deployer,
            environment = %config.environment_id,
            token = %config.token_symbol,
            native_minimum = %config.native_minimum,
            token_minimum = %config.token_minimum,
            "CardBridge deployed"
        );

        Ok(Self {
            config,
            roles,
            gate,
            ledger,
            custody,
            events,
            intake,
            acknowledger,
            treasury,
        })
    }

    // ------------------------------------------------------------------
    // Payment submission
    // ------------------------------------------------------------------

    /// Native payment; `amount` is the value attached to the call.
    pub fn purchase(&self, payer: Principal, amount: Decimal) -> Result<AcceptanceEvent> {
        self.intake.purchase(payer, amount)
    }

    /// Token payment pulled from `payer` within its prior allowance.
    pub fn purchase_with_token(&self, payer: Principal, amount: Decimal) -> Result<AcceptanceEvent> {
        self.intake.purchase_with_token(payer, amount)
    }

    // ------------------------------------------------------------------
    // Operator acknowledgment
    // ------------------------------------------------------------------

    pub fn confirm(
        &self,
        caller: &Principal,
        payer: Principal,
        fingerprint: PaymentFingerprint,
        external_reference_id: impl Into<String>,
    ) -> Result<SettlementRecord> {
        self.acknowledger
            .confirm(caller, payer, fingerprint, external_reference_id)
    }

    // ------------------------------------------------------------------
    // Admin configuration
    // ------------------------------------------------------------------

    pub fn set_minimums(&self, caller: &Principal, native: Decimal, token: Decimal) -> Result<()> {
        self.intake.set_minimums(caller, native, token)
    }

    pub fn withdraw(
        &self,
        caller: &Principal,
        destination: Principal,
        amount: Decimal,
        denomination: Denomination,
    ) -> Result<()> {
        self.treasury
            .withdraw(caller, destination, amount, denomination)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn pause(&self, caller: &Principal) -> Result<()> {
        self.gate.pause(caller)
    }

    pub fn unpause(&self, caller: &Principal) -> Result<()> {
        self.gate.unpause(caller)
    }

    // ------------------------------------------------------------------
    // Role administration
    // ------------------------------------------------------------------

    /// Grant `role` to `principal`, recording `RoleGranted` if it was not
    /// already held.
    pub fn grant_role(&self, caller: &Principal, role: Role, principal: Principal) -> Result<bool> {
        self.roles.grant_role(caller, role, principal)
    }

    /// Revoke `role` from `principal`, recording `RoleRevoked` if it was held.
    pub fn revoke_role(&self, caller: &Principal, role: Role, principal: Principal) -> Result<bool> {
        self.roles.revoke_role(caller, role, principal)
    }

    /// Drop one of the caller's own roles.
    pub fn renounce_role(&self, caller: &Principal, role: Role) -> Result<bool> {
        self.roles.renounce_role(caller, role)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn has_role(&self, principal: &Principal, role: Role) -> bool {
        self.roles.has_role(principal, role)
    }

    #[must_use]
    pub fn members_of(&self, role: Role) -> Vec<Principal> {
        self.roles.members_of(role)
    }

    #[must_use]
    pub fn roles_of(&self, principal: &Principal) -> Vec<Role> {
        self.roles.roles_of(principal)
    }

    #[must_use]
    pub fn nonce_of(&self, payer: &Principal) -> u64 {
        self.ledger.next_nonce(payer)
    }

    #[must_use]
    pub fn is_processed(&self, fingerprint: &PaymentFingerprint) -> bool {
        self.ledger.is_processed(fingerprint)
    }

    #[must_use]
    pub fn accepted_payer(&self, fingerprint: &PaymentFingerprint) -> Option<Principal> {
        self.ledger.accepted_payer(fingerprint)
    }

    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.ledger.processed_count()
    }

    #[must_use]
    pub fn is_confirmed(&self, fingerprint: &PaymentFingerprint) -> bool {
        self.acknowledger.is_confirmed(fingerprint)
    }

    #[must_use]
    pub fn balances(&self) -> Balances {
        self.treasury.balances()
    }

    #[must_use]
    pub fn minimums(&self) -> Minimums {
        self.intake.minimums()
    }

    #[must_use]
    pub fn state(&self) -> OperationalState {
        self.gate.state()
    }

    #[must_use]
    pub fn environment(&self) -> EnvironmentId {
        self.ledger.environment()
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The outbound record log.
    #[must_use]
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Check custody conservation for both denominations.
    pub fn verify_conservation(&self) -> Result<()> {
        self.custody.verify_conservation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbridge_ledger::{SimulatedNative, SimulatedToken};
    use cardbridge_types::BridgeError;

    fn deploy() -> (CardBridge, Principal) {
        let deployer = Principal::random();
        let bridge = CardBridge::deploy(
            BridgeConfig::default(),
            deployer,
            Arc::new(SimulatedToken::new()),
            Arc::new(SimulatedNative::new()),
        )
        .unwrap();
        (bridge, deployer)
    }

    #[test]
    fn deploy_bootstraps_deployer() {
        let (bridge, deployer) = deploy();
        assert_eq!(
            bridge.roles_of(&deployer),
            vec![Role::SuperAdmin, Role::Admin, Role::Operator]
        );
        assert_eq!(bridge.state(), OperationalState::Active);
        assert_eq!(bridge.minimums(), BridgeConfig::default().minimums());
        assert_eq!(bridge.environment(), EnvironmentId::default());
        assert!(bridge.events().is_empty());
    }

    #[test]
    fn deploy_rejects_invalid_config() {
        let config = BridgeConfig {
            native_minimum: Decimal::ZERO,
            ..BridgeConfig::default()
        };
        let result = CardBridge::deploy(
            config,
            Principal::random(),
            Arc::new(SimulatedToken::new()),
            Arc::new(SimulatedNative::new()),
        );
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }

    #[test]
    fn deploy_rejects_zero_deployer() {
        let result = CardBridge::deploy(
            BridgeConfig::default(),
            Principal::ZERO,
            Arc::new(SimulatedToken::new()),
            Arc::new(SimulatedNative::new()),
        );
        assert!(matches!(result, Err(BridgeError::InvalidPrincipal(_))));
    }

    #[test]
    fn role_changes_are_recorded_once() {
        let (bridge, deployer) = deploy();
        let guardian = Principal::random();
        assert!(bridge.grant_role(&deployer, Role::Guardian, guardian).unwrap());
        assert!(!bridge.grant_role(&deployer, Role::Guardian, guardian).unwrap());
        assert!(bridge.renounce_role(&guardian, Role::Guardian).unwrap());

        let kinds: Vec<&str> = bridge
            .events()
            .records()
            .iter()
            .map(|r| r.event.kind())
            .collect();
        assert_eq!(kinds, vec!["ROLE_GRANTED", "ROLE_REVOKED"]);
    }
}
