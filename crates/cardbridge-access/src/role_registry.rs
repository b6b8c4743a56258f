//! Role registry — principals permitted to perform each privileged action.
//!
//! Membership changes are visible immediately; there is no pending/commit
//! delay. Two-tier administration:
//! - SuperAdmin grants and revokes SuperAdmin and Admin
//! - Admin (or SuperAdmin) grants and revokes Operator and Guardian
//!
//! The registry always keeps at least one SuperAdmin.
//!
//! `RoleGranted` / `RoleRevoked` are emitted while the membership write lock
//! is held, so the record order matches the order of the changes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use cardbridge_ledger::EventSink;
use cardbridge_types::{BridgeError, BridgeEvent, Principal, Result, Role};
use parking_lot::RwLock;

/// Role memberships, keyed by role.
pub struct RoleRegistry {
    members: RwLock<HashMap<Role, BTreeSet<Principal>>>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("members", &*self.members.read())
            .finish_non_exhaustive()
    }
}

impl RoleRegistry {
    /// Create a registry granting SuperAdmin, Admin and Operator to the
    /// deploying principal. The initial grants are not recorded.
    ///
    /// # Errors
    /// Returns `InvalidPrincipal` if `deployer` is the null principal.
    pub fn bootstrap(deployer: Principal, events: Arc<dyn EventSink>) -> Result<Self> {
        if deployer.is_zero() {
            return Err(BridgeError::InvalidPrincipal(deployer));
        }
        let mut members: HashMap<Role, BTreeSet<Principal>> = HashMap::new();
        for role in [Role::SuperAdmin, Role::Admin, Role::Operator] {
            members.entry(role).or_default().insert(deployer);
        }
        tracing::info!(deployer = %deployer, "Role registry bootstrapped");
        Ok(Self {
            members: RwLock::new(members),
            events,
        })
    }

    #[must_use]
    pub fn has_role(&self, principal: &Principal, role: Role) -> bool {
        self.members
            .read()
            .get(&role)
            .is_some_and(|set| set.contains(principal))
    }

    /// Fail with `Unauthorized` unless `principal` holds `role`.
    pub fn require(&self, principal: &Principal, role: Role) -> Result<()> {
        if self.has_role(principal, role) {
            Ok(())
        } else {
            tracing::warn!(principal = %principal, required = %role, "Unauthorized call rejected");
            Err(BridgeError::Unauthorized {
                principal: *principal,
                required: role,
            })
        }
    }

    /// Grant `role` to `principal`. Returns `false` if it was already held.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not administer `role`
    /// - `InvalidPrincipal` if `principal` is the null principal
    pub fn grant_role(&self, caller: &Principal, role: Role, principal: Principal) -> Result<bool> {
        let mut members = self.members.write();
        Self::check_administrator(&members, caller, role)?;
        if principal.is_zero() {
            return Err(BridgeError::InvalidPrincipal(principal));
        }
        let added = members.entry(role).or_default().insert(principal);
        if added {
            self.events.emit(BridgeEvent::RoleGranted {
                role,
                principal,
                granted_by: *caller,
            });
            tracing::info!(role = %role, principal = %principal, by = %caller, "Role granted");
        }
        Ok(added)
    }

    /// Revoke `role` from `principal`. Returns `false` if it was not held.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not administer `role`
    /// - `LastSuperAdmin` if this would leave no SuperAdmin
    pub fn revoke_role(&self, caller: &Principal, role: Role, principal: Principal) -> Result<bool> {
        let mut members = self.members.write();
        Self::check_administrator(&members, caller, role)?;
        let removed = Self::remove(&mut members, role, &principal)?;
        if removed {
            self.events.emit(BridgeEvent::RoleRevoked {
                role,
                principal,
                revoked_by: *caller,
            });
            tracing::info!(role = %role, principal = %principal, by = %caller, "Role revoked");
        }
        Ok(removed)
    }

    /// Drop one of the caller's own roles. Returns `false` if not held.
    ///
    /// # Errors
    /// Returns `LastSuperAdmin` if the caller is the only SuperAdmin.
    pub fn renounce_role(&self, caller: &Principal, role: Role) -> Result<bool> {
        let mut members = self.members.write();
        let removed = Self::remove(&mut members, role, caller)?;
        if removed {
            self.events.emit(BridgeEvent::RoleRevoked {
                role,
                principal: *caller,
                revoked_by: *caller,
            });
            tracing::info!(role = %role, principal = %caller, "Role renounced");
        }
        Ok(removed)
    }

    /// Holders of `role`, in byte order.
    #[must_use]
    pub fn members_of(&self, role: Role) -> Vec<Principal> {
        self.members
            .read()
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn member_count(&self, role: Role) -> usize {
        self.members.read().get(&role).map_or(0, BTreeSet::len)
    }

    /// Roles held by `principal`.
    #[must_use]
    pub fn roles_of(&self, principal: &Principal) -> Vec<Role> {
        let members = self.members.read();
        Role::ALL
            .into_iter()
            .filter(|role| members.get(role).is_some_and(|set| set.contains(principal)))
            .collect()
    }

    fn check_administrator(
        members: &HashMap<Role, BTreeSet<Principal>>,
        caller: &Principal,
        role: Role,
    ) -> Result<()> {
        let administrators = role.administered_by();
        let allowed = administrators
            .iter()
            .any(|admin| members.get(admin).is_some_and(|set| set.contains(caller)));
        if allowed {
            return Ok(());
        }
        // Report the lowest tier that would have sufficed.
        let required = administrators.last().copied().unwrap_or(Role::SuperAdmin);
        tracing::warn!(caller = %caller, role = %role, "Unauthorized role change rejected");
        Err(BridgeError::Unauthorized {
            principal: *caller,
            required,
        })
    }

    fn remove(
        members: &mut HashMap<Role, BTreeSet<Principal>>,
        role: Role,
        principal: &Principal,
    ) -> Result<bool> {
        let Some(set) = members.get_mut(&role) else {
            return Ok(false);
        };
        if !set.contains(principal) {
            return Ok(false);
        }
        if role == Role::SuperAdmin && set.len() == 1 {
            tracing::warn!(principal = %principal, "Refused to remove the last SuperAdmin");
            return Err(BridgeError::LastSuperAdmin);
        }
        Ok(set.remove(principal))
    }
}
