//! Privilege tiers for the bridge.
//!
//! ```text
//!   SuperAdmin ──administers──▶ SuperAdmin, Admin
//!   Admin      ──administers──▶ Operator, Guardian
//! ```
//!
//! SuperAdmin may also administer the lower tier. There is no implicit
//! inheritance for *using* a role: an Admin that wants to pause must also
//! hold Guardian.

use serde::{Deserialize, Serialize};

/// One of the four privilege tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    /// Configuration, unpause, and treasury withdrawals.
    Admin,
    /// Acknowledges fulfillment of accepted payments.
    Operator,
    /// Pauses intake during an incident.
    Guardian,
    /// Administers SuperAdmin and Admin membership.
    SuperAdmin,
}

impl Role {
    /// Every role, in a stable order.
    pub const ALL: [Self; 4] = [Self::SuperAdmin, Self::Admin, Self::Operator, Self::Guardian];

    /// Roles allowed to grant or revoke this role.
    #[must_use]
    pub fn administered_by(self) -> &'static [Role] {
        match self {
            Self::SuperAdmin | Self::Admin => &[Self::SuperAdmin],
            Self::Operator | Self::Guardian => &[Self::SuperAdmin, Self::Admin],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Operator => write!(f, "OPERATOR"),
            Self::Guardian => write!(f, "GUARDIAN"),
            Self::SuperAdmin => write!(f, "SUPER_ADMIN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_super_admin_administers_admin() {
        assert_eq!(Role::Admin.administered_by(), &[Role::SuperAdmin]);
        assert_eq!(Role::SuperAdmin.administered_by(), &[Role::SuperAdmin]);
    }

    #[test]
    fn sub_roles_two_tier() {
        for role in [Role::Operator, Role::Guardian] {
            assert!(role.administered_by().contains(&Role::Admin));
            assert!(role.administered_by().contains(&Role::SuperAdmin));
        }
    }

    #[test]
    fn role_display() {
        assert_eq!(format!("{}", Role::SuperAdmin), "SUPER_ADMIN");
        assert_eq!(format!("{}", Role::Guardian), "GUARDIAN");
    }
}
