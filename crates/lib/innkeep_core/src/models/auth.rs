//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! DTOs (which carry `#[serde(rename)]` for camelCase wire names).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential row shared by exactly one role record.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: i64,
    pub email: String,
    pub password_hash: String,
}

/// Which table backs a principal, and which authority set it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleKind {
    User,
    Admin,
}

impl RoleKind {
    /// Authority strings granted to this role. Admins hold every authority a
    /// user holds.
    pub fn authorities(self) -> &'static [&'static str] {
        match self {
            RoleKind::Admin => &["ROLE_ADMIN", "ROLE_USER"],
            RoleKind::User => &["ROLE_USER"],
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::User => f.write_str("USER"),
            RoleKind::Admin => f.write_str("ADMIN"),
        }
    }
}

/// Token kind marker carried in the JWT `sub` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Resolved authenticated identity used for authorization decisions.
///
/// Not persisted — derived from a role row joined to its account.
#[derive(Debug, Clone)]
pub struct Principal {
    pub role: RoleKind,
    pub id: i64,
    pub email: String,
}

impl Principal {
    pub fn authorities(&self) -> &'static [&'static str] {
        self.role.authorities()
    }
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token kind marker (standard JWT `sub` claim).
    pub sub: TokenKind,
    /// Role the token was minted for.
    pub role: RoleKind,
    /// Principal id within the role's table.
    pub id: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Random token id; makes every mint distinct so rotation always
    /// supersedes the previous value.
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_authorities_are_a_superset_of_user_authorities() {
        let admin = RoleKind::Admin.authorities();
        let user = RoleKind::User.authorities();
        for authority in user {
            assert!(admin.contains(authority));
        }
        assert!(admin.contains(&"ROLE_ADMIN"));
        assert!(!user.contains(&"ROLE_ADMIN"));
    }

    #[test]
    fn role_kind_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&RoleKind::User).unwrap(),
            "\"USER\""
        );
        assert_eq!(
            serde_json::to_string(&RoleKind::Admin).unwrap(),
            "\"ADMIN\""
        );
    }

    #[test]
    fn token_kind_round_trips_through_serde() {
        let json = serde_json::to_string(&TokenKind::Refresh).unwrap();
        assert_eq!(json, "\"REFRESH\"");
        let kind: TokenKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, TokenKind::Refresh);
    }
}
