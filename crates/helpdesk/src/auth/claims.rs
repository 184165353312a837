//! Session claims, resolved identities and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role derived from the identity flags.
///
/// Ordered by privilege so that `role >= Role::Staff` reads as "is staff".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary user; sees and cancels only their own tickets.
    #[default]
    Common,
    /// Support staff.
    Staff,
    /// Superuser. Same ticket capabilities as staff.
    Superuser,
}

impl Role {
    /// Derive the role from the stored flags. The superuser flag wins.
    pub fn from_flags(is_staff: bool, is_superuser: bool) -> Self {
        if is_superuser {
            Role::Superuser
        } else if is_staff {
            Role::Staff
        } else {
            Role::Common
        }
    }

    /// Whether this role carries staff privileges.
    pub fn is_staff(self) -> bool {
        self >= Role::Staff
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Common => write!(f, "common"),
            Role::Staff => write!(f, "staff"),
            Role::Superuser => write!(f, "superuser"),
        }
    }
}

/// Authenticated identity attached to a request.
///
/// Built either from a verified credential lookup or from verified token
/// claims, never from client-supplied fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Identity {
    /// Effective role of this identity.
    pub fn role(&self) -> Role {
        Role::from_flags(self.is_staff, self.is_superuser)
    }

    /// Whether this identity authored something with the given author email.
    pub fn is_author_of(&self, author_email: &str) -> bool {
        self.email == author_email
    }
}

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub identity: Identity,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for `identity` expiring at `expires_at`.
    pub fn new(identity: Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            exp: expires_at.timestamp(),
        }
    }

    /// Absolute expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the claims are past their expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identity(is_staff: bool, is_superuser: bool) -> Identity {
        Identity {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            is_staff,
            is_superuser,
        }
    }

    #[test]
    fn test_role_from_flags() {
        assert_eq!(Role::from_flags(false, false), Role::Common);
        assert_eq!(Role::from_flags(true, false), Role::Staff);
        assert_eq!(Role::from_flags(false, true), Role::Superuser);
        assert_eq!(Role::from_flags(true, true), Role::Superuser);
    }

    #[test]
    fn test_role_ordering_and_staff() {
        assert!(Role::Common < Role::Staff);
        assert!(Role::Staff < Role::Superuser);
        assert!(!Role::Common.is_staff());
        assert!(Role::Staff.is_staff());
        assert!(Role::Superuser.is_staff());
    }

    #[test]
    fn test_role_display_matches_wire_name() {
        for role in [Role::Common, Role::Staff, Role::Superuser] {
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::Value::String(role.to_string())
            );
        }
    }

    #[test]
    fn test_claims_wire_format() {
        let expires_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = SessionClaims::new(identity(true, false), expires_at);

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["isStaff"], true);
        assert_eq!(json["isSuperuser"], false);
        assert_eq!(json["exp"], 1_700_000_000_i64);

        let parsed: SessionClaims = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_claims_expiry_check() {
        let now = Utc::now();
        let live = SessionClaims::new(identity(false, false), now + Duration::seconds(30));
        let dead = SessionClaims::new(identity(false, false), now - Duration::seconds(1));

        assert!(!live.is_expired_at(now));
        assert!(dead.is_expired_at(now));
        assert_eq!(live.expires_at().timestamp(), live.exp);
    }

    #[test]
    fn test_identity_authorship() {
        let alice = identity(false, false);
        assert!(alice.is_author_of("alice@example.com"));
        assert!(!alice.is_author_of("bob@example.com"));
        assert_eq!(alice.role(), Role::Common);
    }
}
