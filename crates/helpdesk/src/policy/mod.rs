//! Ticket access policy.
//!
//! Pure decisions over an already authenticated [`Identity`]:
//! which tickets it may see and which statuses it may set.
//!
//! Only the target status is checked. The current status of the ticket
//! plays no part, so e.g. staff may reopen a canceled ticket.

use thiserror::Error;

use crate::auth::{Identity, Role};
use crate::ticket::{Ticket, TicketStatus};

/// Statuses staff may set.
const STAFF_STATUSES: &[TicketStatus] = &[
    TicketStatus::Resolved,
    TicketStatus::Unresolved,
    TicketStatus::Pending,
];

/// Statuses a non-staff owner may set.
const OWNER_STATUSES: &[TicketStatus] = &[TicketStatus::Canceled];

/// Access policy failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Ticket does not exist or is not visible to the caller.
    #[error("ticket not found")]
    NotFound,

    /// Requested status is not allowed for the caller.
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
}

/// Which tickets a store query should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketScope {
    All,
    AuthoredBy(String),
}

impl TicketScope {
    /// Author email filter, `None` for unrestricted scopes.
    pub fn author(&self) -> Option<&str> {
        match self {
            TicketScope::All => None,
            TicketScope::AuthoredBy(email) => Some(email),
        }
    }
}

/// Visibility scope for `identity`.
pub fn ticket_scope(identity: &Identity) -> TicketScope {
    if identity.role().is_staff() {
        TicketScope::All
    } else {
        TicketScope::AuthoredBy(identity.email.clone())
    }
}

pub fn can_view(identity: &Identity, ticket: &Ticket) -> bool {
    identity.role().is_staff() || identity.is_author_of(&ticket.author_email)
}

/// Keep only the tickets `identity` may see.
pub fn filter_visible(identity: &Identity, tickets: Vec<Ticket>) -> Vec<Ticket> {
    tickets
        .into_iter()
        .filter(|ticket| can_view(identity, ticket))
        .collect()
}

/// Turn a lookup result into a visible ticket.
///
/// Absent and invisible tickets are both `NotFound`.
pub fn ensure_visible(identity: &Identity, ticket: Option<Ticket>) -> Result<Ticket, PolicyError> {
    match ticket {
        Some(ticket) if can_view(identity, &ticket) => Ok(ticket),
        _ => Err(PolicyError::NotFound),
    }
}

/// Statuses a role may set.
pub fn allowed_statuses(role: Role) -> &'static [TicketStatus] {
    match role {
        Role::Staff | Role::Superuser => STAFF_STATUSES,
        Role::Common => OWNER_STATUSES,
    }
}

/// Check that `identity` may set `ticket` to `target` and return the parsed status.
pub fn validate_transition(
    identity: &Identity,
    ticket: &Ticket,
    target: &str,
) -> Result<TicketStatus, PolicyError> {
    let status: TicketStatus = target
        .trim()
        .parse()
        .map_err(|_| PolicyError::InvalidTransition(format!("unknown status '{}'", target)))?;

    let role = identity.role();
    if !role.is_staff() && !identity.is_author_of(&ticket.author_email) {
        return Err(PolicyError::InvalidTransition(
            "only the ticket author or staff may change its status".to_string(),
        ));
    }

    if !allowed_statuses(role).contains(&status) {
        return Err(PolicyError::InvalidTransition(format!(
            "{} may not set status '{}'",
            if role.is_staff() { "staff" } else { "owner" },
            status
        )));
    }

    Ok(status)
}
