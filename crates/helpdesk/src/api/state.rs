//! Application state shared across handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::auth::{AuthConfig, AuthGate, SessionIssuer, TokenCodec};
use crate::db::Database;
use crate::ticket::{TicketRepository, TicketService};
use crate::user::{UserRepository, UserService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// User service for registration and lookup.
    pub users: UserService,
    /// Ticket service.
    pub tickets: TicketService,
    /// Login and renewal.
    pub sessions: SessionIssuer,
    /// Session cookie verification.
    pub gate: AuthGate,
    /// Resolved bearer token for staff registration.
    pub staff_token: Option<Arc<str>>,
    /// Mark session cookies `Secure`.
    pub secure_cookie: bool,
    /// Allowed CORS origins.
    pub allowed_origins: Arc<[String]>,
}

impl AppState {
    /// Wire services over `db` and build the token codec from `auth`.
    ///
    /// Fails if the auth configuration is invalid or the signing key is unusable.
    pub fn new(db: &Database, auth: &AuthConfig) -> Result<Self> {
        auth.validate().context("invalid auth configuration")?;

        let secret = auth.signing_secret()?;
        let codec = TokenCodec::new(secret.as_bytes()).context("initializing token codec")?;

        let users = UserService::new(UserRepository::new(db.pool().clone()));
        let tickets = TicketService::new(TicketRepository::new(db.pool().clone()));
        let sessions = SessionIssuer::new(
            codec.clone(),
            Arc::new(users.clone()),
            auth.session_policy(),
        );
        let gate = AuthGate::new(codec, auth.cookie_name.clone());

        Ok(Self {
            users,
            tickets,
            sessions,
            gate,
            staff_token: auth.resolve_staff_token()?.map(Arc::from),
            secure_cookie: auth.secure_cookie,
            allowed_origins: auth.allowed_origins.clone().into(),
        })
    }
}
