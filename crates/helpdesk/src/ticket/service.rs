//! Ticket service: validation plus access policy over the repository.

use thiserror::Error;
use tracing::{info, instrument};

use super::models::{CreateTicketRequest, MAX_TOPIC_LEN, Message, MessageKind, Ticket};
use super::repository::TicketRepository;
use crate::auth::Identity;
use crate::policy::{self, PolicyError};

/// Ticket operation failures.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Service for ticket operations on behalf of an authenticated identity.
#[derive(Debug, Clone)]
pub struct TicketService {
    repo: TicketRepository,
}

impl TicketService {
    /// Create a new ticket service.
    pub fn new(repo: TicketRepository) -> Self {
        Self { repo }
    }

    /// Tickets visible to `identity`.
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Ticket>, TicketError> {
        let tickets = self.repo.list(&policy::ticket_scope(identity)).await?;
        Ok(policy::filter_visible(identity, tickets))
    }

    /// A single ticket, `NotFound` unless visible to `identity`.
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn get(&self, identity: &Identity, id: i64) -> Result<Ticket, TicketError> {
        let ticket = self.repo.get(id, &policy::ticket_scope(identity)).await?;
        Ok(policy::ensure_visible(identity, ticket)?)
    }

    /// Open a ticket authored by `identity`.
    #[instrument(skip(self, identity, request), fields(email = %identity.email))]
    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateTicketRequest,
    ) -> Result<Ticket, TicketError> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(TicketError::Validation("Topic is required.".to_string()));
        }
        if topic.chars().count() > MAX_TOPIC_LEN {
            return Err(TicketError::Validation(format!(
                "Topic must be at most {} characters.",
                MAX_TOPIC_LEN
            )));
        }
        if request.text.trim().is_empty() {
            return Err(TicketError::Validation("Text is required.".to_string()));
        }

        let ticket = self
            .repo
            .create(
                &identity.email,
                topic,
                &request.text,
                MessageKind::for_author(identity.role().is_staff()),
            )
            .await?;
        info!(ticket_id = ticket.id, "Ticket opened");

        Ok(ticket)
    }

    /// Change a ticket's status if the policy allows it.
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        target: &str,
    ) -> Result<Ticket, TicketError> {
        let ticket = self.get(identity, id).await?;
        let status = policy::validate_transition(identity, &ticket, target)?;

        let updated = self
            .repo
            .update_status(ticket.id, status)
            .await?
            .ok_or(PolicyError::NotFound)?;
        info!(ticket_id = id, from = %ticket.status, to = %status, "Ticket status changed");

        Ok(updated)
    }

    /// Messages of a visible ticket.
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn messages(&self, identity: &Identity, id: i64) -> Result<Vec<Message>, TicketError> {
        let ticket = self.get(identity, id).await?;
        Ok(self.repo.messages(ticket.id).await?)
    }

    /// Add a message to a visible ticket.
    #[instrument(skip(self, identity, text), fields(email = %identity.email))]
    pub async fn add_message(
        &self,
        identity: &Identity,
        id: i64,
        text: &str,
    ) -> Result<Message, TicketError> {
        if text.trim().is_empty() {
            return Err(TicketError::Validation("Text is required.".to_string()));
        }

        let ticket = self.get(identity, id).await?;
        let message = self
            .repo
            .add_message(
                ticket.id,
                &identity.email,
                MessageKind::for_author(identity.role().is_staff()),
                text,
            )
            .await?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::ticket::TicketStatus;

    fn identity(name: &str, is_staff: bool) -> Identity {
        Identity {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            is_staff,
            is_superuser: false,
        }
    }

    async fn setup() -> (Database, TicketService) {
        let db = Database::in_memory().await.unwrap();
        for name in ["alice", "bob", "sam"] {
            sqlx::query("INSERT INTO users (email, password_hash, username, is_staff) VALUES (?, 'x', ?, ?)")
                .bind(format!("{}@example.com", name))
                .bind(name)
                .bind(name == "sam")
                .execute(db.pool())
                .await
                .unwrap();
        }
        let service = TicketService::new(TicketRepository::new(db.pool().clone()));
        (db, service)
    }

    fn request(topic: &str, text: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            topic: topic.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_visibility() {
        let (_db, service) = setup().await;
        let alice = identity("alice", false);
        let bob = identity("bob", false);
        let sam = identity("sam", true);

        let a = service.create(&alice, request("Printer", "Jammed")).await.unwrap();
        let b = service.create(&bob, request("VPN", "Down")).await.unwrap();

        let own: Vec<i64> = service.list(&alice).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(own, vec![a.id]);
        assert_eq!(service.list(&sam).await.unwrap().len(), 2);

        assert!(matches!(
            service.get(&alice, b.id).await,
            Err(TicketError::Policy(PolicyError::NotFound))
        ));
        assert!(matches!(
            service.get(&alice, 4242).await,
            Err(TicketError::Policy(PolicyError::NotFound))
        ));
        assert_eq!(service.get(&sam, b.id).await.unwrap().id, b.id);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_db, service) = setup().await;
        let alice = identity("alice", false);

        for req in [
            request("", "text"),
            request("   ", "text"),
            request("a topic that is way too long", "text"),
            request("Printer", ""),
        ] {
            assert!(matches!(
                service.create(&alice, req).await,
                Err(TicketError::Validation(_))
            ));
        }

        let exact = "x".repeat(MAX_TOPIC_LEN);
        assert!(service.create(&alice, request(&exact, "text")).await.is_ok());
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (_db, service) = setup().await;
        let alice = identity("alice", false);
        let bob = identity("bob", false);
        let sam = identity("sam", true);
        let ticket = service.create(&alice, request("Printer", "Jammed")).await.unwrap();

        assert!(matches!(
            service.update_status(&alice, ticket.id, "resolved").await,
            Err(TicketError::Policy(PolicyError::InvalidTransition(_)))
        ));
        assert!(matches!(
            service.update_status(&bob, ticket.id, "canceled").await,
            Err(TicketError::Policy(PolicyError::NotFound))
        ));
        assert!(matches!(
            service.update_status(&sam, ticket.id, "canceled").await,
            Err(TicketError::Policy(PolicyError::InvalidTransition(_)))
        ));

        let resolved = service.update_status(&sam, ticket.id, "resolved").await.unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);

        let canceled = service.update_status(&alice, ticket.id, "canceled").await.unwrap();
        assert_eq!(canceled.status, TicketStatus::Canceled);
    }

    #[tokio::test]
    async fn test_messages() {
        let (_db, service) = setup().await;
        let alice = identity("alice", false);
        let bob = identity("bob", false);
        let sam = identity("sam", true);
        let ticket = service.create(&alice, request("Printer", "Jammed")).await.unwrap();

        let reply = service.add_message(&sam, ticket.id, "On my way").await.unwrap();
        assert_eq!(reply.kind, MessageKind::Response);

        let follow_up = service.add_message(&alice, ticket.id, "Thanks").await.unwrap();
        assert_eq!(follow_up.kind, MessageKind::Request);

        assert_eq!(service.messages(&alice, ticket.id).await.unwrap().len(), 3);
        assert!(matches!(
            service.messages(&bob, ticket.id).await,
            Err(TicketError::Policy(PolicyError::NotFound))
        ));
        assert!(matches!(
            service.add_message(&bob, ticket.id, "Hi").await,
            Err(TicketError::Policy(PolicyError::NotFound))
        ));
        assert!(matches!(
            service.add_message(&alice, ticket.id, "  ").await,
            Err(TicketError::Validation(_))
        ));
    }
}
