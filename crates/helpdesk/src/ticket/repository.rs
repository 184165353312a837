//! Ticket repository for database operations.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{Message, MessageKind, Ticket, TicketStatus};
use crate::policy::TicketScope;

/// Repository for ticket and message database operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Create a new ticket repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a ticket in `pending` together with its first message.
    #[instrument(skip(self, text))]
    pub async fn create(
        &self,
        author_email: &str,
        topic: &str,
        text: &str,
        kind: MessageKind,
    ) -> Result<Ticket> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let ticket_id = sqlx::query(
            r#"
            INSERT INTO tickets (author_email, topic, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(author_email)
        .bind(topic)
        .bind(TicketStatus::Pending)
        .execute(&mut *tx)
        .await
        .context("Failed to insert ticket")?
        .last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO messages (ticket_id, author_email, kind, text)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(ticket_id)
        .bind(author_email)
        .bind(kind.to_string())
        .bind(text)
        .execute(&mut *tx)
        .await
        .context("Failed to insert first message")?;

        tx.commit().await.context("Failed to commit ticket")?;
        debug!(ticket_id, "Ticket created");

        self.get(ticket_id, &TicketScope::All)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Ticket not found after creation"))
    }

    /// Get a ticket by id within `scope`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64, scope: &TicketScope) -> Result<Option<Ticket>> {
        let author = scope.author();
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, created_at, updated_at, author_email, topic, status
            FROM tickets
            WHERE id = ? AND (? IS NULL OR author_email = ?)
            "#,
        )
        .bind(id)
        .bind(author)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch ticket")?;

        Ok(ticket)
    }

    /// List tickets within `scope`, oldest first.
    #[instrument(skip(self))]
    pub async fn list(&self, scope: &TicketScope) -> Result<Vec<Ticket>> {
        let author = scope.author();
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, created_at, updated_at, author_email, topic, status
            FROM tickets
            WHERE ? IS NULL OR author_email = ?
            ORDER BY id ASC
            "#,
        )
        .bind(author)
        .bind(author)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tickets")?;

        Ok(tickets)
    }

    /// Set a ticket's status and bump `updated_at`.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: i64, status: TicketStatus) -> Result<Option<Ticket>> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update ticket status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id, &TicketScope::All).await
    }

    /// Append a message to a ticket.
    #[instrument(skip(self, text))]
    pub async fn add_message(
        &self,
        ticket_id: i64,
        author_email: &str,
        kind: MessageKind,
        text: &str,
    ) -> Result<Message> {
        let id = sqlx::query(
            r#"
            INSERT INTO messages (ticket_id, author_email, kind, text)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(ticket_id)
        .bind(author_email)
        .bind(kind.to_string())
        .bind(text)
        .execute(&self.pool)
        .await
        .context("Failed to insert message")?
        .last_insert_rowid();

        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, created_at, ticket_id, author_email, kind, text
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch message after creation")?;

        Ok(message)
    }

    /// Messages of a ticket, oldest first.
    #[instrument(skip(self))]
    pub async fn messages(&self, ticket_id: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, created_at, ticket_id, author_email, kind, text
            FROM messages
            WHERE ticket_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list messages")?;

        Ok(messages)
    }
}
