//! Ticket data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum topic length in characters.
pub const MAX_TOPIC_LEN: usize = 20;

/// Ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Pending,
    Unresolved,
    Resolved,
    Canceled,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Unresolved => "unresolved",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TicketStatus::Pending),
            "unresolved" => Ok(TicketStatus::Unresolved),
            "resolved" => Ok(TicketStatus::Resolved),
            "canceled" => Ok(TicketStatus::Canceled),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for TicketStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TicketStatus {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let s = self.to_string();
        <String as sqlx::Encode<sqlx::Sqlite>>::encode(s, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TicketStatus {
    fn decode(
        value: <sqlx::Sqlite as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

/// Who wrote a message: the ticket's requester or support staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Request,
    Response,
}

impl MessageKind {
    /// Kind of a message written by someone with the given staff privilege.
    pub fn for_author(is_staff: bool) -> Self {
        if is_staff {
            MessageKind::Response
        } else {
            MessageKind::Request
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Request => write!(f, "request"),
            MessageKind::Response => write!(f, "response"),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "request" => Ok(MessageKind::Request),
            "response" => Ok(MessageKind::Response),
            _ => Err(format!("Invalid message kind: {}", s)),
        }
    }
}

impl TryFrom<String> for MessageKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Ticket entity from database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub author_email: String,
    pub topic: String,
    pub status: TicketStatus,
}

/// Message attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub created_at: String,
    pub ticket_id: i64,
    pub author_email: String,
    #[sqlx(try_from = "String")]
    pub kind: MessageKind,
    pub text: String,
}

/// Request to open a ticket with its first message.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    pub topic: String,
    pub text: String,
}

/// Request to change a ticket's status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request to add a message to a ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_status_display_and_parse() {
        assert_eq!(TicketStatus::Unresolved.to_string(), "unresolved");
        assert_eq!(
            "RESOLVED".parse::<TicketStatus>().unwrap(),
            TicketStatus::Resolved
        );
        assert!("cancelled".parse::<TicketStatus>().is_err());
        assert!("closed".parse::<TicketStatus>().is_err());
        assert_eq!(TicketStatus::default(), TicketStatus::Pending);
    }

    #[test]
    fn test_message_kind_for_author() {
        assert_eq!(MessageKind::for_author(true), MessageKind::Response);
        assert_eq!(MessageKind::for_author(false), MessageKind::Request);
        assert_eq!("response".parse::<MessageKind>().unwrap(), MessageKind::Response);
    }

    #[test]
    fn test_ticket_serializes_camel_case() {
        let ticket = Ticket {
            id: 7,
            created_at: "2025-03-01T10:00:00.000Z".to_string(),
            updated_at: "2025-03-01T10:00:00.000Z".to_string(),
            author_email: "alice@example.com".to_string(),
            topic: "Printer".to_string(),
            status: TicketStatus::Pending,
        };

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["authorEmail"], "alice@example.com");
        assert_eq!(json["status"], "pending");
        assert!(json.get("author_email").is_none());
    }
}
