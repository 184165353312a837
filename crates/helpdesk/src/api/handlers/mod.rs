//! HTTP handlers.

mod auth;
mod misc;
mod tickets;
mod users;

pub use auth::{login, logout, refresh};
pub use misc::{health, time};
pub use tickets::{
    create_message, create_ticket, get_ticket, list_messages, list_tickets, update_ticket_status,
};
pub use users::{me, register};
