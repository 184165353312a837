//! Tickets and their messages.

mod models;
mod repository;
mod service;

pub use models::{
    CreateMessageRequest, CreateTicketRequest, MAX_TOPIC_LEN, Message, MessageKind, Ticket,
    TicketStatus, UpdateStatusRequest,
};
pub use repository::TicketRepository;
pub use service::{TicketError, TicketService};
