//! Helpdesk ticketing backend library.
//!
//! Users register, log in with a short-lived session cookie and open support
//! tickets. Staff see and transition every ticket; everybody else only their own.

pub mod api;
pub mod auth;
pub mod db;
pub mod policy;
pub mod ticket;
pub mod user;
