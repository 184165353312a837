//! User management module.
//!
//! Registration, lookup and bcrypt credential verification.

mod models;
mod repository;
mod service;

pub use models::{CreateUserRequest, User, UserInfo};
pub use repository::UserRepository;
pub use service::{MIN_PASSWORD_LEN, UserService, is_valid_email};
