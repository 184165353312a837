//! User service for business logic.

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{info, instrument};

use super::models::{CreateUserRequest, User};
use super::repository::UserRepository;
use crate::auth::{CredentialVerifier, Identity};

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Checked against on unknown emails so a miss costs as much as a hit.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("helpdesk-dummy-password").ok());

/// Service for user management operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Create a new user with validation.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if !is_valid_email(&request.email) {
            bail!("Invalid email format.");
        }

        if request.username.trim().is_empty() {
            bail!("Invalid username: must not be empty.");
        }

        if request.password.chars().count() < MIN_PASSWORD_LEN {
            bail!(
                "Invalid password: must be at least {} characters.",
                MIN_PASSWORD_LEN
            );
        }

        if !self.repo.is_email_available(&request.email).await? {
            bail!("User with email '{}' already exists.", request.email);
        }

        let mut processed_request = request;
        processed_request.username = processed_request.username.trim().to_string();
        processed_request.password = hash_password(&processed_request.password)?;

        let user = self.repo.create(&processed_request).await?;
        info!(
            user_id = user.id,
            role = %user.identity().role(),
            "Created new user"
        );

        Ok(user)
    }

    /// Number of registered users.
    pub async fn count_users(&self) -> Result<i64> {
        self.repo.count().await
    }

    /// Verify user credentials.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = self.repo.get_by_email(email).await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash)? => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                if let Some(hash) = DUMMY_PASSWORD_HASH.as_deref() {
                    let _ = verify_password(password, hash);
                }
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CredentialVerifier for UserService {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>> {
        Ok(self
            .verify_credentials(email, password)
            .await?
            .map(|user| user.identity()))
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Hash a password using bcrypt.
fn hash_password(password: &str) -> Result<String> {
    // Use a lower cost factor for development speed
    let cost = if cfg!(debug_assertions) { 4 } else { 10 };
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a bcrypt hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn service() -> (Database, UserService) {
        let db = Database::in_memory().await.unwrap();
        let service = UserService::new(UserRepository::new(db.pool().clone()));
        (db, service)
    }

    fn request(email: &str, password: &str, username: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            username: username.to_string(),
            is_staff: false,
            is_superuser: false,
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@localhost"));
        assert!(!is_valid_email("alice@example."));
        assert!(!is_valid_email("alice@@example.com"));
        assert!(!is_valid_email("alice @example.com"));
    }

    #[test]
    fn test_unknown_email_hash_is_usable() {
        let hash = DUMMY_PASSWORD_HASH
            .as_deref()
            .expect("dummy hash should be computed");
        assert!(hash.starts_with("$2"));
        assert!(!verify_password("password123", hash).unwrap());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (_db, service) = service().await;

        let cases = [
            request("not-an-email", "password123", "alice"),
            request("alice@example.com", "short", "alice"),
            request("alice@example.com", "password123", "   "),
        ];
        for case in cases {
            let err = service.create_user(case).await.unwrap_err();
            assert!(err.to_string().starts_with("Invalid"), "{err}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let (_db, service) = service().await;

        service
            .create_user(request("alice@example.com", "password123", "alice"))
            .await
            .unwrap();
        let err = service
            .create_user(request("alice@example.com", "password456", "alice2"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let (_db, service) = service().await;
        let mut staff = request("sam@example.com", "password123", "sam");
        staff.is_staff = true;
        service.create_user(staff).await.unwrap();

        let identity = service
            .verify("sam@example.com", "password123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.username, "sam");
        assert!(identity.is_staff);
        assert!(!identity.is_superuser);

        assert!(
            service
                .verify("sam@example.com", "wrong-password")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            service
                .verify("nobody@example.com", "password123")
                .await
                .unwrap()
                .is_none()
        );
    }
}
