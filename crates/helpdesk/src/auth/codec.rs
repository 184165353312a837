//! Signed session token encoding and verification.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{Identity, SessionClaims};

/// Algorithm used when minting tokens.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted when verifying. Anything outside the HMAC family is
/// rejected before the signature is looked at.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Token encode/decode failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The signer rejected the key. Fatal configuration problem.
    #[error("signing error: {0}")]
    Signing(String),

    /// The token could not be parsed.
    #[error("malformed token")]
    Malformed,

    /// The token names a signing method outside the expected family.
    #[error("unexpected signing algorithm")]
    WrongAlgorithm,

    /// Signature verification failed.
    #[error("bad signature")]
    BadSignature,

    /// Signature verified but the token is past its expiry.
    /// The verified claims are carried for the renewal path.
    #[error("token expired")]
    Expired(Box<SessionClaims>),
}

/// A freshly minted token with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The `alg` field of a token header.
#[derive(Deserialize)]
struct HeaderAlgorithm {
    alg: String,
}

/// Algorithm named by the token header, if the header is readable at all.
///
/// Read separately because `jsonwebtoken` fails to parse names it does not
/// know (`none`, typos) and would report them as malformed.
fn header_algorithm(token: &str) -> Option<String> {
    let header = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(header).ok()?;
    serde_json::from_slice::<HeaderAlgorithm>(&bytes)
        .ok()
        .map(|header| header.alg)
}

fn is_accepted_algorithm(name: &str) -> bool {
    name.parse::<Algorithm>()
        .is_ok_and(|alg| ACCEPTED_ALGORITHMS.contains(&alg))
}

/// Encodes identities into signed tokens and verifies them back.
///
/// Holds the process signing key; construct once at startup and share.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec for the given HMAC secret.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing key is empty".to_string()));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Expiry is checked in `decode` so expired claims stay recoverable.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        })
    }

    /// Sign `identity` into a token that expires `ttl` from now.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let expires_at = Utc::now() + ttl;
        let claims = SessionClaims::new(identity.clone(), expires_at);

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Expired tokens with a valid signature fail with
    /// [`TokenError::Expired`] carrying the claims.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        if header_algorithm(token).is_some_and(|alg| !is_accepted_algorithm(&alg)) {
            debug!("Token names an unaccepted algorithm");
            return Err(TokenError::WrongAlgorithm);
        }

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!(error = ?e, "Token verification failed");
                match e.kind() {
                    ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                        TokenError::WrongAlgorithm
                    }
                    ErrorKind::InvalidSignature => TokenError::BadSignature,
                    _ => TokenError::Malformed,
                }
            },
        )?;

        let claims = data.claims;
        if claims.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired(Box::new(claims)));
        }

        Ok(claims)
    }
}
