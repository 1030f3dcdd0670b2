//! Bearer token verification
//!
//! Tokens are JWTs whose subject is the user id. Issuance happens elsewhere;
//! this service only verifies.

use common::settings::AuthSettings;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Issuer expected on every access token
pub const TOKEN_ISSUER: &str = "tubely-access";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Auth configuration error: {0}")]
    Configuration(String),
}

/// Resolves a credential to the requesting user's id
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issuer
    pub iss: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Verifies HS256 (shared secret) or RS256 (public key) tokens
#[derive(Clone)]
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn from_secret(secret: &str) -> Self {
        Self::new(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    pub fn from_rsa_pem(public_key: &str) -> Result<Self, AuthError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("Invalid RSA public key: {}", e)))?;
        Ok(Self::new(decoding_key, Algorithm::RS256))
    }

    /// Build from settings
    ///
    /// `jwt_public_key` may be PEM text or a path to a PEM file.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AuthError> {
        match (&settings.jwt_secret, &settings.jwt_public_key) {
            (Some(secret), None) => Ok(Self::from_secret(secret)),
            (None, Some(public_key)) => {
                let pem = if public_key.starts_with("-----BEGIN") {
                    public_key.clone()
                } else {
                    std::fs::read_to_string(public_key)
                        .map_err(|e| {
                            AuthError::Configuration(format!("Failed to read public key file: {}", e))
                        })?
                        .trim()
                        .to_string()
                };
                Self::from_rsa_pem(&pem)
            }
            _ => Err(AuthError::Configuration(
                "exactly one of jwt_secret or jwt_public_key must be set".to_string(),
            )),
        }
    }

    fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            decoding_key,
            validation,
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims.sub)
    }
}
