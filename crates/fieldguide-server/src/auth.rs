//! Access tokens and password hashing.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Passwords are
//! stored as argon2id PHC strings and never leave the store crate's `User`
//! record.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use fieldguide_store::Role;

use crate::error::{ServerError, ServerResult};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Role at the time the token was issued.
    pub role: Role,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: &str, role: Role, expiry_hours: i64) -> Self {
        let now = Utc::now();
        let expiry = now + Duration::hours(expiry_hours);
        Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Issues and verifies access tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    expiry_hours: i64,
    algorithm: Algorithm,
}

impl AuthService {
    /// Creates a token service. The secret must be at least 32 bytes.
    pub fn new(secret: String, expiry_hours: i64) -> ServerResult<Self> {
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }
        Ok(AuthService {
            secret,
            expiry_hours,
            algorithm: Algorithm::HS256,
        })
    }

    pub fn generate_token(&self, user_id: &str, role: Role) -> ServerResult<String> {
        let claims = Claims::new(user_id, role, self.expiry_hours);
        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| ServerError::InternalError(format!("Failed to sign token: {}", err)))
    }

    /// Decodes and validates a token, including its expiry (with one minute
    /// of clock leeway).
    pub fn verify_token(&self, token: &str) -> ServerResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 60;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ServerError::Unauthorized("Invalid token".to_string()))
    }
}

/// Hashes a password into an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServerError::InternalError(format!("Failed to hash password: {}", err)))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> ServerResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|err| {
        ServerError::InternalError(format!("Stored password hash is invalid: {}", err))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
