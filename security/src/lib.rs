// security/src/lib.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use simrs_models::{HospitalError, Role, UserId};

pub mod roles;
pub mod session;

pub use roles::{Permission, RoleConfig, RolesConfig};
pub use session::Actor;

/// Access tokens authenticate requests; refresh tokens only mint new pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims for JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User id
    pub role: Role,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::Token(format!("subject '{}' is not a user id", self.sub)))
    }

    pub fn actor(&self) -> Result<Actor, AuthError> {
        Ok(Actor::new(self.user_id()?, self.role))
    }
}

/// Response body of a successful login or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Account is inactive")]
    InactiveAccount,
    #[error("Missing bearer credential")]
    MissingCredential,
    #[error("JWT error: {0}")]
    Token(String),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<AuthError> for HospitalError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::PasswordHash(msg) => HospitalError::Internal(msg),
            other => HospitalError::Unauthorized(other.to_string()),
        }
    }
}

/// Hashes a password using Argon2.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(format!("Failed to hash password with Argon2: {}", e)))
}

/// Verifies a password against an Argon2 hash. A mismatch is
/// `InvalidCredentials`; an unparsable hash is a hashing error.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<(), AuthError> {
    let password_hash = PasswordHash::new(hashed_password)
        .map_err(|e| AuthError::PasswordHash(format!("Failed to parse Argon2 password hash: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &password_hash)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => AuthError::InvalidCredentials,
            other => AuthError::PasswordHash(format!("Failed to verify Argon2 password: {}", other)),
        })
}

/// One-time password handed back for administrator-created accounts.
pub fn generate_password() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..12].to_string()
}

/// Signs and validates bearer tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_minutes: i64) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes.max(1)),
        }
    }

    fn sign(&self, user_id: UserId, role: Role, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            kind,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Token(format!("Failed to encode JWT: {}", e)))
    }

    /// Access token plus a refresh token living seven access lifetimes.
    pub fn issue_pair(&self, user_id: UserId, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.sign(user_id, role, TokenKind::Access, self.access_ttl)?,
            refresh: self.sign(user_id, role, TokenKind::Refresh, self.access_ttl * 7)?,
            role,
        })
    }

    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(format!("Failed to decode or validate JWT: {}", e)))?;
        if claims.kind != expected {
            return Err(AuthError::Token(format!("expected {:?} token", expected).to_lowercase()));
        }
        Ok(claims)
    }
}
