//! JWT access token handling
//!
//! Tokens are minted by the platform's identity provider; this service only
//! verifies them. `create_access_token` exists for local tooling and tests.

use crate::config::JwtConfig;
use crate::domain::Identity;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile metadata carried inside the access token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iss: String,
    pub aud: String,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// Convert verified claims into the identity the tenant resolver works on.
    ///
    /// A malformed metadata tenant id is dropped rather than rejected; the
    /// subject must be a UUID.
    pub fn identity(&self) -> Result<Identity> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        let identity = Identity::new(user_id);
        Ok(
            match self
                .user_metadata
                .tenant_id
                .as_deref()
                .and_then(|raw| Uuid::parse_str(raw).ok())
            {
                Some(tenant_id) => identity.with_metadata_tenant(tenant_id),
                None => identity,
            },
        )
    }
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create a Validation with a strict leeway (5 seconds) instead of the default 60 seconds.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v
    }

    /// Verify and decode an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let mut validation = self.strict_validation();
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Create an access token valid for one hour
    pub fn create_access_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        metadata_tenant_id: Option<Uuid>,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            user_metadata: UserMetadata {
                tenant_id: metadata_tenant_id.map(|id| id.to_string()),
            },
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
