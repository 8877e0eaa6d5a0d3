//! JWT identity token handling
//!
//! Callers are authenticated upstream; this module only decodes the bearer
//! token into an [`Identity`]. Token creation exists for tooling and tests.

use crate::config::JwtConfig;
use crate::domain::{Identity, Role};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AUDIENCE: &str = "fleetops";

/// Identity token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (identity ID)
    pub sub: String,
    pub role: Role,
    /// Organization reference; absent for owners and unscoped admins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl IdentityClaims {
    pub fn identity(&self) -> Result<Identity> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| {
            AppError::AuthenticationRequired("Token subject is not a valid id".to_string())
        })?;
        let organization_id = self
            .org_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| {
                AppError::AuthenticationRequired("Token organization is not a valid id".to_string())
            })?;

        Ok(Identity::new(id, self.role, organization_id))
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

    /// Validation with a 5 second leeway instead of the default 60 seconds.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v
    }

    pub fn create_identity_token(&self, identity: &Identity) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_ttl_secs);

        let claims = IdentityClaims {
            sub: identity.id.to_string(),
            role: identity.role,
            org_id: identity.organization_id.map(|id| id.to_string()),
            iss: self.config.issuer.clone(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify and decode an identity token
    pub fn verify_identity_token(&self, token: &str) -> Result<IdentityClaims> {
        let mut validation = self.strict_validation();
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<IdentityClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Identity token rejected");
                AppError::AuthenticationRequired("Invalid or expired token".to_string())
            })
    }
}
