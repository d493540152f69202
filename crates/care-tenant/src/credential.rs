//! Credential verification
//!
//! Callers present an opaque HS256 JWT. The signing secret is supplied by the
//! deployment; there is deliberately no built-in default, and startup fails
//! without one.

use care_common::{CoreError, CoreResult, Role, TenantId, UserId};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Minimum accepted signing-secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Environment variable holding the signing secret
pub const SECRET_ENV: &str = "CARE_JWT_SECRET";

/// Guard configuration
#[derive(Debug, Clone)]
pub struct GuardConfig {
    signing_secret: String,
}

impl GuardConfig {
    /// Build a config from an explicit secret
    pub fn new(signing_secret: impl Into<String>) -> CoreResult<Self> {
        let signing_secret = signing_secret.into();
        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(CoreError::Config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self { signing_secret })
    }

    /// Read the secret from `CARE_JWT_SECRET`, refusing to start without it
    pub fn from_env() -> CoreResult<Self> {
        let secret = std::env::var(SECRET_ENV).map_err(|_| {
            CoreError::Config(format!(
                "{SECRET_ENV} is not set; refusing to start with a built-in signing key"
            ))
        })?;
        Self::new(secret)
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.signing_secret.as_bytes()
    }
}

/// Claims carried by a platform credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user
    pub sub: UserId,
    /// Home tenant
    pub tid: TenantId,
    /// Platform role
    pub role: Role,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Verifies and (for the session collaborator and tests) issues credentials
pub struct CredentialVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    /// Build a verifier from guard config
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret()),
            decoding: DecodingKey::from_secret(config.secret()),
            validation: Validation::default(),
        }
    }

    /// Verify a credential and return its claims
    pub fn verify(&self, credential: &str) -> CoreResult<Claims> {
        decode::<Claims>(credential, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "credential rejected");
                CoreError::Authentication
            })
    }

    /// Issue a credential valid for `ttl`
    pub fn issue(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        role: Role,
        ttl: Duration,
    ) -> CoreResult<String> {
        let claims = Claims {
            sub: user_id,
            tid: tenant_id,
            role,
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| CoreError::Internal(err.to_string()))
    }
}
