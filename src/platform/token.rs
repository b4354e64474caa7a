//! Access token claims and signing
//!
//! Tokens are HS256 JWTs signed with the API secret and issued by the API
//! key. The platform validates them when a client joins a room or calls the
//! control API.

use super::{ApiCredentials, PlatformError};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Platform default lifetime for issued tokens
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Lifetime of the short tokens attached to control requests
pub const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

fn is_false(value: &bool) -> bool {
    !*value
}

/// Room permissions carried in the `video` claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrants {
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,

    #[serde(default)]
    pub can_publish: bool,

    #[serde(default)]
    pub can_subscribe: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_record: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub ingress_admin: bool,
}

impl VideoGrants {
    /// Join `room` with publish and subscribe rights.
    ///
    /// Every participant gets the same grant; there are no viewer-only tokens.
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room_join: true,
            room: room.into(),
            can_publish: true,
            can_subscribe: true,
            ..Default::default()
        }
    }

    /// Start and stop egress jobs.
    pub fn recorder() -> Self {
        Self {
            room_record: true,
            ..Default::default()
        }
    }

    /// Create and delete ingress endpoints.
    pub fn ingress_admin() -> Self {
        Self {
            ingress_admin: true,
            ..Default::default()
        }
    }
}

/// JWT claims understood by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// API key
    pub iss: String,

    /// Participant identity
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,

    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub nbf: i64,
    pub exp: i64,

    #[serde(default)]
    pub video: VideoGrants,
}

/// Builder for a signed access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    credentials: ApiCredentials,
    identity: String,
    name: String,
    ttl: Duration,
    grants: VideoGrants,
}

impl AccessToken {
    pub fn new(credentials: &ApiCredentials) -> Self {
        Self {
            credentials: credentials.clone(),
            identity: String::new(),
            name: String::new(),
            ttl: DEFAULT_TOKEN_TTL,
            grants: VideoGrants::default(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_grants(mut self, grants: VideoGrants) -> Self {
        self.grants = grants;
        self
    }

    pub fn claims(&self) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            iss: self.credentials.api_key.clone(),
            sub: self.identity.clone(),
            name: self.name.clone(),
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
            video: self.grants.clone(),
        }
    }

    /// Sign the token with the API secret
    pub fn to_jwt(&self) -> Result<String, PlatformError> {
        let key = EncodingKey::from_secret(self.credentials.api_secret.as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &self.claims(), &key)?)
    }
}

/// Verify a token against the API secret and return its claims.
pub fn verify(token: &str, credentials: &ApiCredentials) -> Result<Claims, PlatformError> {
    let key = DecodingKey::from_secret(credentials.api_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;
    validation.set_issuer(&[credentials.api_key.as_str()]);

    Ok(decode::<Claims>(token, &key, &validation)?.claims)
}

/// Issues participant credentials
pub trait CredentialSigner: Send + Sync {
    fn issue(
        &self,
        credentials: &ApiCredentials,
        identity: &str,
        grants: VideoGrants,
    ) -> Result<String, PlatformError>;
}

/// Signs credentials locally with the API secret
#[derive(Debug, Clone)]
pub struct JwtSigner {
    ttl: Duration,
}

impl JwtSigner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for JwtSigner {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl CredentialSigner for JwtSigner {
    fn issue(
        &self,
        credentials: &ApiCredentials,
        identity: &str,
        grants: VideoGrants,
    ) -> Result<String, PlatformError> {
        AccessToken::new(credentials)
            .with_identity(identity)
            .with_name(identity)
            .with_ttl(self.ttl)
            .with_grants(grants)
            .to_jwt()
    }
}
