use super::token::{AccessToken, VideoGrants, SERVICE_TOKEN_TTL};
use super::{ApiCredentials, PlatformError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Convert a signalling URL into the base URL of the HTTP control API.
pub fn http_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct TwirpErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

/// Minimal Twirp/JSON client for the platform's control services
#[derive(Debug, Clone)]
pub(crate) struct TwirpClient {
    http: Client,
    base_url: String,
}

impl TwirpClient {
    pub fn new(url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: http_base_url(url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `/twirp/livekit.{service}/{method}` under a fresh
    /// service token carrying `grants`.
    pub async fn call<Req, Resp>(
        &self,
        credentials: &ApiCredentials,
        grants: VideoGrants,
        service: &str,
        method: &'static str,
        body: &Req,
    ) -> Result<Resp, PlatformError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let token = AccessToken::new(credentials)
            .with_ttl(SERVICE_TOKEN_TTL)
            .with_grants(grants)
            .to_jwt()?;

        let url = format!("{}/twirp/livekit.{}/{}", self.base_url, service, method);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|source| PlatformError::Http { method, source })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<TwirpErrorBody>(&text) {
                Ok(err) if !err.code.is_empty() => (err.code, err.msg),
                _ => (status.as_u16().to_string(), text),
            };
            return Err(PlatformError::Status {
                method,
                code,
                message,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|source| PlatformError::Http { method, source })
    }
}
