//! HTTP client implementation for FHEMWEB
//!
//! Commands are sent as `GET <base>?cmd=<command>&XHR=1&fwcsrf=<token>`.
//! Entity queries use `jsonlist2 <devspec>`. No retry, pooling or caching:
//! every call reflects the server's current state.

use crate::client::{EntityQuery, FhemClient, FhemEntity, FhemResponse};
use crate::config::{FhemCredentials, SkillSettings};
use crate::error::{FhemError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Header FHEMWEB uses to hand out its CSRF token
pub const CSRF_HEADER: &str = "X-FHEM-csrfToken";

#[derive(Debug, Deserialize)]
struct JsonList2Response {
    #[serde(rename = "Results", default)]
    results: Vec<FhemEntity>,
}

/// HTTP client for a FHEM server
pub struct FhemHttpClient {
    /// HTTP client instance
    client: Client,

    /// FHEMWEB endpoint, e.g. `http://fhem.local:8083/fhem`
    base_url: Url,

    /// CSRF token obtained on connect
    csrf_token: Option<String>,
}

impl FhemHttpClient {
    /// Create a new HTTP client from settings
    pub fn new(settings: &SkillSettings) -> Result<Self> {
        let base_url = settings.base_url()?;

        let mut client_builder = ClientBuilder::new()
            .timeout(settings.timeout)
            .user_agent(format!("fhem-voice-rust/{}", env!("CARGO_PKG_VERSION")));

        if let Some(credentials) = FhemCredentials::from_settings(settings) {
            let mut default_headers = reqwest::header::HeaderMap::new();
            let header_value =
                reqwest::header::HeaderValue::from_str(&credentials.basic_auth_header())
                    .map_err(|e| {
                        FhemError::invalid_input(format!("Invalid authorization header: {e}"))
                    })?;
            default_headers.insert(reqwest::header::AUTHORIZATION, header_value);
            client_builder = client_builder.default_headers(default_headers);
        }

        let client = client_builder.build().map_err(|e| {
            FhemError::backend_unavailable(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            csrf_token: None,
        })
    }

    /// Fetch the CSRF token; FHEMWEB rejects commands without it
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to FHEM at {}", self.base_url);

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[("XHR", "1")])
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        self.csrf_token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if self.csrf_token.is_none() {
            warn!("FHEM did not provide a CSRF token, sending commands without one");
        }

        info!("Connected to FHEM");
        Ok(())
    }

    /// CSRF token, if the server issued one
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn transport_error(e: reqwest::Error) -> FhemError {
    if e.is_timeout() {
        FhemError::backend_unavailable(format!("FHEM request timed out: {e}"))
    } else {
        FhemError::backend_unavailable(format!("FHEM request failed: {e}"))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("HTTP error {status}: {body}");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FhemError::authentication(message),
        _ => FhemError::backend_unavailable(message),
    })
}

#[async_trait]
impl FhemClient for FhemHttpClient {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<FhemEntity>> {
        let command = format!("jsonlist2 {}", query.devspec());
        let response = self.send_cmd(&command).await?;

        let list: JsonList2Response = serde_json::from_str(&response.text)?;
        debug!(
            "jsonlist2 {} returned {} entities",
            query.devspec(),
            list.results.len()
        );
        Ok(list.results)
    }

    async fn send_cmd(&self, command: &str) -> Result<FhemResponse> {
        debug!("FHEM command: {command}");

        let mut params = vec![("cmd", command), ("XHR", "1")];
        if let Some(token) = &self.csrf_token {
            params.push(("fwcsrf", token.as_str()));
        }

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        Ok(FhemResponse { status, text })
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(self.base_url.clone())
            .query(&[("XHR", "1")])
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!("FHEM health check failed: {e}");
                Ok(false)
            }
        }
    }
}
