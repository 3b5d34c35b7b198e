use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use hue::command::Command;

use crate::config::BridgeServer;
use crate::error::{ApiError, ApiResult};

pub type EventStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// HTTP access to the CLIP v2 api of one bridge
pub struct BridgeClient {
    name: String,
    base_url: Url,
    http: reqwest::Client,
    stream_http: reqwest::Client,
}

impl BridgeClient {
    const APPLICATION_KEY_HEADER: &'static str = "hue-application-key";
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn new(name: &str, server: &BridgeServer) -> ApiResult<Self> {
        let base_url = server.base_url().ok_or_else(|| {
            ApiError::service_error(format!("[{name}] Invalid bridge address {:?}", server.address))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            Self::APPLICATION_KEY_HEADER,
            HeaderValue::from_str(&server.username)?,
        );

        let insecure = server.tls_verify_disabled();

        let http = reqwest::Client::builder()
            .default_headers(headers.clone())
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
            .build()?;

        /* the event stream is long-lived, so no overall request timeout */
        let stream_http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(insecure)
            .connect_timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            name: name.to_string(),
            base_url,
            http,
            stream_http,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn endpoint_url(&self, endpoint: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        action: &str,
    ) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let status = if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            format!("{status} (verify the configured username)")
        } else if body.is_empty() {
            format!("{status}")
        } else {
            format!("{status}: {body}")
        };

        Err(ApiError::BridgeStatus {
            bridge: self.name.clone(),
            action: action.to_string(),
            status,
        })
    }

    /// Fetch the full resource list, `{"data": [...]}`
    pub async fn get_resources(&self) -> ApiResult<Value> {
        let url = self.endpoint_url("/clip/v2/resource")?;
        let response = self.http.get(url).send().await?;
        let response = self
            .check_status(response, "GET /clip/v2/resource")
            .await?;
        Ok(response.json().await?)
    }

    pub async fn put(&self, cmd: &Command) -> ApiResult<()> {
        let path = format!("/clip/v2/resource/{}", cmd.target.path());
        let url = self.endpoint_url(&path)?;

        log::debug!("[{}] PUT {path} {}", self.name, cmd.body);

        let response = self.http.put(url).json(&cmd.body).send().await?;
        self.check_status(response, &format!("PUT {path}")).await?;
        Ok(())
    }

    /// Send commands one by one, waiting `pacing` between them.
    pub async fn put_all(&self, cmds: &[Command], pacing: Duration) -> ApiResult<()> {
        for (idx, cmd) in cmds.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(pacing).await;
            }
            self.put(cmd).await?;
        }
        Ok(())
    }

    /// Open the event stream. The stream yields raw `text/event-stream`
    /// chunks; see [`crate::bridge::SseDecoder`].
    pub async fn event_stream(&self) -> ApiResult<EventStream> {
        let url = self.endpoint_url("/eventstream/clip/v2")?;
        let response = self
            .stream_http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = self
            .check_status(response, "GET /eventstream/clip/v2")
            .await?;
        Ok(response.bytes_stream().boxed())
    }
}
