use crate::core::rate_gate::RateGate;
use crate::domain::model::TransportErrorKind;
use crate::domain::ports::{CallKind, CardTransport, ConfigProvider, RemoteCall};
use crate::utils::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.scryfall.com";
pub const DEFAULT_USER_AGENT: &str = "MTGCardBot/2.0";

/// HTTP transport for the Scryfall API, paced by a shared [`RateGate`].
pub struct ScryfallTransport {
    client: Client,
    base_url: String,
    gate: Arc<RateGate>,
}

impl ScryfallTransport {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
        gate: Arc<RateGate>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            gate,
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C, gate: Arc<RateGate>) -> Result<Self> {
        Self::new(
            config.base_url(),
            config.user_agent(),
            Duration::from_secs_f64(config.request_timeout_secs()),
            gate,
        )
    }

    fn request_url(&self, call: &RemoteCall) -> std::result::Result<Url, TransportErrorKind> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            tracing::error!("Invalid base URL '{}': {}", self.base_url, e);
            TransportErrorKind::NetworkError
        })?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportErrorKind::NetworkError)?;
            segments.pop_if_empty();
            match call.kind {
                CallKind::NamedSearch => {
                    segments.extend(["cards", "search"]);
                }
                CallKind::FuzzySearch => {
                    segments.extend(["cards", "named"]);
                }
                CallKind::Random => {
                    segments.extend(["cards", "random"]);
                }
                CallKind::Rulings => {
                    let id = call.param("id").ok_or(TransportErrorKind::NotFound)?;
                    segments.extend(["cards", id, "rulings"]);
                }
            }
        }

        // rulings 的 id 已經放進路徑
        if call.kind != CallKind::Rulings && !call.params.is_empty() {
            url.query_pairs_mut().extend_pairs(call.params.iter());
        }
        Ok(url)
    }
}

fn classify_status(status: StatusCode) -> TransportErrorKind {
    match status {
        StatusCode::NOT_FOUND => TransportErrorKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => TransportErrorKind::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => TransportErrorKind::BadRequest,
        _ => TransportErrorKind::ServerError,
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_decode() {
        TransportErrorKind::InvalidResponse
    } else {
        TransportErrorKind::NetworkError
    }
}

async fn fetch(client: Client, url: Url) -> std::result::Result<serde_json::Value, TransportErrorKind> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        tracing::warn!("Request to {} failed: {}", url.path(), e);
        classify_reqwest_error(&e)
    })?;

    let status = response.status();
    if !status.is_success() {
        // 錯誤內容只記錄，不外傳
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "remote call rejected");
        return Err(classify_status(status));
    }

    response.json::<serde_json::Value>().await.map_err(|e| {
        tracing::warn!("Could not read response from {}: {}", url.path(), e);
        if e.is_timeout() {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::InvalidResponse
        }
    })
}

#[async_trait::async_trait]
impl CardTransport for ScryfallTransport {
    async fn perform(
        &self,
        call: &RemoteCall,
    ) -> std::result::Result<serde_json::Value, TransportErrorKind> {
        let url = self.request_url(call)?;

        self.gate.admit().await;
        tracing::debug!(kind = ?call.kind, path = url.path(), "Making API request");

        // 已送出的請求在自己的 task 上跑完，呼叫端被取消也不會中斷
        let started = std::time::Instant::now();
        let result = tokio::spawn(fetch(self.client.clone(), url))
            .await
            .map_err(|e| {
                tracing::error!("Remote call task failed: {}", e);
                TransportErrorKind::NetworkError
            })?;

        match &result {
            Ok(_) => tracing::debug!(
                kind = ?call.kind,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "API request successful"
            ),
            Err(kind) => tracing::warn!(kind = ?call.kind, error = %kind, "API request failed"),
        }
        result
    }
}
