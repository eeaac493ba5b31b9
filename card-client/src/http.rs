// card-client/src/http.rs
// HTTP 传输层 - 与提交后端通信

use crate::{ClientConfig, ClientError, ClientResult, ConnectionState, ConnectionTracker};
use async_trait::async_trait;
use card_engine::{CardTransport, TransportError};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::ApiResponse;
use shared::{CardData, Commit, CommitRequest};

/// 连接握手请求
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    terminal_id: &'a str,
    user: &'a str,
}

/// HTTP commit backend
///
/// | Method | Path | Body | Response data |
/// |--------|------|------|---------------|
/// | POST | `/api/connect` | `{terminalId, user}` | any |
/// | GET | `/api/cards/{id}` | | `CardData` |
/// | POST | `/api/commits` | `CommitRequest` | `Commit` |
///
/// Every response is an [`ApiResponse`] envelope.
#[derive(Debug)]
pub struct HttpCardTransport {
    client: Client,
    config: ClientConfig,
    connection: ConnectionTracker,
}

impl HttpCardTransport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout_duration())
            .build()?;
        Ok(Self {
            client,
            config,
            connection: ConnectionTracker::default(),
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.get()
    }

    /// Announce this terminal and user to the backend
    pub async fn connect(&self, terminal_id: &str, user: &str) -> ClientResult<()> {
        self.connection.connecting();
        let body = ConnectRequest { terminal_id, user };
        match self.post::<serde_json::Value, _>(&["api", "connect"], &body).await {
            Ok(_) => {
                self.connection.connected(terminal_id, user);
                Ok(())
            }
            Err(e) => {
                self.connection.failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    fn auth_header(&self) -> Option<String> {
        self.config.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Base URL extended with percent-encoded path segments
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.config.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let mut req = self.client.get(self.url(segments)?);
        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let response = req.send().await.inspect_err(|e| self.on_send_error(e))?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let mut req = self.client.post(self.url(segments)?).json(body);
        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let response = req.send().await.inspect_err(|e| self.on_send_error(e))?;
        handle_response(response).await
    }

    fn on_send_error(&self, err: &reqwest::Error) {
        if err.is_connect() || err.is_timeout() {
            self.connection.failed(err.to_string());
        }
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let text = response.text().await?;

    // 尝试解析为统一响应格式
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<T>>(&text) {
        if let Some(err) = envelope.to_error() {
            return Err(err.into());
        }
        return envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing data".into()));
    }

    // 降级到状态码处理
    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
        s if s.is_success() => Err(ClientError::InvalidResponse(text)),
        _ => Err(ClientError::Internal(text)),
    }
}

#[async_trait]
impl CardTransport for HttpCardTransport {
    async fn load_card(&self, card_id: &str) -> Result<CardData, TransportError> {
        tracing::debug!(card_id, "[HttpTransport] load card");
        Ok(self.get(&["api", "cards", card_id]).await?)
    }

    async fn post_commit(&self, request: CommitRequest) -> Result<Commit, TransportError> {
        tracing::debug!(
            card_id = %request.card_id,
            actions = request.actions.len(),
            "[HttpTransport] post commit"
        );
        Ok(self.post(&["api", "commits"], &request).await?)
    }
}
