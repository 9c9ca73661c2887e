//! Client connection management.
//!
//! Provides the main `Client` struct for talking to a csvd server over HTTP.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

use csvd_core::codec::{self, CSV_CONTENT_TYPE};
use csvd_core::{PutOutcome, Table, TableName};

use super::error::{ClientError, ClientResult};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// User agent sent with every request.
    pub application_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3737,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            application_name: concat!("csvd-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Returns the base URL, e.g. `http://localhost:3737`.
    pub fn base_url(&self) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    /// `"ok"` when the server answers.
    pub status: String,
    /// Number of committed tables.
    pub tables: usize,
    /// Rows across all tables.
    pub rows: usize,
    /// Seconds since the server's store was opened.
    pub uptime_secs: u64,
    /// Server version.
    pub version: String,
}

/// Client statistics.
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Requests that got a response.
    pub requests: u64,
    /// Requests answered with a non-success status or not answered at all.
    pub failed_requests: u64,
    /// Request body bytes sent.
    pub bytes_sent: u64,
    /// Response body bytes received.
    pub bytes_received: u64,
    /// Total time spent in requests.
    pub total_request_time_ms: u64,
}

/// A csvd client.
///
/// Cheap to share between tasks: the underlying connection pool is
/// reference counted and all methods take `&self`.
pub struct Client {
    config: ClientConfig,
    base_url: String,
    http: reqwest::Client,
    stats: RwLock<ClientStats>,
}

impl Client {
    /// Creates a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.host.is_empty() {
            return Err(ClientError::InvalidConfig("host is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.application_name.clone())
            .build()?;

        Ok(Self {
            base_url: config.base_url(),
            config,
            http,
            stats: RwLock::new(ClientStats::default()),
        })
    }

    /// Creates a new client with default configuration.
    pub fn connect_default() -> ClientResult<Self> {
        Self::new(ClientConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns client statistics.
    pub fn stats(&self) -> ClientStats {
        self.stats.read().clone()
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Uploads a table under a server-generated name and returns the name.
    pub async fn upload_frame(&self, table: &Table) -> ClientResult<TableName> {
        let body = encode(table)?;
        let name = self.upload_frame_csv(body).await?;
        TableName::new(name.as_str())
            .map_err(|e| ClientError::UnexpectedResponse(format!("generated name: {}", e)))
    }

    /// Uploads raw CSV under a server-generated name and returns the name.
    pub async fn upload_frame_csv(&self, body: Vec<u8>) -> ClientResult<String> {
        let url = format!("{}/frame", self.base_url);
        let sent = body.len();
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
            .body(body);

        let response = self.send(request, sent, None).await?;
        let text = self.read_text(response).await?;
        Ok(text.trim().to_string())
    }

    /// Creates or replaces the table stored under `name`.
    pub async fn write_table(&self, name: &str, table: &Table) -> ClientResult<PutOutcome> {
        self.write_csv(name, encode(table)?).await
    }

    /// Creates or replaces `name` from raw CSV.
    pub async fn write_csv(&self, name: &str, body: Vec<u8>) -> ClientResult<PutOutcome> {
        let url = self.table_url(name);
        let sent = body.len();
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
            .body(body);

        let response = self.send(request, sent, Some(name)).await?;
        let outcome = match response.status() {
            StatusCode::CREATED => PutOutcome::Created,
            _ => PutOutcome::Replaced,
        };
        self.read_text(response).await?;
        Ok(outcome)
    }

    /// Fetches and decodes the table stored under `name`.
    pub async fn read_table(&self, name: &str) -> ClientResult<Table> {
        let body = self.read_csv(name).await?;
        Ok(codec::decode(&body)?)
    }

    /// Fetches the CSV body stored under `name`.
    pub async fn read_csv(&self, name: &str) -> ClientResult<Vec<u8>> {
        let request = self.http.get(self.table_url(name));
        let response = self.send(request, 0, Some(name)).await?;
        let bytes = response.bytes().await?;
        self.stats.write().bytes_received += bytes.len() as u64;
        Ok(bytes.to_vec())
    }

    /// Removes the table stored under `name`.
    pub async fn delete_table(&self, name: &str) -> ClientResult<()> {
        let request = self.http.delete(self.table_url(name));
        self.send(request, 0, Some(name)).await?;
        Ok(())
    }

    /// Lists committed table names, sorted.
    pub async fn list_tables(&self) -> ClientResult<Vec<String>> {
        let request = self.http.get(format!("{}/tables", self.base_url));
        let response = self.send(request, 0, None).await?;
        Ok(response.json().await?)
    }

    /// Fetches the server's health summary.
    pub async fn health(&self) -> ClientResult<Health> {
        let request = self.http.get(format!("{}/health", self.base_url));
        let response = self.send(request, 0, None).await?;
        Ok(response.json().await?)
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn table_url(&self, name: &str) -> String {
        format!("{}/tables/{}", self.base_url, name)
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        sent: usize,
        name: Option<&str>,
    ) -> ClientResult<Response> {
        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed();

        {
            let mut stats = self.stats.write();
            stats.total_request_time_ms += elapsed.as_millis() as u64;
            if result.is_ok() {
                stats.requests += 1;
                stats.bytes_sent += sent as u64;
            } else {
                stats.failed_requests += 1;
            }
        }

        let response = result?;
        if response.status().is_success() {
            return Ok(response);
        }

        self.stats.write().failed_requests += 1;
        Err(self.error_for(response, name).await)
    }

    async fn read_text(&self, response: Response) -> ClientResult<String> {
        let text = response.text().await?;
        self.stats.write().bytes_received += text.len() as u64;
        Ok(text)
    }

    async fn error_for(&self, response: Response, name: Option<&str>) -> ClientError {
        let status = response.status();
        let message = response
            .text()
            .await
            .map(|t| t.trim_end().to_string())
            .unwrap_or_default();

        tracing::debug!(status = status.as_u16(), %message, "request failed");

        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound {
                name: name.unwrap_or_default().to_string(),
            },
            StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
            StatusCode::PAYLOAD_TOO_LARGE => ClientError::PayloadTooLarge(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn encode(table: &Table) -> ClientResult<Vec<u8>> {
    codec::encode(table).map_err(|e| ClientError::Encode(e.to_string()))
}
