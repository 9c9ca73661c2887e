//! HTTP interface for csvd.
//!
//! | Route            | Method     | Behavior                                  |
//! |------------------|------------|-------------------------------------------|
//! | `/frame`         | POST       | store body under a generated name (201)   |
//! | `/tables/:name`  | POST, PUT  | create (201) or replace (200)             |
//! | `/tables/:name`  | GET        | table as CSV, 404 if never written        |
//! | `/tables/:name`  | DELETE     | remove (204), 404 if absent               |
//! | `/tables`        | GET        | JSON array of table names                 |
//! | `/health`        | GET        | JSON store summary                        |
//!
//! Request and response tables are CSV text; see [`csvd_core::codec`].

mod error;
mod handlers;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;

use csvd_core::TableStore;

use crate::config::ServerConfig;

pub use error::ApiError;
pub use handlers::HealthResponse;

/// Tunables for the HTTP layer.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Log every request at info level.
    pub request_logging: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        ServerConfig::default().into()
    }
}

impl From<&ServerConfig> for HttpOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes(),
            request_logging: config.request_logging,
        }
    }
}

impl From<ServerConfig> for HttpOptions {
    fn from(config: ServerConfig) -> Self {
        Self::from(&config)
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<TableStore>,
    pub(crate) options: Arc<HttpOptions>,
}

/// Builds the router over `store`.
pub fn router(store: Arc<TableStore>, options: HttpOptions) -> Router {
    let body_limit = options.max_body_bytes;
    let state = AppState {
        store,
        options: Arc::new(options),
    };

    Router::new()
        .route("/frame", post(handlers::create_frame))
        .route("/tables", get(handlers::list_tables))
        .route(
            "/tables/:name",
            get(handlers::get_table)
                .post(handlers::put_table)
                .put(handlers::put_table)
                .delete(handlers::delete_table),
        )
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::log_request,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// HTTP server for a table store.
pub struct HttpServer {
    store: Arc<TableStore>,
    addr: SocketAddr,
    options: HttpOptions,
}

impl HttpServer {
    /// Creates a server for `store` that will listen on `addr`.
    pub fn new(store: Arc<TableStore>, addr: SocketAddr) -> Self {
        Self {
            store,
            addr,
            options: HttpOptions::default(),
        }
    }

    /// Replaces the HTTP options.
    pub fn with_options(mut self, options: HttpOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the listener without serving yet.
    ///
    /// Binding to port 0 picks a free port; read it back with
    /// [`BoundServer::local_addr`].
    pub async fn bind(self) -> io::Result<BoundServer> {
        let listener = TcpListener::bind(self.addr).await?;
        Ok(BoundServer {
            listener,
            router: router(self.store, self.options),
        })
    }

    /// Binds and serves until the process exits.
    pub async fn serve(self) -> io::Result<()> {
        self.bind().await?.serve().await
    }

    /// Binds and serves until `signal` resolves, then drains in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.bind().await?.serve_with_shutdown(signal).await
    }
}

/// A server whose listener is bound.
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
}

impl BoundServer {
    /// Returns the address actually bound.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until the process exits.
    pub async fn serve(self) -> io::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await
    }

    /// Serves until `signal` resolves, then drains in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
