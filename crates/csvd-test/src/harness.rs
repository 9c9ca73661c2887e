use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use csvd_client::{Client, ClientConfig, ClientResult};
use csvd_core::TableStore;
use csvd_server::http::{HttpOptions, HttpServer};

/// A csvd server running on `127.0.0.1` with an OS-assigned port.
///
/// Dropping the handle aborts the server; [`TestServer::shutdown`] stops it
/// gracefully and waits for in-flight requests.
pub struct TestServer {
    addr: SocketAddr,
    store: Arc<TableStore>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Starts a server over a fresh in-memory store.
    pub async fn start() -> Result<Self> {
        Self::start_with(Arc::new(TableStore::in_memory()), HttpOptions::default()).await
    }

    /// Starts a server over `store` with the given options.
    pub async fn start_with(store: Arc<TableStore>, options: HttpOptions) -> Result<Self> {
        let addr: SocketAddr = "127.0.0.1:0".parse().context("Invalid address")?;
        let bound = HttpServer::new(store.clone(), addr)
            .with_options(options)
            .bind()
            .await
            .context("Failed to bind test server")?;
        let addr = bound.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let signal = async move {
                let _ = rx.await;
            };
            if let Err(e) = bound.serve_with_shutdown(signal).await {
                tracing::error!("test server failed: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Returns the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the store the server writes to.
    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Returns a client pointed at this server.
    pub fn client(&self) -> ClientResult<Client> {
        Client::new(
            ClientConfig::new()
                .host(self.addr.ip().to_string())
                .port(self.addr.port())
                .connect_timeout(Duration::from_secs(5))
                .request_timeout(Duration::from_secs(30)),
        )
    }

    /// Stops accepting connections and waits for the server task to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.context("server task panicked")?;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
