//! `GuessboxServer` builder and serve loop.
//!
//! Ties the layers together: an axum listener in front, a shared
//! [`Hub`] of rooms behind it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use guessbox_room::{Catalog, Hub, NoCatalog, RoomConfig};
use tokio::net::TcpListener;

use crate::gateway::{SharedHub, router};
use crate::signal::shutdown_signal;
use crate::GuessboxError;

/// Builder for configuring and starting a guessbox server.
///
/// # Example
///
/// ```rust,no_run
/// use guessbox::prelude::*;
///
/// # async fn start() -> Result<(), GuessboxError> {
/// let server = GuessboxServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GuessboxServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    catalog: Arc<dyn Catalog>,
}

impl GuessboxServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            catalog: Arc::new(NoCatalog),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets where rounds get their reference tracks from.
    pub fn catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Binds the listener and creates the hub.
    pub async fn build(self) -> Result<GuessboxServer, GuessboxError> {
        let hub = Arc::new(Hub::with_catalog(self.room_config, self.catalog)?);
        let listener = TcpListener::bind(&self.bind_addr).await?;
        Ok(GuessboxServer { listener, hub })
    }
}

impl Default for GuessboxServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound guessbox server.
///
/// Call [`run()`](Self::run) to start accepting requests.
pub struct GuessboxServer {
    listener: TcpListener,
    hub: SharedHub,
}

impl GuessboxServer {
    /// Creates a new builder.
    pub fn builder() -> GuessboxServerBuilder {
        GuessboxServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The hub behind the gateway.
    pub fn hub(&self) -> &SharedHub {
        &self.hub
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<(), GuessboxError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, then stops accepting and lets
    /// in-flight requests finish.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), GuessboxError> {
        let addr = self.listener.local_addr()?;
        let config = self.hub.config();
        tracing::info!(
            %addr,
            inbox = ?config.inbox,
            write_timeout = ?config.write_timeout,
            "guessbox server listening"
        );

        axum::serve(self.listener, router(self.hub))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("guessbox server stopped");
        Ok(())
    }
}
