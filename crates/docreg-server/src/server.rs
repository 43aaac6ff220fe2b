use docreg_crypto::SigningKey;
use docreg_registry::{open_local, LocalNode};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::key::load_or_generate;
use crate::router::build_router;
use crate::state::AppState;

/// Document registry HTTP server over a local node.
pub struct DocregServer {
    config: ServerConfig,
    node: LocalNode,
    key: SigningKey,
}

impl DocregServer {
    /// Open the node under `config.data_dir` and load (or create) the
    /// service key.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let node = open_local(&config.data_dir, config.local_options())?;
        let key = load_or_generate(&config.key_path)?;
        Ok(Self { config, node, key })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn node(&self) -> &LocalNode {
        &self.node
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(
            AppState::new(self.node.registry.clone(), self.key.clone()),
            self.config.max_body_bytes,
        )
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let events = tokio::spawn(log_ledger_events(self.node.ledger.subscribe()));

        info!(
            addr = %self.config.bind_addr,
            owner = %self.key.owner_id(),
            data_dir = %self.config.data_dir.display(),
            "docreg server listening"
        );
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        events.abort();
        info!("docreg server stopped");
        served
    }
}

async fn log_ledger_events(
    mut events: tokio::sync::broadcast::Receiver<docreg_ledger::LedgerEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => debug!(event = %event, owner = %event.owner(), "ledger event"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "ledger event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
