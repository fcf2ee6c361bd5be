//! HTTP server for the prediction service.
//!
//! The model is loaded once by [`PredictionServer::from_config`] and
//! shared read-only with every handler through router state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{self, AppState};
use crate::config::ServiceConfig;
use crate::models::{load_model, ArtifactSource, SpamModel, StartupError};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the service router.
pub fn router(model: Arc<SpamModel>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { model })
}

/// Prediction service with its model already loaded.
#[derive(Debug)]
pub struct PredictionServer {
    model: Arc<SpamModel>,
    config: ServiceConfig,
}

impl PredictionServer {
    pub fn new(model: SpamModel, config: ServiceConfig) -> Self {
        Self { model: Arc::new(model), config }
    }

    /// Run the startup lifecycle: acquire the key, decrypt, load, re-encrypt.
    ///
    /// Nothing is bound until this succeeds.
    pub fn from_config(config: ServiceConfig) -> Result<Self, StartupError> {
        let source = ArtifactSource::from_mode(config.artifact_mode, &config.key_env)?;
        info!(
            mode = source.mode().as_str(),
            model = %config.model_path.display(),
            vectorizer = %config.vectorizer_path.display(),
            "Preparing artifacts"
        );
        let model = load_model(&config.artifact_paths(), &source)?;
        info!(
            classes = model.classes().len(),
            n_features = model.n_features(),
            "Model ready"
        );
        Ok(Self::new(model, config))
    }

    pub fn model(&self) -> &Arc<SpamModel> {
        &self.model
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        router(Arc::clone(&self.model), self.config.max_body_bytes)
    }

    /// Bind the configured address and serve until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        info!(%addr, "Prediction service listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Prediction service stopped");
        Ok(())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
