/*!
 * HTTP endpoint layer
 *
 * Exposes the three KMS callbacks the platform under test calls:
 *
 * - `POST /kms/decrypt` decrypts with the node's encryption key
 * - `POST /kms/sign` signs with the node's signing key
 * - `POST /kms/master/sign` signs with the node's signing master key
 *
 * Every failure answers HTTP 500 with `{"error":{"code":..,"message":..}}`.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::KmsConfig;
use crate::error::{error_codes, KmsError, KmsResult};
use crate::events::KmsEvents;
use crate::kms::MockKms;

pub mod handlers;


pub use handlers::{resolve_sign_node_id, PLACEHOLDER_RP_NODE_ID, PLACEHOLDER_SUBSTITUTE_NODE_ID};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub kms: Arc<MockKms>,
    pub events: Arc<KmsEvents>,
}

/// Build the KMS router over shared state
pub fn router(kms: Arc<MockKms>, events: Arc<KmsEvents>) -> Router {
    Router::new()
        .route("/kms/decrypt", post(handlers::decrypt))
        .route("/kms/sign", post(handlers::sign))
        .route("/kms/master/sign", post(handlers::master_sign))
        .with_state(AppState { kms, events })
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: u32,
    message: String,
}

impl IntoResponse for KmsError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.user_friendly_message(),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// A running KMS listener
///
/// Returned by [`KmsServer::start`]; keep it alive for as long as the
/// endpoints should answer and call [`KmsServer::stop`] to shut down.
pub struct KmsServer {
    local_addr: SocketAddr,
    kms: Arc<MockKms>,
    events: Arc<KmsEvents>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl KmsServer {
    /// Load keys as configured and start listening.
    pub async fn start(config: &KmsConfig) -> KmsResult<Self> {
        config.validate()?;
        let kms = Arc::new(MockKms::load(config)?);
        Self::start_with(kms, Arc::new(KmsEvents::new()), config).await
    }

    /// Start listening over an already built service and event registry.
    pub async fn start_with(
        kms: Arc<MockKms>,
        events: Arc<KmsEvents>,
        config: &KmsConfig,
    ) -> KmsResult<Self> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            KmsError::server_error(
                "bind",
                &format!("Failed to bind {}: {}", addr, e),
                error_codes::BIND_FAILED,
            )
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            KmsError::server_error("bind", &e.to_string(), error_codes::BIND_FAILED)
        })?;

        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let app = router(Arc::clone(&kms), Arc::clone(&events));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.notified().await })
                .await
        });

        log::info!(
            "Mock KMS listening on {} with {} nodes",
            local_addr,
            kms.node_ids().len()
        );

        Ok(Self {
            local_addr,
            kms,
            events,
            shutdown,
            handle,
        })
    }

    /// Address actually bound; differs from the configured one when port 0 was requested
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn kms(&self) -> Arc<MockKms> {
        Arc::clone(&self.kms)
    }

    pub fn events(&self) -> Arc<KmsEvents> {
        Arc::clone(&self.events)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn stop(self) -> KmsResult<()> {
        // notify_one stores a permit, so a stop before the server polls still lands
        self.shutdown.notify_one();
        match self.handle.await {
            Ok(Ok(())) => {
                log::info!("Mock KMS on {} stopped", self.local_addr);
                Ok(())
            }
            Ok(Err(e)) => Err(KmsError::server_error(
                "serve",
                &e.to_string(),
                error_codes::SERVE_FAILED,
            )),
            Err(e) => Err(KmsError::server_error(
                "shutdown",
                &e.to_string(),
                error_codes::SHUTDOWN_FAILED,
            )),
        }
    }
}
