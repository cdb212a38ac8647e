//! # Dashboard & API
//!
//! This crate serves the dhcp dashboard: html pages for managing dnsmasq
//! reservations and the device, a JSON api over the same operations, and
//! endpoints for healthcheck & metrics.
//! It exposes the following endpoints:
//!
//! / (GET, POST)
//! /edit (GET, POST)
//! /remove (POST)
//! /api/hosts (GET, POST)
//! /api/hosts/:mac (PUT, DELETE)
//! /api/logs
//! /api/logs/download
//! /health
//! /ping
//! /metrics
//! /metrics-text
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::cognitive_complexity, clippy::too_many_arguments)]

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use axum::{
    Router,
    extract::{Extension, Request},
    middleware::{self, Next},
    response::Response,
    routing,
};
use dash_core::metrics::IN_FLIGHT;
use host_registry::{HostRegistry, Storage};
use sys_actions::{Actions, CommandRunner};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, trace};

pub use crate::{
    api::LogFile,
    html::Flashes,
    models::{Health, State},
};

mod api;
mod html;
mod views;

/// The task runner for the [`Dashboard`]
///
/// [`Dashboard`]: crate::Dashboard
#[derive(Debug)]
pub struct DashboardGuard {
    task_handle: JoinHandle<()>,
}

impl Drop for DashboardGuard {
    fn drop(&mut self) {
        trace!("DashboardGuard drop called");
        self.task_handle.abort();
    }
}

/// Serves the dashboard over HTTP and tracks the health reported by the rest
/// of the process
#[derive(Debug)]
pub struct Dashboard<S, R> {
    tx: mpsc::Sender<Health>,
    rx: mpsc::Receiver<Health>,
    addr: SocketAddr,
    state: State,
    registry: Arc<HostRegistry<S>>,
    actions: Arc<Actions<R>>,
    flashes: Flashes,
    log_file: LogFile,
}

impl<S, R> Dashboard<S, R>
where
    S: Storage,
    R: CommandRunner,
{
    /// Create a new Dashboard instance
    pub fn new(
        addr: SocketAddr,
        registry: Arc<HostRegistry<S>>,
        actions: Arc<Actions<R>>,
        log_file: impl Into<PathBuf>,
    ) -> Self {
        trace!("creating dashboard");
        let (tx, rx) = mpsc::channel(10);
        let state = models::blank_health();
        Self {
            tx,
            rx,
            addr,
            state,
            registry,
            actions,
            flashes: Flashes::default(),
            log_file: LogFile(log_file.into()),
        }
    }

    /// clone the health sender channel
    pub fn sender(&self) -> mpsc::Sender<Health> {
        self.tx.clone()
    }

    /// Set the health
    pub fn set_health(&self, health: Health) {
        *self.state.lock() = health;
    }

    /// Every route, with the shared state attached
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/",
                routing::get(html::index::<S, R>).post(html::submit::<S, R>),
            )
            .route(
                "/edit",
                routing::get(html::edit_page::<S>).post(html::edit_submit::<S, R>),
            )
            .route("/remove", routing::post(html::remove::<S, R>))
            .route("/dashboard.css", routing::get(handlers::stylesheet))
            .route(
                "/api/hosts",
                routing::get(api::list_hosts::<S>).post(api::add_host::<S, R>),
            )
            .route(
                "/api/hosts/:mac",
                routing::put(api::update_host::<S, R>).delete(api::delete_host::<S, R>),
            )
            .route("/api/logs", routing::get(api::logs))
            .route("/api/logs/download", routing::get(api::download_logs))
            .route("/health", routing::get(handlers::ok))
            .route("/ping", routing::get(handlers::ping))
            .route("/metrics", routing::get(handlers::metrics))
            .route("/metrics-text", routing::get(handlers::metrics_text))
            .layer(Extension(self.state.clone()))
            .layer(Extension(self.registry.clone()))
            .layer(Extension(self.actions.clone()))
            .layer(Extension(self.flashes.clone()))
            .layer(Extension(self.log_file.clone()))
            .layer(middleware::from_fn(track_in_flight))
            .layer(TraceLayer::new_for_http())
    }

    /// Listen to Health changes over the channel
    async fn listen_status(&mut self, token: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("listen health exited-- shutting down");
                    return Ok(());
                }
                health = self.rx.recv() => match health {
                    Some(health) => {
                        let mut guard = self.state.lock();
                        if *guard != health {
                            info!(%health, "health changed");
                            *guard = health;
                        }
                    }
                    None => {
                        info!("listen health exited-- nothing listening");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// serve the dashboard until `token` is cancelled
    async fn run(addr: SocketAddr, app: Router, token: CancellationToken) -> Result<()> {
        let tcp = TcpListener::bind(&addr).await?;
        info!(%addr, "dashboard listening");

        axum::serve(tcp, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;
        debug!("dashboard stopped");
        Ok(())
    }

    /// Kick off the HTTP service and start listening on the health channel.
    /// Both stop once `token` is cancelled.
    pub fn start(mut self, token: CancellationToken) -> JoinHandle<()> {
        let app = self.router();
        let addr = self.addr;

        tokio::spawn(async move {
            if let Err(err) = tokio::try_join!(
                Self::run(addr, app, token.clone()),
                self.listen_status(token)
            ) {
                error!(?err, "dashboard task returning with error")
            }
        })
    }

    /// Start the `Dashboard`, it is stopped when the guard drops
    pub fn serve(self, token: CancellationToken) -> DashboardGuard {
        DashboardGuard {
            task_handle: self.start(token),
        }
    }
}

async fn track_in_flight(req: Request, next: Next) -> Response {
    IN_FLIGHT.inc();
    let resp = next.run(req).await;
    IN_FLIGHT.dec();
    resp
}

mod handlers {
    use axum::{
        body::Body,
        extract::Extension,
        http::header,
        http::{Response, StatusCode},
        response::IntoResponse,
    };
    use dash_core::metrics::update_uptime;
    use prometheus::{Encoder, ProtobufEncoder, TextEncoder};
    use tracing::error;

    use crate::models::{Health, ServerResult, State};

    pub(crate) async fn ok(Extension(state): Extension<State>) -> ServerResult<impl IntoResponse> {
        Ok(match *state.lock() {
            Health::Good => StatusCode::OK,
            Health::Bad => StatusCode::INTERNAL_SERVER_ERROR,
        })
    }

    pub(crate) async fn stylesheet() -> impl IntoResponse {
        (
            [(header::CONTENT_TYPE, "text/css")],
            include_str!("../static/dashboard.css"),
        )
    }

    pub(crate) async fn metrics() -> ServerResult<impl IntoResponse> {
        update_uptime();
        let encoder = ProtobufEncoder::new();
        let mut buf = Vec::new();
        let mf = prometheus::gather();
        let resp = Response::builder().header(header::CONTENT_TYPE, encoder.format_type());

        match encoder.encode(&mf, &mut buf) {
            Err(err) => {
                error!(?err, "error protobuf encoding prometheus metrics");
                Ok(resp
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())?)
            }
            Ok(_) => Ok(resp.status(StatusCode::OK).body(Body::from(buf))?),
        }
    }

    pub(crate) async fn metrics_text() -> ServerResult<impl IntoResponse> {
        update_uptime();
        let encoder = TextEncoder::new();
        let mut buf = String::new();
        let mf = prometheus::gather();
        let resp = Response::builder().header(header::CONTENT_TYPE, encoder.format_type());

        match encoder.encode_utf8(&mf, &mut buf) {
            Err(err) => {
                error!(?err, "error text encoding prometheus metrics");
                Ok(resp
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())?)
            }
            Ok(_) => Ok(resp.status(StatusCode::OK).body(Body::from(buf))?),
        }
    }

    pub(crate) async fn ping() -> impl IntoResponse {
        StatusCode::OK
    }
}

/// Various models for API responses
pub mod models {
    use axum::response::IntoResponse;
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};
    use std::{fmt, sync::Arc};

    /// The overall health of the system
    pub type State = Arc<Mutex<Health>>;
    /// Health is binary Good/Bad at the moment
    #[derive(Serialize, Deserialize, Debug, PartialEq, Copy, Clone, Eq)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Health {
        /// Report good health
        Good,
        /// Report bad health
        Bad,
    }

    impl fmt::Display for Health {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{}",
                match *self {
                    Health::Good => "GOOD",
                    Health::Bad => "BAD",
                }
            )
        }
    }

    pub(crate) fn blank_health() -> State {
        Arc::new(Mutex::new(Health::Bad))
    }

    // error type
    /// Make our own error that wraps `anyhow::Error`.
    #[derive(Debug)]
    pub struct ServerError(anyhow::Error);
    /// return error result
    pub type ServerResult<T> = Result<T, ServerError>;

    impl IntoResponse for ServerError {
        fn into_response(self) -> axum::response::Response {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}", self.0),
            )
                .into_response()
        }
    }

    impl<E> From<E> for ServerError
    where
        E: Into<anyhow::Error>,
    {
        fn from(err: E) -> Self {
            Self(err.into())
        }
    }
}
