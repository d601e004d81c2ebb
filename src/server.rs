//! Listener lifecycle for the acknowledgement server
//!
//! `Created → Listening → Draining → Closed`. [`Server::close`] stops
//! accepting, gives in-flight requests the configured grace period, then
//! aborts whatever is left. Failures along the way are logged and the
//! shutdown carries on.

use crate::config::ServerConfig;
use crate::error::LoadError;
use crate::router::create_router;
use crate::state::AppState;
use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Listening,
    Draining,
    Closed,
}

pub struct Server {
    state: ServerState,
    app_state: Arc<AppState>,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    /// Stop accepting and ask every connection to finish its request.
    shutdown: CancellationToken,
    /// Abort every connection that is still open.
    force: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind the listener without serving yet.
    pub async fn bind(config: ServerConfig) -> Result<Self, LoadError> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| LoadError::BindError {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LoadError::BindError { addr, source })?;

        Ok(Self {
            state: ServerState::Created,
            app_state: Arc::new(AppState::new(config)),
            listener: Some(listener),
            local_addr,
            shutdown: CancellationToken::new(),
            force: CancellationToken::new(),
            task: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn success_count(&self) -> u64 {
        self.app_state.success_count()
    }

    /// Start serving in the background. Does nothing unless the server is
    /// still in [`ServerState::Created`].
    pub fn run(&mut self) {
        let Some(listener) = self.listener.take() else {
            warn!(state = ?self.state, "Server already started");
            return;
        };

        let app = create_router(self.app_state.clone());
        self.task = Some(tokio::spawn(serve(
            listener,
            app,
            self.shutdown.clone(),
            self.force.clone(),
        )));

        self.state = ServerState::Listening;
        info!(
            addr = %self.local_addr,
            route = %self.app_state.config.route(),
            "Server listening"
        );
    }

    /// Drain and close; returns the number of requests acknowledged.
    pub async fn close(mut self) -> u64 {
        self.state = ServerState::Draining;
        self.shutdown.cancel();

        if let Some(mut task) = self.task.take() {
            let grace = self.app_state.config.shutdown_timeout;
            match timeout(grace, &mut task).await {
                Ok(Ok(())) => info!("In-flight requests drained"),
                Ok(Err(e)) => error!(error = %e, "Server task did not finish cleanly"),
                Err(_) => {
                    warn!(
                        grace_ms = grace.as_millis() as u64,
                        "Grace period elapsed, closing remaining connections"
                    );
                    self.force.cancel();
                    if let Err(e) = task.await {
                        error!(error = %e, "Server task did not finish cleanly");
                    }
                }
            }
        }

        self.state = ServerState::Closed;
        let handled = self.app_state.success_count();
        info!(success_count = handled, state = ?self.state, "Stopped HTTP server");
        handled
    }
}

/// Accept loop. Every connection runs in `connections`, so once `force`
/// fires they can all be aborted and awaited together.
async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    force: CancellationToken,
) {
    let mut connections = JoinSet::new();

    loop {
        let (stream, remote) = tokio::select! {
            () = shutdown.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => continue,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
        };

        let app = app.clone();
        let service = service_fn(move |mut request: hyper::Request<Incoming>| {
            request.extensions_mut().insert(ConnectInfo(remote));
            app.clone().oneshot(request)
        });

        let shutdown = shutdown.clone();
        connections.spawn(async move {
            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            let mut conn = std::pin::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                () = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };
            if let Err(e) = result {
                debug!(client = %remote, error = %e, "Connection closed with error");
            }
        });
    }

    drop(listener);
    info!(connections = connections.len(), "Stopped accepting, draining connections");

    tokio::select! {
        () = async { while connections.join_next().await.is_some() {} } => {}
        () = force.cancelled() => {
            warn!(connections = connections.len(), "Aborting open connections");
            connections.shutdown().await;
        }
    }
}
