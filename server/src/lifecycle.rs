//! Start, serve, drain, stop.
//!
//! # Design
//! `TodoServer` runs axum on its own task and waits on a caller-supplied
//! shutdown future. When that future resolves the server stops accepting
//! connections and in-flight requests get `grace` to finish. If they do not,
//! the server task is aborted. Progress is published on a `watch` channel so
//! callers (and tests) can observe `Starting → Serving → Draining → Stopped`.
//! The run is one-shot: a stopped server cannot be restarted.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{oneshot, watch};

/// Default time in-flight requests get after an interrupt.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Serving,
    Draining,
    Stopped,
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight request finished inside the grace window.
    Completed,
    /// The window elapsed and remaining connections were dropped.
    GraceElapsed,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[from] io::Error),

    #[error("server task ended abnormally: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct TodoServer {
    listener: TcpListener,
    router: Router,
    grace: Duration,
    state: watch::Sender<LifecycleState>,
}

impl TodoServer {
    /// Binds `addr` and prepares to serve `router`.
    pub async fn bind(addr: SocketAddr, router: Router, grace: Duration) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self::from_listener(listener, router, grace))
    }

    pub fn from_listener(listener: TcpListener, router: Router, grace: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            listener,
            router,
            grace,
            state,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Serves until `shutdown` resolves, then drains for at most the grace
    /// window.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the server task fails on its own before a
    /// shutdown was requested, or fails while draining.
    pub async fn run_until<F>(self, shutdown: F) -> Result<DrainOutcome, ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            router,
            grace,
            state,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "listening");
        }

        let (begin_drain, drain_requested) = oneshot::channel::<()>();
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = drain_requested.await;
                })
                .await
        });
        transition(&state, LifecycleState::Serving);

        tokio::select! {
            () = shutdown => {}
            finished = &mut serving => {
                transition(&state, LifecycleState::Stopped);
                finished??;
                return Ok(DrainOutcome::Completed);
            }
        }

        transition(&state, LifecycleState::Draining);
        tracing::info!(grace = ?grace, "draining in-flight requests");
        let _ = begin_drain.send(());

        let outcome = match tokio::time::timeout(grace, &mut serving).await {
            Ok(finished) => {
                let result = finished.map_err(ServerError::from).and_then(|served| {
                    served.map_err(ServerError::from)
                });
                if let Err(err) = result {
                    transition(&state, LifecycleState::Stopped);
                    return Err(err);
                }
                DrainOutcome::Completed
            }
            Err(_) => {
                serving.abort();
                tracing::warn!(grace = ?grace, "grace window elapsed, dropping remaining connections");
                DrainOutcome::GraceElapsed
            }
        };

        transition(&state, LifecycleState::Stopped);
        Ok(outcome)
    }
}

fn transition(state: &watch::Sender<LifecycleState>, next: LifecycleState) {
    tracing::debug!(state = ?next, "lifecycle transition");
    state.send_replace(next);
}

/// Resolves on SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
