//! Concurrent process runner with graceful shutdown.
//!
//! Orchestrates the long-running service processes (HTTP facade, MQTT ingest,
//! collectors) plus cleanup functions: processes run concurrently until one
//! fails or a shutdown signal arrives, then every process is cancelled and the
//! closers run under a timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type ProcessFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

struct NamedProcess {
    name: &'static str,
    start: Box<dyn FnOnce(CancellationToken) -> ProcessFuture + Send>,
}

/// Cleanup function, run after every process has stopped.
pub type Closer = Box<dyn FnOnce() -> ProcessFuture + Send>;

/// Runs named service processes concurrently until completion, failure, or a
/// SIGINT/SIGTERM, then executes closers. A failed process cancels the rest;
/// closers always run.
pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named process. The name appears in lifecycle log lines.
    pub fn with_named_process<F, Fut>(mut self, name: &'static str, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name,
            start: Box::new(|token| Box::pin(process(token))),
        });
        self
    }

    /// Adds a cleanup function, run after all processes have stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Uses an external cancellation token instead of a fresh one, allowing
    /// callers (and tests) to trigger shutdown directly.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs everything to completion. Returns the first process error, if any;
    /// signal-triggered shutdown returns `Ok(())`.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let token = Arc::new(self.cancellation_token);
        let mut join_set = JoinSet::new();
        let closers = self.closers;

        for process in self.processes {
            let process_token = token.clone();
            let name = process.name;
            join_set.spawn(async move {
                info!(process = name, "process started");
                let result = (process.start)((*process_token).clone()).await;
                (name, result)
            });
        }

        spawn_signal_handlers(token.clone());

        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = name, "process completed");
                }
                Ok((name, Err(err))) => {
                    if !token.is_cancelled() {
                        error!(process = name, error = format!("{err:#}"), "process failed");
                        first_error = Some(err);
                        token.cancel();
                    }
                }
                Err(err) => {
                    error!(error = %err, "process panicked");
                    if !token.is_cancelled() {
                        first_error = Some(anyhow::anyhow!("process panicked: {err}"));
                        token.cancel();
                    }
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        // Let the remaining processes observe the cancellation and finish
        // their current unit of work; abort whatever outlives the timeout.
        let drain = async {
            while let Some(joined) = join_set.join_next().await {
                if let Ok((name, _)) = joined {
                    debug!(process = name, "process stopped");
                }
            }
        };
        if tokio::time::timeout(self.closer_timeout, drain).await.is_err() {
            error!(timeout = ?self.closer_timeout, "processes did not stop in time, aborting");
        }
        join_set.shutdown().await;

        if !closers.is_empty() {
            info!(timeout = ?self.closer_timeout, "running closers");
            if tokio::time::timeout(self.closer_timeout, run_closers(closers))
                .await
                .is_err()
            {
                error!(timeout = ?self.closer_timeout, "closers timed out");
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("runner stopped");
                Ok(())
            }
        }
    }
}

fn spawn_signal_handlers(token: Arc<CancellationToken>) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!(error = %err, "failed to install signal handler");
            }
        }
    });

    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("received SIGTERM");
                    token.cancel();
                }
                Err(err) => {
                    error!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("closer completed"),
            Ok(Err(err)) => error!(error = format!("{err:#}"), "closer failed"),
            Err(err) => error!(error = %err, "closer panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn cancellation_stops_processes_and_runs_closers() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = closer_called.clone();
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = Runner::new()
            .with_named_process("blocked", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || {
                let flag = closer_flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token)
            .run()
            .await;

        assert!(result.is_ok());
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failing_process_cancels_the_rest_and_surfaces_the_error() {
        let peer_stopped = Arc::new(AtomicBool::new(false));
        let peer_flag = peer_stopped.clone();

        let result = Runner::new()
            .with_named_process("broken", |_ctx| async move {
                Err(anyhow::anyhow!("startup failed"))
            })
            .with_named_process("peer", move |ctx| {
                let flag = peer_flag.clone();
                async move {
                    ctx.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .run()
            .await;

        assert!(result.is_err());
        assert!(peer_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn completed_processes_do_not_trigger_shutdown() {
        let result = Runner::new()
            .with_named_process("oneshot", |_ctx| async move { Ok(()) })
            .run()
            .await;
        assert!(result.is_ok());
    }
}
