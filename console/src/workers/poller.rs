//! Deployment status poller

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::http::deployments::DeploymentsApi;
use crate::views::status::SharedStatus;

/// Poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between two fetches
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Poll one deployment until it reaches a terminal status or the shutdown
/// signal fires.
///
/// Fetches once immediately, then once per interval. A fetch that has started
/// always runs to completion before shutdown is noticed.
pub async fn run<A, S, F>(
    options: &Options,
    api: &A,
    status: &SharedStatus,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    A: DeploymentsApi + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Status poller starting...");
    status.fetch(api).await;

    loop {
        if status.is_terminal().await {
            info!("Deployment reached a terminal status, poller stopping");
            return;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                info!("Status poller shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }

        debug!("Polling deployment status...");
        status.fetch(api).await;
    }
}

/// Handle to a spawned poller. At most one should exist per status page.
#[derive(Debug)]
pub struct PollerHandle {
    deployment_id: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Spawn a poller for the deployment currently selected in `status`
    pub fn spawn<A>(options: Options, api: Arc<A>, status: SharedStatus, deployment_id: String) -> Self
    where
        A: DeploymentsApi + ?Sized + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            run(
                &options,
                api.as_ref(),
                &status,
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        });

        Self {
            deployment_id,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the poller and wait until its task is gone.
    ///
    /// A fetch still in flight is dropped and its response never applied.
    pub async fn stop(mut self) {
        debug!("Stopping status poller for {}", self.deployment_id);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
