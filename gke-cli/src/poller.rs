///! Readiness poller
///!
///! Re-reads a cluster or node pool until its status is RUNNING. Status
///! changes are logged once each; fetch errors abort the wait.

use crate::api::ControlPlane;
use gke_common::{ApiError, ClusterRef, Error, Result, STATUS_RUNNING};
use indicatif::ProgressBar;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Give up after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// What a successful wait observed
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    pub polls: u32,
    /// Statuses in the order they were logged, ending with RUNNING
    pub transitions: Vec<String>,
    pub elapsed: Duration,
}

pub struct Poller {
    settings: PollSettings,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl Poller {
    pub fn new(settings: PollSettings, cancel: CancellationToken) -> Self {
        Self {
            settings,
            cancel,
            progress: None,
        }
    }

    /// Mirror status changes on a spinner
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn wait_for_cluster(
        &self,
        api: &dyn ControlPlane,
        cluster: ClusterRef<'_>,
    ) -> Result<Convergence> {
        let resource = format!("cluster {}", cluster.cluster);
        self.wait(&resource, || async move {
            api.get_cluster(cluster)
                .await
                .map(|c| c.status.unwrap_or_default())
        })
        .await
    }

    pub async fn wait_for_node_pool(
        &self,
        api: &dyn ControlPlane,
        cluster: ClusterRef<'_>,
        pool: &str,
    ) -> Result<Convergence> {
        let resource = format!("nodepool {}", pool);
        self.wait(&resource, || async move {
            api.get_node_pool(cluster, pool)
                .await
                .map(|p| p.status.unwrap_or_default())
        })
        .await
    }

    async fn wait<F, Fut>(&self, resource: &str, mut fetch: F) -> Result<Convergence>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<String, ApiError>>,
    {
        let started = Instant::now();
        let deadline = self.settings.timeout.map(|t| started + t);
        let mut transitions: Vec<String> = Vec::new();
        let mut polls = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(resource));
            }

            // A stalled fetch must not outlive the deadline or a cancel
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(resource)),
                _ = until(deadline) => return Err(self.timed_out(resource, started)),
                result = fetch() => result,
            };
            let status = fetched.map_err(|source| Error::Poll {
                resource: resource.to_string(),
                source,
            })?;
            polls += 1;
            debug!(resource = %resource, status = %status, poll = polls, "Polled status");

            if status == STATUS_RUNNING {
                info!(resource = %resource, "{} is running", resource);
                transitions.push(status);
                if let Some(pb) = &self.progress {
                    pb.finish_and_clear();
                }
                return Ok(Convergence {
                    polls,
                    transitions,
                    elapsed: started.elapsed(),
                });
            }

            if transitions.last() != Some(&status) {
                info!(resource = %resource, status = %status, "{} {}", status.to_lowercase(), resource);
                if let Some(pb) = &self.progress {
                    pb.set_message(format!("{} {}", status.to_lowercase(), resource));
                }
                transitions.push(status);
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(self.timed_out(resource, started));
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(resource)),
                _ = until(deadline) => return Err(self.timed_out(resource, started)),
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
    }

    fn timed_out(&self, resource: &str, started: Instant) -> Error {
        if let Some(pb) = &self.progress {
            pb.abandon();
        }
        Error::Timeout {
            resource: resource.to_string(),
            elapsed: started.elapsed(),
        }
    }

    fn cancelled(&self, resource: &str) -> Error {
        if let Some(pb) = &self.progress {
            pb.abandon();
        }
        Error::Cancelled {
            resource: resource.to_string(),
        }
    }
}

/// Resolves at the deadline, never when there is none
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
