//! Cloud status reporter
//!
//! Periodically pushes `{id, state}` for every machine on the roster to a
//! remote HTTP endpoint. Strictly best-effort: a short request timeout, no
//! retries, failures logged at debug and dropped. The reporter reads the
//! store under its lock only long enough to copy the roster; the HTTP work
//! happens on the blocking pool, never under the lock.

use serde::{Deserialize, Serialize};
use shopfloor_core::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Remote reporting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Endpoint receiving status POSTs; empty disables reporting
    pub endpoint: String,
    /// Seconds between report cycles
    pub interval_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            interval_secs: 30,
            request_timeout_secs: 2,
        }
    }
}

/// Periodic best-effort status push task
pub struct CloudReporter {
    store: Arc<StateStore>,
    config: CloudConfig,
    trigger: Arc<Notify>,
}

impl CloudReporter {
    /// Create a reporter over `store`
    pub fn new(store: Arc<StateStore>, config: CloudConfig) -> Self {
        Self {
            store,
            config,
            trigger: Arc::new(Notify::new()),
        }
    }

    /// Handle that forces an immediate report cycle from anywhere
    pub fn trigger_handle(&self) -> Arc<Notify> {
        self.trigger.clone()
    }

    /// Spawn the report loop
    ///
    /// Reports every `interval_secs`, or sooner when triggered. Runs until
    /// the process ends.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if self.config.endpoint.is_empty() {
                tracing::info!("cloud reporting disabled, no endpoint configured");
                return;
            }

            let agent = ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(self.config.request_timeout_secs))
                .build();
            let interval = Duration::from_secs(self.config.interval_secs);

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = self.trigger.notified() => {
                        tracing::debug!("forced report cycle");
                    }
                }
                self.report_roster(&agent).await;
            }
        })
    }

    async fn report_roster(&self, agent: &ureq::Agent) {
        let roster = self.store.active_machines();
        if roster.is_empty() {
            return;
        }

        let agent = agent.clone();
        let endpoint = self.config.endpoint.clone();
        let payloads: Vec<(usize, String)> = roster
            .into_iter()
            .map(|m| (m.id, m.state_label))
            .collect();

        let sent = tokio::task::spawn_blocking(move || {
            let mut sent = 0usize;
            for (id, state) in payloads {
                let body = serde_json::json!({ "id": id, "state": state });
                match agent.post(&endpoint).send_json(body) {
                    Ok(_) => sent += 1,
                    Err(e) => {
                        tracing::debug!(machine = id, "status report dropped: {e}");
                    }
                }
            }
            sent
        })
        .await
        .unwrap_or(0);

        tracing::debug!(reported = sent, "report cycle complete");
    }
}
