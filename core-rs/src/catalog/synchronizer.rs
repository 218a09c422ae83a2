/**
 * synchronizer.rs
 * Scheduled reconciliation of remote catalogs into the quad store
 *
 * Each run walks the configured participants in order. Per participant, the
 * previously mirrored offers are torn down and the freshly fetched ones are
 * inserted inside one write transaction; a failure aborts that participant's
 * transaction only and the run moves on.
 */

use chrono::{DateTime, Utc};
use oxigraph::model::{GraphName, NamedNode, Quad};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::converter::{participant_node, QuadConverter};
use super::offer::{CatalogClient, FederatedAssetFilter};
use super::predicates::PredicateTable;
use crate::config::SynchronizationConfig;
use crate::errors::{AgentError, Result};
use crate::store::{term_as_subject, QuadPattern, QuadStore};

/// What one run did for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantOutcome {
    pub participant: String,
    pub offers: usize,
    pub deleted: usize,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParticipantOutcome {
    fn failed(participant: &str, error: &AgentError) -> Self {
        Self {
            participant: participant.to_string(),
            offers: 0,
            deleted: 0,
            added: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one synchronization run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub participants: Vec<ParticipantOutcome>,
}

impl SyncReport {
    pub fn outcome(&self, participant: &str) -> Option<&ParticipantOutcome> {
        self.participants.iter().find(|o| o.participant == participant)
    }

    pub fn failures(&self) -> usize {
        self.participants.iter().filter(|o| !o.is_success()).count()
    }
}

struct SyncWorker {
    store: Arc<QuadStore>,
    client: Arc<dyn CatalogClient>,
    converter: QuadConverter,
    filter: FederatedAssetFilter,
    participants: Vec<String>,
    // serializes scheduled runs against run_now
    run_lock: tokio::sync::Mutex<()>,
}

impl SyncWorker {
    /// One pass over all participants
    ///
    /// With a `stop` flag, the pass ends early once the flag is raised; the
    /// participant in flight still completes.
    async fn run(&self, stop: Option<&AtomicBool>) -> SyncReport {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();
        let mut participants = Vec::with_capacity(self.participants.len());

        for participant in &self.participants {
            if stop.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                debug!("Synchronizer stopped, ending run early");
                break;
            }
            participants.push(self.synchronize(participant).await);
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            participants,
        };
        info!(
            participants = report.participants.len(),
            succeeded = report.participants.len() - report.failures(),
            failed = report.failures(),
            "Catalog synchronization run finished"
        );
        report
    }

    async fn synchronize(&self, participant: &str) -> ParticipantOutcome {
        if let Err(e) = self.store.begin_write() {
            warn!(participant, error = %e, "Could not open write transaction, skipping participant");
            return ParticipantOutcome::failed(participant, &e);
        }

        match self.reconcile(participant).await {
            Ok(outcome) => {
                info!(
                    participant,
                    offers = outcome.offers,
                    deleted = outcome.deleted,
                    added = outcome.added,
                    "Participant catalog synchronized"
                );
                outcome
            }
            Err(e) => {
                self.store.abort();
                warn!(participant, error = %e, "Participant catalog synchronization failed");
                ParticipantOutcome::failed(participant, &e)
            }
        }
    }

    /// Fetch, tear down, insert, commit. Expects an open write transaction.
    async fn reconcile(&self, participant: &str) -> Result<ParticipantOutcome> {
        let offers = self.client.fetch(participant, &self.filter).await?;
        let node = participant_node(participant)?;
        let graph = self.store.default_graph();

        let deleted = self.tear_down(&graph, &node)?;

        let mut added = 0;
        for offer in &offers {
            for quad in self.converter.convert(&graph, &node, offer) {
                self.store.add(quad)?;
                added += 1;
            }
        }

        self.store.commit()?;

        Ok(ParticipantOutcome {
            participant: participant.to_string(),
            offers: offers.len(),
            deleted,
            added,
            error: None,
        })
    }

    /// Delete everything previously mirrored for `node`, returning the number of quads deleted
    fn tear_down(&self, graph: &GraphName, node: &NamedNode) -> Result<usize> {
        let offered = self
            .store
            .find(
                QuadPattern::any()
                    .with_graph(graph.clone())
                    .with_subject(node.clone())
                    .with_predicate(self.converter.offers_asset_predicate().clone()),
            )
            .to_vec()?;

        let mut deleted = 0;
        for link in offered {
            if let Some(asset) = term_as_subject(&link.object) {
                let properties: Vec<Quad> = self
                    .store
                    .find(QuadPattern::any().with_graph(graph.clone()).with_subject(asset))
                    .to_vec()?;
                for quad in properties {
                    self.store.delete(quad)?;
                    deleted += 1;
                }
            }
            self.store.delete(link)?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

struct Schedule {
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Schedule {
    fn is_active(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }

    /// Raise the stop flag and wake a sleeping loop; true if it was active
    fn halt(&self) -> bool {
        let was_active = !self.stop.swap(true, Ordering::SeqCst);
        self.wake.notify_one();
        was_active
    }
}

/// Keeps the quad store's mirror of remote catalogs current
///
/// State is either stopped or running. `start` and `shutdown` are both
/// idempotent; synchronization stays off unless an interval and at least
/// one participant are configured.
pub struct CatalogSynchronizer {
    worker: Arc<SyncWorker>,
    interval: Duration,
    enabled: bool,
    schedule: Mutex<Option<Schedule>>,
}

impl CatalogSynchronizer {
    pub fn new(
        store: Arc<QuadStore>,
        client: Arc<dyn CatalogClient>,
        predicates: Arc<PredicateTable>,
        config: &SynchronizationConfig,
    ) -> Self {
        let worker = SyncWorker {
            store,
            client,
            converter: QuadConverter::new(predicates),
            filter: FederatedAssetFilter::federated(),
            participants: config.participants.clone(),
            run_lock: tokio::sync::Mutex::new(()),
        };
        Self {
            worker: Arc::new(worker),
            interval: config.interval(),
            enabled: config.is_enabled(),
            schedule: Mutex::new(None),
        }
    }

    /// Schedule the first run one interval from now
    ///
    /// No-op while already running or when synchronization is disabled.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if !self.enabled {
            debug!("Catalog synchronization disabled, not starting");
            return Ok(());
        }

        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        if schedule.as_ref().is_some_and(Schedule::is_active) {
            debug!("Catalog synchronizer already running");
            return Ok(());
        }

        let handle = Handle::try_current()
            .map_err(|e| AgentError::Config(format!("synchronizer requires a tokio runtime: {}", e)))?;

        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let task = handle.spawn(schedule_loop(
            self.worker.clone(),
            stop.clone(),
            wake.clone(),
            self.interval,
        ));
        // a previous, already stopped task finishes on its own
        *schedule = Some(Schedule { stop, wake, task });

        info!(
            interval_ms = self.interval.as_millis() as u64,
            participants = self.worker.participants.len(),
            "Catalog synchronizer started"
        );
        Ok(())
    }

    /// Stop rescheduling; an in-flight participant transaction still completes
    pub fn shutdown(&self) {
        let schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(schedule) = schedule.as_ref() {
            if schedule.halt() {
                info!("Catalog synchronizer stopping");
            }
        }
    }

    /// Shut down and wait for the background task to finish
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let schedule = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(schedule) = schedule {
            if let Err(e) = schedule.task.await {
                warn!(error = %e, "Synchronizer task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Schedule::is_active)
    }

    /// Run one reconciliation pass immediately, independent of the schedule
    pub async fn run_now(&self) -> SyncReport {
        self.worker.run(None).await
    }
}

impl Drop for CatalogSynchronizer {
    fn drop(&mut self) {
        let schedule = self.schedule.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(schedule) = schedule.as_ref() {
            schedule.halt();
        }
    }
}

async fn schedule_loop(
    worker: Arc<SyncWorker>,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    interval: Duration,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = wake.notified() => {}
        }
        if stop.load(Ordering::SeqCst) {
            break;
        }
        worker.run(Some(&stop)).await;
        if stop.load(Ordering::SeqCst) {
            break;
        }
    }
    debug!("Catalog synchronization schedule ended");
}
