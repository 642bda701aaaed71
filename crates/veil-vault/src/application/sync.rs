//! # Sync Controller
//!
//! Rebuilds the record cache from the ledger. Records are fetched one at a
//! time in enumeration order; a record whose fetch fails is skipped and the
//! rest of the refresh carries on. The cache is replaced only once the full
//! list is built.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use veil_telemetry::{
    log_record_event, HistogramTimer, RECORDS_LOADED, RECORD_FETCH_FAILURES, SYNC_DURATION,
    SYNC_RUNS,
};

use super::flight::FlightFlag;
use super::state::SessionState;
use crate::algorithms::map_ledger_record;
use crate::domain::{ActivityAction, OperationKind, SyncReport, VaultError};
use crate::ports::LedgerReader;

/// Result label recorded when the availability probe succeeds.
pub const PROBE_AVAILABLE: &str = "Available";

/// Refreshes the record cache.
pub struct SyncController {
    state: Arc<SessionState>,
    reader: Arc<dyn LedgerReader>,
    flight: FlightFlag,
    loading: AtomicUsize,
}

/// Counts one running load; released on drop.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SyncController {
    /// Create a controller over `state`.
    pub fn new(state: Arc<SessionState>, reader: Arc<dyn LedgerReader>) -> Self {
        Self {
            state,
            reader,
            flight: FlightFlag::new(OperationKind::Refresh),
            loading: AtomicUsize::new(0),
        }
    }

    /// Whether a user-initiated refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.flight.is_active()
    }

    /// Whether any load is running, user-initiated or follow-up.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire) > 0
    }

    /// User-initiated refresh. Rejected while another one is in flight.
    pub async fn refresh(&self) -> Result<SyncReport, VaultError> {
        let _flight = self.flight.try_begin()?;
        self.run().await
    }

    /// Refresh following a create or reveal. Not guarded: it may overlap a
    /// user-initiated refresh, in which case the last one to finish wins.
    pub async fn resync(&self) -> Result<SyncReport, VaultError> {
        self.run().await
    }

    async fn run(&self) -> Result<SyncReport, VaultError> {
        let _loading = LoadingGuard::enter(&self.loading);
        let span = tracing::info_span!("vault_sync", op_id = %Uuid::new_v4());
        self.load().instrument(span).await
    }

    async fn load(&self) -> Result<SyncReport, VaultError> {
        self.state.require_connection()?;
        let _timer = HistogramTimer::new(&SYNC_DURATION);

        let available = self.probe().await;

        let ids = match self.reader.list_record_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "[veil] Failed to enumerate records");
                SYNC_RUNS.with_label_values(&["load_failed"]).inc();
                return Err(self.state.fail(VaultError::LoadFailed(e)));
            }
        };

        let mut records = Vec::with_capacity(ids.len());
        let mut skipped = Vec::new();
        for id in ids {
            match self.reader.get_record(&id).await {
                Ok(fields) => records.push(map_ledger_record(id, fields)),
                Err(source) => {
                    log_record_event!(
                        warn,
                        "sync",
                        "[veil] Skipping record that failed to load",
                        id,
                        error = %source
                    );
                    RECORD_FETCH_FAILURES.inc();
                    skipped.push(VaultError::RecordFetch { id, source });
                }
            }
        }

        // A load that outlives its connection must not repopulate the cache.
        self.state.require_connection()?;
        self.state.records().replace(records.clone());
        self.state.log(ActivityAction::DataLoaded {
            count: records.len(),
        });
        RECORDS_LOADED.set(records.len() as f64);
        SYNC_RUNS.with_label_values(&["success"]).inc();
        tracing::info!(
            loaded = records.len(),
            skipped = skipped.len(),
            "[veil] Records refreshed"
        );

        Ok(SyncReport {
            records,
            skipped,
            available,
        })
    }

    async fn probe(&self) -> bool {
        match self.reader.is_available().await {
            Ok(true) => {
                self.state.log(ActivityAction::ContractTest {
                    result: PROBE_AVAILABLE.to_string(),
                });
                true
            }
            Ok(false) => {
                tracing::debug!("[veil] Ledger reported unavailable");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "[veil] Availability probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::application::state::Connection;
    use crate::config::VaultConfig;
    use crate::domain::{LedgerError, NoticePhase, Principal, RecordId};
    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    fn setup(ledger: &InMemoryLedger) -> SyncController {
        let state = Arc::new(SessionState::new(VaultConfig::for_testing()));
        let principal = Principal::new("0xabc");
        state.bind(Connection {
            principal: principal.clone(),
            signer: ledger.signer_for(principal),
        });
        SyncController::new(state, Arc::new(ledger.clone()))
    }

    #[tokio::test]
    async fn test_refresh_skips_failed_record() {
        let ledger = InMemoryLedger::new();
        for name in ["A", "B", "C"] {
            ledger.seed_record(name, name, Some(1), Some(0), None);
        }
        ledger.fail_record(RecordId::new("B"));
        let sync = setup(&ledger);

        let report = assert_ok!(sync.refresh().await);
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(report.skipped_ids(), vec![RecordId::new("B")]);
        assert!(matches!(
            &report.skipped[0],
            VaultError::RecordFetch {
                source: LedgerError::Unreachable(_),
                ..
            }
        ));
        assert!(report.available);
        assert_eq!(sync.state.records().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_logs_probe_and_count() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("A", "Read", Some(2), Some(1), None);
        let sync = setup(&ledger);

        assert_ok!(sync.refresh().await);
        let tags: Vec<&str> = sync
            .state
            .activity()
            .entries()
            .iter()
            .map(|e| e.action.tag())
            .collect();
        assert_eq!(tags, vec!["DATA_LOADED", "CONTRACT_TEST"]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_keeps_previous_cache() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("A", "Read", Some(2), Some(1), None);
        let sync = setup(&ledger);
        assert_ok!(sync.refresh().await);

        ledger.set_unreachable(true);
        let err = assert_err!(sync.refresh().await);
        assert!(matches!(err, VaultError::LoadFailed(LedgerError::Unreachable(_))));
        assert_eq!(sync.state.records().len(), 1);
        assert_eq!(sync.state.status().current().phase, NoticePhase::Error);
        assert_eq!(sync.state.status().current().message, "Failed to load data");
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_fatal() {
        let ledger = InMemoryLedger::new();
        ledger.set_available(false);
        ledger.seed_record("A", "Read", Some(2), Some(1), None);
        let sync = setup(&ledger);

        let report = assert_ok!(sync.refresh().await);
        assert!(!report.available);
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn test_second_refresh_rejected_while_loading() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("A", "Read", Some(2), Some(1), None);
        let gate = Arc::new(Notify::new());
        ledger.gate_listing(Arc::clone(&gate));
        let sync = Arc::new(setup(&ledger));

        let first = tokio::spawn({
            let sync = Arc::clone(&sync);
            async move { sync.refresh().await }
        });
        ledger.listing_started().await;
        assert!(sync.is_refreshing());
        assert!(sync.is_loading());

        assert_eq!(
            sync.refresh().await.unwrap_err(),
            VaultError::OperationInProgress(OperationKind::Refresh)
        );
        assert!(!sync.state.status().current().visible);
        assert_eq!(ledger.list_calls(), 1);

        gate.notify_one();
        let report = assert_ok!(first.await.unwrap());
        assert_eq!(report.records.len(), 1);
        assert!(!sync.is_refreshing());
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn test_resync_reports_loading_without_claiming_refresh() {
        let ledger = InMemoryLedger::new();
        let gate = Arc::new(Notify::new());
        ledger.gate_listing(Arc::clone(&gate));
        let sync = Arc::new(setup(&ledger));

        let follow_up = tokio::spawn({
            let sync = Arc::clone(&sync);
            async move { sync.resync().await }
        });
        ledger.listing_started().await;
        assert!(sync.is_loading());
        assert!(!sync.is_refreshing());

        gate.notify_one();
        assert_ok!(follow_up.await.unwrap());
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn test_refresh_requires_connection() {
        let ledger = InMemoryLedger::new();
        let sync = SyncController::new(
            Arc::new(SessionState::new(VaultConfig::for_testing())),
            Arc::new(ledger.clone()),
        );
        assert_eq!(
            sync.refresh().await.unwrap_err(),
            VaultError::AuthenticationRequired
        );
        assert_eq!(ledger.list_calls(), 0);
    }
}
