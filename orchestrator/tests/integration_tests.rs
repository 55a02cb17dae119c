//! Integration tests exercising the full boot sequence:
//! load → migrate → controller construction → events → persistence.
//!
//! These wire the orchestrator to in-memory collaborators, and once to the
//! on-disk LMDB and JSON tiers, verifying the parts work together rather
//! than only in isolation.

use std::sync::Arc;
use std::time::Duration;

use hearth_interfaces::{Controller, ControllerEvent, DiagnosticEvent, RemotePort};
use hearth_nullables::{
    NullController, NullFallbackStore, NullPlatform, NullPreferredStore, NullTelemetry,
};
use hearth_orchestrator::{
    ConnectionOutcome, ControllerInit, FnMigration, Migration, MigrationFailurePolicy,
    Orchestrator, OrchestratorConfig, OrchestratorError, RunningOrchestrator,
};
use hearth_store::{FallbackStore, PreferredStore};
use hearth_store_lmdb::{JsonDiskStore, LmdbEnvironment, LmdbLocalStore};
use hearth_types::{ApprovalQueue, SenderMetadata, TabId, TxStatus, TxStatusUpdate, VersionedEnvelope};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    preferred: Arc<NullPreferredStore>,
    fallback: Arc<NullFallbackStore>,
    platform: Arc<NullPlatform>,
    telemetry: Arc<NullTelemetry>,
    controller: Arc<NullController>,
}

impl Harness {
    fn new(preferred: NullPreferredStore, fallback: NullFallbackStore) -> Self {
        Self {
            preferred: Arc::new(preferred),
            fallback: Arc::new(fallback),
            platform: Arc::new(NullPlatform::new().with_languages(&["de-DE", "en-US"])),
            telemetry: Arc::new(NullTelemetry::new()),
            controller: Arc::new(NullController::new()),
        }
    }

    fn orchestrator(&self, config: OrchestratorConfig) -> Orchestrator {
        Orchestrator::new(
            config,
            self.preferred.clone(),
            self.fallback.clone(),
            self.platform.clone(),
            self.telemetry.clone(),
        )
    }

    async fn boot(
        &self,
        config: OrchestratorConfig,
        migrations: Vec<Box<dyn Migration>>,
    ) -> (RunningOrchestrator, ControllerInit) {
        let mut captured = None;
        let controller: Arc<dyn Controller> = self.controller.clone();
        let running = self
            .orchestrator(config)
            .with_migrations(migrations)
            .initialize(|init| {
                captured = Some(init);
                Ok(controller)
            })
            .await
            .expect("initialize");
        (running, captured.expect("factory called"))
    }
}

fn rename_key(version: u32, from: &'static str, to: &'static str) -> Box<dyn Migration> {
    Box::new(FnMigration::new(version, move |mut data: Value| {
        let obj = data
            .as_object_mut()
            .ok_or_else(|| "state is not an object".to_string())?;
        if let Some(v) = obj.remove(from) {
            obj.insert(to.to_string(), v);
        }
        Ok(data)
    }))
}

fn config() -> OrchestratorConfig {
    OrchestratorConfig::default()
}

// ---------------------------------------------------------------------------
// 1. Boot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn boot_migrates_stored_state_and_hands_it_to_the_controller() {
    let h = Harness::new(
        NullPreferredStore::with_envelope(VersionedEnvelope::new(1, json!({"a": 1}))),
        NullFallbackStore::new(),
    );
    let (running, init) = h
        .boot(config(), vec![rename_key(2, "a", "b"), rename_key(3, "b", "c")])
        .await;

    assert_eq!(init.init_state, json!({"c": 1}));
    assert_eq!(init.init_lang_code, "de_de");
    assert_eq!(h.preferred.stored(), Some(VersionedEnvelope::new(3, json!({"c": 1}))));

    let badge = h.platform.last_badge().expect("initial badge");
    assert_eq!(badge.text, "");
    assert_eq!(badge.color, "#506F8B");
    running.shutdown().await;
}

#[tokio::test]
async fn first_run_uses_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("first.json");
    std::fs::write(&path, r#"{"network": "localhost"}"#).unwrap();
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());

    let (running, init) = h
        .boot(
            OrchestratorConfig {
                first_time_state_path: Some(path),
                ..config()
            },
            vec![],
        )
        .await;
    assert_eq!(init.init_state, json!({"config": {}, "network": "localhost"}));
    running.shutdown().await;
}

#[tokio::test]
async fn failing_migration_aborts_boot_by_default() {
    let h = Harness::new(
        NullPreferredStore::with_envelope(VersionedEnvelope::new(0, json!([]))),
        NullFallbackStore::new(),
    );
    let result = h
        .orchestrator(config())
        .with_migrations(vec![rename_key(1, "a", "b")])
        .initialize(|_| Ok(h.controller.clone() as Arc<dyn Controller>))
        .await;
    assert!(matches!(result, Err(OrchestratorError::Migration(_))));
    let events = h.telemetry.events();
    assert!(matches!(
        events.as_slice(),
        [DiagnosticEvent::MigrationFailed { version: 1, .. }]
    ));
}

#[tokio::test]
async fn keep_partial_policy_boots_at_last_good_version() {
    let h = Harness::new(
        NullPreferredStore::with_envelope(VersionedEnvelope::new(0, json!({"a": 1}))),
        NullFallbackStore::new(),
    );
    let broken: Box<dyn Migration> = Box::new(FnMigration::new(2, |_| Err("nope".to_string())));
    let (running, init) = h
        .boot(
            OrchestratorConfig {
                migration_failure_policy: MigrationFailurePolicy::KeepPartial,
                ..config()
            },
            vec![rename_key(1, "a", "b"), broken],
        )
        .await;
    assert_eq!(init.init_state, json!({"b": 1}));
    assert_eq!(h.preferred.stored().unwrap().version, 1);
    running.shutdown().await;
}

#[tokio::test]
async fn factory_errors_propagate() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let result = h
        .orchestrator(config())
        .initialize(|_| Err(OrchestratorError::Controller("no keyring".into())))
        .await;
    assert!(matches!(result, Err(OrchestratorError::Controller(_))));
}

#[tokio::test]
async fn unsupported_preferred_tier_surfaces_as_fatal_error() {
    let h = Harness::new(
        NullPreferredStore::unsupported(),
        NullFallbackStore::with_envelope(VersionedEnvelope::new(0, json!({"x": 1}))),
    );
    let (mut running, init) = h.boot(config(), vec![]).await;
    assert_eq!(init.init_state, json!({"x": 1}));

    let err = running.fatal_errors().recv().await.expect("fatal error");
    assert!(matches!(err, OrchestratorError::UnsupportedStorageTier));
    running.shutdown().await;
}

// ---------------------------------------------------------------------------
// 2. Controller events
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn state_changes_are_debounced_into_one_write() {
    let h = Harness::new(
        NullPreferredStore::with_envelope(VersionedEnvelope::new(4, json!({"n": 0}))),
        NullFallbackStore::new(),
    );
    let (running, init) = h.boot(config(), vec![]).await;
    let boot_writes = h.preferred.writes().len();

    for n in 1..=3 {
        init.events.state_changed(json!({"n": n}));
    }
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let writes = h.preferred.writes();
    assert_eq!(writes.len(), boot_writes + 1);
    assert_eq!(writes.last(), Some(&VersionedEnvelope::new(4, json!({"n": 3}))));
    running.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_writes_state_still_in_flight() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    init.events.state_changed(json!({"late": true}));
    running.shutdown().await;
    assert_eq!(h.preferred.stored().unwrap().data, Some(json!({"late": true})));
}

#[tokio::test(start_paused = true)]
async fn mirror_to_fallback_writes_both_tiers() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h
        .boot(
            OrchestratorConfig {
                mirror_to_fallback: true,
                ..config()
            },
            vec![],
        )
        .await;
    init.events.state_changed(json!({"m": 1}));
    running.shutdown().await;

    assert_eq!(
        h.fallback.get_state().unwrap().and_then(|e| e.data),
        Some(json!({"m": 1}))
    );
}

#[tokio::test]
async fn empty_state_change_stops_persistence_with_fatal_error() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (mut running, init) = h.boot(config(), vec![]).await;
    let before = h.preferred.writes();

    init.events.emit(ControllerEvent::StateChanged(None));
    let err = running.fatal_errors().recv().await.expect("fatal error");
    assert!(matches!(err, OrchestratorError::Persistence(_)));
    assert_eq!(h.preferred.writes(), before);
    running.shutdown().await;
}

#[tokio::test]
async fn pending_counts_drive_the_badge() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    init.events.pending_count_changed(ApprovalQueue::Transaction, 2);
    init.events.pending_count_changed(ApprovalQueue::TypedMessage, 1);
    init.events.pending_count_changed(ApprovalQueue::Transaction, 0);
    running.shutdown().await;

    let texts: Vec<_> = h.platform.badges().into_iter().map(|b| b.text).collect();
    assert_eq!(texts, vec!["", "2", "3", "1"]);
}

#[tokio::test]
async fn failed_transactions_are_reported() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    let mut update = TxStatusUpdate::new(9, TxStatus::Failed);
    update.error = Some("replacement underpriced".into());
    init.events.tx_status_changed(update);
    init.events.tx_status_changed(TxStatusUpdate::new(10, TxStatus::Submitted));
    running.shutdown().await;

    assert_eq!(
        h.telemetry.events(),
        vec![DiagnosticEvent::TransactionFailed {
            tx_id: 9,
            error: Some("replacement underpriced".into())
        }]
    );
    let notifications = h.platform.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Failed transaction");
}

// ---------------------------------------------------------------------------
// 3. Connections and approval UI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connections_reach_the_controller_through_the_running_router() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    let (port, _popup) = RemotePort::pair("popup", None);
    assert!(matches!(
        running.router().on_connection(port).await,
        ConnectionOutcome::Accepted { .. }
    ));
    let (port, _hw) = RemotePort::pair("trezor-connect", None);
    assert_eq!(
        running.router().on_connection(port).await,
        ConnectionOutcome::Rejected
    );

    assert_eq!(h.controller.setup_count(), 1);
    assert_eq!(h.controller.last_client_open(), Some(true));
    assert!(init.registry.lock().await.popup_open());

    // The popup is open, so the controller's UI request is a no-op.
    assert!(!init.ui.trigger_ui().await.unwrap());
    assert!(h.platform.opened_windows().is_empty());
    running.shutdown().await;
}

#[tokio::test]
async fn approval_wait_ends_when_the_notification_disconnects() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    let ui = init.ui.clone();
    let waiter = tokio::spawn(async move { ui.open_popup_and_wait().await });
    while h.platform.opened_windows().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.platform.opened_windows()[0].url, "notification.html");

    let (port, notification) = RemotePort::pair("notification", None);
    running.router().on_connection(port).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    drop(notification);
    waiter.await.unwrap().unwrap();
    assert_eq!(h.controller.client_open_history(), vec![true, false]);
    running.shutdown().await;
}

#[tokio::test]
async fn account_requests_are_visible_to_the_controller() {
    let h = Harness::new(NullPreferredStore::new(), NullFallbackStore::new());
    let (running, init) = h.boot(config(), vec![]).await;

    let sender = SenderMetadata::tab(TabId::new(77), "https://swap.example/#/");
    let (port, page) = RemotePort::pair("contentscript", Some(sender));
    running.router().on_connection(port).await;
    let mut stream = h.controller.take_stream(0).unwrap();

    page.tx
        .send(json!({"name": "provider", "data": {"method": "eth_requestAccounts"}}))
        .await
        .unwrap();
    stream.inbound.recv().await.unwrap();
    assert_eq!(
        init.registry
            .lock()
            .await
            .request_account_tab_ids()
            .get("swap.example"),
        Some(&TabId::new(77))
    );
    running.shutdown().await;
}

// ---------------------------------------------------------------------------
// 4. On-disk tiers
// ---------------------------------------------------------------------------

fn disk_tiers(dir: &std::path::Path) -> (Arc<LmdbLocalStore>, Arc<JsonDiskStore>) {
    let env = LmdbEnvironment::open(&dir.join("lmdb"), 16 * 1024 * 1024).expect("open env");
    (
        Arc::new(LmdbLocalStore::new(env)),
        Arc::new(JsonDiskStore::new(dir, "hearth-config")),
    )
}

async fn boot_on_disk(dir: &std::path::Path) -> (RunningOrchestrator, ControllerInit) {
    let (preferred, fallback) = disk_tiers(dir);
    let mut captured = None;
    let controller: Arc<dyn Controller> = Arc::new(NullController::new());
    let running = Orchestrator::new(
        OrchestratorConfig {
            mirror_to_fallback: true,
            ..config()
        },
        preferred,
        fallback,
        Arc::new(NullPlatform::new()),
        Arc::new(NullTelemetry::new()),
    )
    .with_migrations(vec![rename_key(1, "a", "b")])
    .initialize(|init| {
        captured = Some(init);
        Ok(controller)
    })
    .await
    .expect("initialize");
    (running, captured.expect("factory called"))
}

#[tokio::test]
async fn state_survives_a_restart_on_disk_tiers() {
    let dir = tempfile::tempdir().unwrap();

    let (running, init) = boot_on_disk(dir.path()).await;
    assert_eq!(init.init_state, json!({"config": {}}));
    init.events.state_changed(json!({"config": {}, "accounts": 2}));
    running.shutdown().await;
    drop(init);

    let (running, init) = boot_on_disk(dir.path()).await;
    assert_eq!(init.init_state, json!({"config": {}, "accounts": 2}));
    running.shutdown().await;
}

#[tokio::test]
async fn empty_lmdb_vault_is_recovered_from_json_tier() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (preferred, fallback) = disk_tiers(dir.path());
        preferred.set(&VersionedEnvelope::empty(1)).await.unwrap();
        fallback
            .put_state(&VersionedEnvelope::new(1, json!({"b": "vault"})))
            .unwrap();
    }

    let (running, init) = boot_on_disk(dir.path()).await;
    assert_eq!(init.init_state, json!({"b": "vault"}));
    running.shutdown().await;
}

async fn boot_result_on_disk(
    preferred: Arc<LmdbLocalStore>,
    fallback: Arc<JsonDiskStore>,
) -> Result<RunningOrchestrator, OrchestratorError> {
    let controller: Arc<dyn Controller> = Arc::new(NullController::new());
    Orchestrator::new(
        config(),
        preferred,
        fallback,
        Arc::new(NullPlatform::new()),
        Arc::new(NullTelemetry::new()),
    )
    .initialize(|_| Ok(controller))
    .await
}

#[tokio::test]
async fn undecodable_lmdb_entry_stops_boot_and_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(&dir.path().join("lmdb"), 16 * 1024 * 1024).unwrap();
    env.put("data", b"{not json").unwrap();
    let fallback = Arc::new(JsonDiskStore::new(dir.path(), "hearth-config"));

    let result = boot_result_on_disk(Arc::new(LmdbLocalStore::new(env.clone())), fallback.clone()).await;
    assert!(matches!(result, Err(OrchestratorError::Store(_))));
    assert_eq!(env.get("data").unwrap(), Some(b"{not json".to_vec()));
    assert_eq!(fallback.get_state().unwrap(), None);
}

#[tokio::test]
async fn undecodable_json_tier_stops_boot_and_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let (preferred, fallback) = disk_tiers(dir.path());
    std::fs::write(fallback.path(), "garbage").unwrap();

    let result = boot_result_on_disk(preferred.clone(), fallback.clone()).await;
    assert!(matches!(result, Err(OrchestratorError::Store(_))));
    assert_eq!(std::fs::read_to_string(fallback.path()).unwrap(), "garbage");
    assert_eq!(preferred.get().await.unwrap(), None);
}
