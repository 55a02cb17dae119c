//! Boot sequence and background tasks.
//!
//! [`Orchestrator::initialize`] loads and migrates state, hands it to the
//! controller factory, then starts two tasks: the persistence pipeline and
//! the dispatch loop that routes controller events to persistence, the
//! badge and the transaction reporter.

use std::sync::Arc;

use hearth_interfaces::{Controller, ControllerEvent, ControllerEventSink, Platform, Telemetry};
use hearth_store::{FallbackStore, PreferredStore};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::badge::PendingRequestAggregator;
use crate::config::OrchestratorConfig;
use crate::first_time::load_first_time_state;
use crate::migrator::{Migration, Migrator};
use crate::persistence::PersistencePipeline;
use crate::popup::{NotificationManager, PopupCoordinator};
use crate::registry::{ContextRegistry, SharedRegistry};
use crate::router::ConnectionRouter;
use crate::shutdown::ShutdownController;
use crate::state_store::VersionedStateStore;
use crate::tx_reporter::TxStatusReporter;
use crate::OrchestratorError;

/// Everything a controller needs at construction.
pub struct ControllerInit {
    /// The loaded, migrated state.
    pub init_state: Value,
    /// Locale code derived from the platform's preferred languages (`en_us`).
    pub init_lang_code: String,
    pub platform_version: String,
    /// Where the controller publishes state, queue and transaction changes.
    pub events: ControllerEventSink,
    /// Opens the approval window on the controller's behalf.
    pub ui: Arc<PopupCoordinator>,
    /// Read access to origin/tab correlation and open surfaces.
    pub registry: SharedRegistry,
    pub platform: Arc<dyn Platform>,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    preferred: Arc<dyn PreferredStore>,
    fallback: Arc<dyn FallbackStore>,
    platform: Arc<dyn Platform>,
    telemetry: Arc<dyn Telemetry>,
    migrations: Vec<Box<dyn Migration>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        preferred: Arc<dyn PreferredStore>,
        fallback: Arc<dyn FallbackStore>,
        platform: Arc<dyn Platform>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            config,
            preferred,
            fallback,
            platform,
            telemetry,
            migrations: Vec::new(),
        }
    }

    pub fn with_migrations(mut self, migrations: Vec<Box<dyn Migration>>) -> Self {
        self.migrations = migrations;
        self
    }

    /// Load state, build the controller and start the background tasks.
    ///
    /// Fails if state cannot be loaded or the factory fails; nothing is
    /// spawned in that case.
    pub async fn initialize<F>(self, factory: F) -> Result<RunningOrchestrator, OrchestratorError>
    where
        F: FnOnce(ControllerInit) -> Result<Arc<dyn Controller>, OrchestratorError>,
    {
        let Self {
            config,
            preferred,
            fallback,
            platform,
            telemetry,
            migrations,
        } = self;

        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        let migrator = Migrator::new(migrations)?
            .with_policy(config.migration_failure_policy)
            .with_telemetry(telemetry.clone());
        let first_time_state = load_first_time_state(config.first_time_state_path.as_deref())?;
        let store = VersionedStateStore::new(
            preferred.clone(),
            fallback.clone(),
            telemetry.clone(),
            fatal_tx.clone(),
        );
        let envelope = store.load(&migrator, &first_time_state).await?;

        let registry = ContextRegistry::shared();
        let notifications = NotificationManager::new(
            platform.clone(),
            config.notification_url.clone(),
            config.notification_width,
            config.notification_height,
        );
        let ui = Arc::new(PopupCoordinator::new(
            platform.clone(),
            registry.clone(),
            notifications,
        ));
        let (events, event_rx) = ControllerEventSink::channel();

        let init_lang_code = preferred_lang_code(&platform.preferred_languages());
        tracing::info!(lang = %init_lang_code, version = envelope.version, "initializing controller");
        let controller = factory(ControllerInit {
            init_state: envelope.data.clone().unwrap_or_default(),
            init_lang_code,
            platform_version: platform.version(),
            events,
            ui: ui.clone(),
            registry: registry.clone(),
            platform: platform.clone(),
        })?;
        let router = ConnectionRouter::new(
            controller.clone(),
            registry.clone(),
            config.denylisted_ports.clone(),
        );

        let events_stop = ShutdownController::new();
        let persistence_stop = ShutdownController::new();

        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let mut pipeline = PersistencePipeline::new(preferred, envelope, config.debounce());
        if config.mirror_to_fallback {
            pipeline = pipeline.with_fallback_mirror(fallback);
        }
        let persistence = {
            let stop = persistence_stop.subscribe();
            tokio::spawn(async move {
                if let Err(e) = pipeline.run(snapshot_rx, stop).await {
                    tracing::error!(error = %e, "persistence pipeline failed");
                    let _ = fatal_tx.send(e.into());
                }
            })
        };

        let aggregator = PendingRequestAggregator::new(platform.clone(), config.badge_color.clone());
        if let Err(e) = aggregator.render().await {
            tracing::warn!(error = %e, "failed to render initial badge");
        }
        let reporter = TxStatusReporter::new(platform, telemetry);
        let dispatch = tokio::spawn(dispatch_events(
            event_rx,
            snapshot_tx,
            aggregator,
            reporter,
            events_stop.subscribe(),
        ));

        tracing::info!("orchestrator initialized");
        Ok(RunningOrchestrator {
            controller,
            router,
            ui,
            registry,
            fatal_rx,
            events_stop,
            persistence_stop,
            dispatch,
            persistence,
        })
    }
}

/// Handle to an initialized orchestrator.
pub struct RunningOrchestrator {
    controller: Arc<dyn Controller>,
    router: ConnectionRouter,
    ui: Arc<PopupCoordinator>,
    registry: SharedRegistry,
    fatal_rx: mpsc::UnboundedReceiver<OrchestratorError>,
    events_stop: ShutdownController,
    persistence_stop: ShutdownController,
    dispatch: JoinHandle<()>,
    persistence: JoinHandle<()>,
}

impl RunningOrchestrator {
    pub fn controller(&self) -> &Arc<dyn Controller> {
        &self.controller
    }

    pub fn router(&self) -> &ConnectionRouter {
        &self.router
    }

    pub fn popup(&self) -> &Arc<PopupCoordinator> {
        &self.ui
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Errors raised after initialization: an unsupported preferred tier
    /// and a failed persistence pipeline.
    pub fn fatal_errors(&mut self) -> &mut mpsc::UnboundedReceiver<OrchestratorError> {
        &mut self.fatal_rx
    }

    /// Stop the dispatch loop, then the persistence pipeline, writing any
    /// state change still in flight.
    pub async fn shutdown(self) {
        self.events_stop.shutdown();
        if let Err(e) = self.dispatch.await {
            tracing::warn!(error = %e, "dispatch task ended abnormally");
        }
        self.persistence_stop.shutdown();
        if let Err(e) = self.persistence.await {
            tracing::warn!(error = %e, "persistence task ended abnormally");
        }
        tracing::info!("orchestrator stopped");
    }
}

async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<ControllerEvent>,
    snapshots: mpsc::UnboundedSender<Option<Value>>,
    mut aggregator: PendingRequestAggregator,
    reporter: TxStatusReporter,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => dispatch(event, &snapshots, &mut aggregator, &reporter).await,
                None => break,
            },
            _ = shutdown.recv() => {
                while let Ok(event) = events.try_recv() {
                    dispatch(event, &snapshots, &mut aggregator, &reporter).await;
                }
                break;
            }
        }
    }
    tracing::debug!("controller event dispatch stopped");
}

async fn dispatch(
    event: ControllerEvent,
    snapshots: &mpsc::UnboundedSender<Option<Value>>,
    aggregator: &mut PendingRequestAggregator,
    reporter: &TxStatusReporter,
) {
    match event {
        ControllerEvent::StateChanged(state) => {
            if snapshots.send(state).is_err() {
                tracing::debug!("persistence stopped, dropping state change");
            }
        }
        ControllerEvent::PendingCountChanged { queue, count } => {
            if aggregator.update(queue, count) {
                if let Err(e) = aggregator.render().await {
                    tracing::warn!(error = %e, "failed to update badge");
                }
            }
        }
        ControllerEvent::TxStatusChanged(update) => reporter.handle(&update).await,
    }
}

/// `en-US` becomes `en_us`; no preference means `en`.
pub fn preferred_lang_code(languages: &[String]) -> String {
    languages
        .first()
        .map(|lang| lang.trim().to_lowercase().replace('-', "_"))
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| "en".to_string())
}
