//! Schema migration runner for the persisted state envelope.
//!
//! Migrations are totally ordered by version. Running the migrator over an
//! envelope at version `v` applies exactly the migrations whose version is
//! greater than `v`, in ascending order, and stamps the envelope with the
//! version of the last one applied.

use std::collections::HashSet;
use std::sync::Arc;

use hearth_interfaces::{DiagnosticEvent, Telemetry};
use hearth_types::VersionedEnvelope;
use hearth_utils::obj_structure;
use serde_json::Value;
use thiserror::Error;

use crate::config::MigrationFailurePolicy;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} failed: {reason}")]
    Failed { version: u32, reason: String },

    #[error("migration {0} returned no data")]
    EmptyData(u32),

    #[error("duplicate migration version {0}")]
    DuplicateVersion(u32),

    #[error("envelope at version {0} has no data to migrate")]
    MissingData(u32),
}

/// A single schema step.
pub trait Migration: Send + Sync {
    fn version(&self) -> u32;

    /// Transform state written by the previous schema into this one.
    fn migrate(&self, data: Value) -> Result<Value, MigrationError>;
}

/// A migration defined by a closure.
pub struct FnMigration<F> {
    version: u32,
    apply: F,
}

impl<F> FnMigration<F>
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    pub fn new(version: u32, apply: F) -> Self {
        Self { version, apply }
    }
}

impl<F> Migration for FnMigration<F>
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    fn version(&self) -> u32 {
        self.version
    }

    fn migrate(&self, data: Value) -> Result<Value, MigrationError> {
        (self.apply)(data).map_err(|reason| MigrationError::Failed {
            version: self.version,
            reason,
        })
    }
}

pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
    policy: MigrationFailurePolicy,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl Migrator {
    /// Build a migrator. Migrations may be given in any order; two with the
    /// same version are rejected.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> Result<Self, MigrationError> {
        migrations.sort_by_key(|m| m.version());
        let mut seen = HashSet::new();
        for m in &migrations {
            if !seen.insert(m.version()) {
                return Err(MigrationError::DuplicateVersion(m.version()));
            }
        }
        Ok(Self {
            migrations,
            policy: MigrationFailurePolicy::default(),
            telemetry: None,
        })
    }

    pub fn with_policy(mut self, policy: MigrationFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Version of the newest known migration, or 0 when there are none.
    pub fn current_version(&self) -> u32 {
        self.migrations.last().map_or(0, |m| m.version())
    }

    /// First-run state, already at the current schema version.
    pub fn generate_initial_state(&self, data: Value) -> VersionedEnvelope {
        VersionedEnvelope::new(self.current_version(), data)
    }

    /// Apply every pending migration to `envelope`.
    pub fn migrate_data(
        &self,
        envelope: VersionedEnvelope,
    ) -> Result<VersionedEnvelope, MigrationError> {
        let start = envelope.version;
        let mut pending = self
            .migrations
            .iter()
            .filter(|m| m.version() > start)
            .peekable();
        if pending.peek().is_none() {
            return Ok(envelope);
        }
        if !envelope.has_data() {
            return Err(MigrationError::MissingData(start));
        }

        let mut version = start;
        let mut data = envelope.into_data().unwrap_or(Value::Null);
        for migration in pending {
            let target = migration.version();
            let result = match migration.migrate(data.clone()) {
                Ok(Value::Null) => Err(MigrationError::EmptyData(target)),
                other => other,
            };
            match result {
                Ok(next) => {
                    tracing::debug!(from = version, to = target, "migration applied");
                    data = next;
                    version = target;
                }
                Err(err) => {
                    self.report_failure(target, &err, &data);
                    match self.policy {
                        MigrationFailurePolicy::Abort => return Err(err),
                        MigrationFailurePolicy::KeepPartial => {
                            tracing::warn!(
                                version,
                                failed = target,
                                "keeping state at last good migration"
                            );
                            return Ok(VersionedEnvelope::new(version, data));
                        }
                    }
                }
            }
        }

        tracing::info!(from = start, to = version, "migration complete");
        Ok(VersionedEnvelope::new(version, data))
    }

    fn report_failure(&self, version: u32, err: &MigrationError, data: &Value) {
        tracing::error!(version, error = %err, "state migration failed");
        if let Some(telemetry) = &self.telemetry {
            telemetry.capture(DiagnosticEvent::MigrationFailed {
                version,
                error: err.to_string(),
                structure: obj_structure(data),
            });
        }
    }
}
