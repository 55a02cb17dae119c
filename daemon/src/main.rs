//! Hearth daemon: operator entry point for on-disk wallet state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hearth_orchestrator::{
    init_logging, load_first_time_state, MigrationFailurePolicy, Migrator, OrchestratorConfig,
    TracingTelemetry, VersionedStateStore,
};
use hearth_store::{FallbackStore, PreferredStore};
use hearth_store_lmdb::{JsonDiskStore, LmdbEnvironment, LmdbLocalStore};
use hearth_types::VersionedEnvelope;
use hearth_utils::obj_structure;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "hearth-daemon", about = "Hearth wallet state tool")]
struct Cli {
    /// Directory holding the LMDB and JSON state tiers.
    #[arg(long, env = "HEARTH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// What to do when a migration fails: "abort" or "keep-partial".
    #[arg(long, env = "HEARTH_MIGRATION_FAILURE_POLICY")]
    migration_failure_policy: Option<String>,

    /// JSON file merged over the built-in first-run state.
    #[arg(long, env = "HEARTH_FIRST_TIME_STATE")]
    first_time_state: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "HEARTH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "HEARTH_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "HEARTH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Work with the persisted state envelope.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Work with the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum StateAction {
    /// Print the version and structure (never the values) of both tiers.
    Inspect,
    /// Load, repair and migrate state, then write it back.
    Load,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Dump,
}

fn parse_policy(s: &str) -> anyhow::Result<MigrationFailurePolicy> {
    match s.to_lowercase().as_str() {
        "abort" => Ok(MigrationFailurePolicy::Abort),
        "keep-partial" => Ok(MigrationFailurePolicy::KeepPartial),
        other => anyhow::bail!("unknown migration failure policy: {other}"),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<OrchestratorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            OrchestratorConfig::from_toml_str(&contents)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => OrchestratorConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(policy) = &cli.migration_failure_policy {
        config.migration_failure_policy = parse_policy(policy)?;
    }
    if let Some(path) = &cli.first_time_state {
        config.first_time_state_path = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn open_tiers(config: &OrchestratorConfig) -> anyhow::Result<(Arc<LmdbLocalStore>, Arc<JsonDiskStore>)> {
    let env = LmdbEnvironment::open(&config.data_dir.join("lmdb"), config.lmdb_map_size)
        .with_context(|| format!("opening LMDB tier in {}", config.data_dir.display()))?;
    Ok((
        Arc::new(LmdbLocalStore::new(env)),
        Arc::new(JsonDiskStore::new(&config.data_dir, &config.storage_key)),
    ))
}

fn describe(envelope: Option<&VersionedEnvelope>) -> Value {
    match envelope {
        Some(env) => json!({
            "version": env.version,
            "has_data": env.has_data(),
            "structure": env.data.as_ref().map(obj_structure),
        }),
        None => Value::Null,
    }
}

async fn inspect(config: &OrchestratorConfig) -> anyhow::Result<()> {
    let (preferred, fallback) = open_tiers(config)?;
    let preferred = preferred.get().await.context("reading LMDB tier")?;
    let fallback = fallback.get_state().context("reading JSON tier")?;
    let report = json!({
        "data_dir": config.data_dir.display().to_string(),
        "preferred": describe(preferred.as_ref()),
        "fallback": describe(fallback.as_ref()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn load(config: &OrchestratorConfig) -> anyhow::Result<()> {
    let (preferred, fallback) = open_tiers(config)?;
    let telemetry = Arc::new(TracingTelemetry);
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::unbounded_channel();
    let store = VersionedStateStore::new(preferred, fallback, telemetry.clone(), fatal_tx);

    let migrator = Migrator::new(Vec::new())?
        .with_policy(config.migration_failure_policy)
        .with_telemetry(telemetry);
    let first_time_state = load_first_time_state(config.first_time_state_path.as_deref())?;
    let envelope = store.load(&migrator, &first_time_state).await?;

    println!("{}", serde_json::to_string_pretty(&describe(Some(&envelope)))?);
    Ok(())
}

fn ensure_data_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(config.log_format(), config.effective_log_level());

    match cli.command {
        Command::State { action } => {
            ensure_data_dir(&config.data_dir)?;
            match action {
                StateAction::Inspect => inspect(&config).await?,
                StateAction::Load => {
                    tracing::info!(data_dir = %config.data_dir.display(), "loading state");
                    load(&config).await?;
                }
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => print!("{}", config.to_toml_string()?),
        },
    }

    Ok(())
}
