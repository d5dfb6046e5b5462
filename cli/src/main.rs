//! CLI entrypoint for distill-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use distill_application::{
    InferenceGateway, KeyValueStorage, MemoryStorage, NoStreamEventLog, SessionStore,
    StreamConfig, StreamController, StreamEventLog,
};
use distill_infrastructure::{
    ConfigLoader, FileConfig, FileKeyValueStore, HttpInferenceGateway, JsonlStreamEventLog,
    ServiceEndpoints,
};
use distill_presentation::{ChatRepl, Cli, ConsoleFormatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting distill-chat");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    config.validate()?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // === Dependency Injection ===
    let endpoints = ServiceEndpoints::new(&config.server.base_url, &config.server.api_prefix);
    let gateway = Arc::new(HttpInferenceGateway::new(
        endpoints,
        config.server.timeout_seconds.map(Duration::from_secs),
    )?);

    if cli.check {
        let status = gateway
            .health_check()
            .await
            .with_context(|| format!("Service at {} is unreachable", config.server.base_url))?;
        println!("{}: {}", config.server.base_url, status.status);
        if !status.is_healthy() {
            bail!("Service reported status {:?}", status.status);
        }
        return Ok(());
    }

    let store = Arc::new(SessionStore::load(open_storage(&config)));

    if cli.list {
        print!("{}", ConsoleFormatter::format_session_list(&store.state()));
        return Ok(());
    }

    let controller = Arc::new(
        StreamController::new(gateway, Arc::clone(&store))
            .with_config(StreamConfig::from_timeout_seconds(
                config.server.timeout_seconds,
            ))
            .with_event_log(open_event_log(&config)),
    );
    let deletion_watcher = controller.spawn_deletion_watcher();
    let repl = ChatRepl::new(Arc::clone(&controller));

    if let Some(context) = &cli.context {
        store.create_session(context.as_str(), cli.title.clone().unwrap_or_default())?;
    }

    let outcome = match &cli.prompt {
        Some(prompt) => {
            let Some(session) = store.active_session() else {
                bail!("No session to ask in. Pass --context to start one.");
            };
            repl.ask(&session.id, prompt).await.map_err(anyhow::Error::from)
        }
        None => repl.run().await.map_err(anyhow::Error::from),
    };

    controller.shutdown();
    deletion_watcher.abort();
    outcome
}

/// Durable session storage, or in-memory storage when disabled or unusable.
fn open_storage(config: &FileConfig) -> Arc<dyn KeyValueStorage> {
    if !config.storage.enabled {
        info!("Session storage disabled; sessions last for this run only");
        return Arc::new(MemoryStorage::new());
    }

    let Some(dir) = config.data_dir() else {
        warn!("No data directory available; sessions will not be saved");
        return Arc::new(MemoryStorage::new());
    };

    match FileKeyValueStore::open(&dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Could not open session storage at {}: {}; sessions will not be saved",
                dir.display(),
                e
            );
            Arc::new(MemoryStorage::new())
        }
    }
}

fn open_event_log(config: &FileConfig) -> Arc<dyn StreamEventLog> {
    match config
        .logging
        .event_log
        .as_ref()
        .and_then(JsonlStreamEventLog::new)
    {
        Some(log) => {
            info!("Stream event log at {}", log.path().display());
            Arc::new(log)
        }
        None => Arc::new(NoStreamEventLog),
    }
}
