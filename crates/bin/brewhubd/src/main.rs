//! # brewhubd: brewhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the recipe client, device gateway and MQTT notifier
//! - Construct the mash engine, injecting adapters via port traits
//! - Spawn the gateway liveness loop and the telemetry listener
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use brewhub_adapter_brewfather::BrewfatherClient;
use brewhub_adapter_http_axum::state::AppState;
use brewhub_adapter_mqtt::MqttNotifier;
use brewhub_adapter_spark::SparkGateway;
use brewhub_adapter_storage_sqlite_sqlx::SqliteStateStore;
use brewhub_app::mash_engine::MashEngine;
use brewhub_app::scheduler::TokioScheduler;
use brewhub_app::{liveness, telemetry};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Database
    let db = brewhub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let store = SqliteStateStore::new(db.pool().clone());

    // Collaborators
    let recipes = BrewfatherClient::new(config.brewfather.clone())?;
    let gateway = SparkGateway::new(config.spark.clone())?;
    let (mqtt_client, mqtt_event_loop) = brewhub_adapter_mqtt::connect(&config.mqtt);
    let notifier = MqttNotifier::new(mqtt_client.clone(), config.mqtt.state_topic.clone());

    // Engine
    let engine = Arc::new(MashEngine::new(
        recipes,
        gateway,
        store,
        notifier,
        TokioScheduler,
        config.engine_config(),
    ));
    engine.initialize().await?;

    // Background tasks
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (readings_tx, readings_rx) = mpsc::channel(config.mqtt.channel_capacity);

    let liveness_task = tokio::spawn(liveness::watch_gateway(
        Arc::clone(&engine),
        config.liveness_interval(),
        shutdown_rx.clone(),
    ));
    let mqtt_task = tokio::spawn(brewhub_adapter_mqtt::telemetry::run(
        mqtt_client,
        mqtt_event_loop,
        config.mqtt.clone(),
        readings_tx,
        shutdown_rx,
    ));
    let forward_task = tokio::spawn(telemetry::forward_readings(
        Arc::clone(&engine),
        readings_rx,
    ));

    // HTTP
    let app = brewhub_adapter_http_axum::router::build(AppState::new(Arc::clone(&engine)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "brewhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    // receivers may already be gone if a task ended early
    let _ = shutdown_tx.send(true);
    engine.shutdown();
    for (name, task) in [
        ("liveness", liveness_task),
        ("mqtt", mqtt_task),
        ("telemetry", forward_task),
    ] {
        if let Err(err) = task.await {
            tracing::warn!(task = name, error = %err, "background task failed");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
