mod config;

use common::domain::MirrorStore;
use common::nats::{NatsClient, NatsKvMirrorStore};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use config::ServiceConfig;
use roomsync_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use sync_worker::sync_worker::{SyncWorker, SyncWorkerConfig};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting roomsync-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    // Initialize shared dependencies
    let (nats_client, mirror_store) = match initialize_shared_dependencies(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!("Failed to initialize shared dependencies: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the sync bridge worker
    let sync_worker = match SyncWorker::new(
        nats_client.clone(),
        mirror_store,
        SyncWorkerConfig {
            stream: config.rooms_stream.clone(),
            consumer_name: config.sync_consumer_name.clone(),
            filter_subject: config.rooms_subject.clone(),
            batch_size: config.nats_batch_size,
            batch_wait_secs: config.nats_batch_wait_secs,
            max_in_flight: config.max_in_flight,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize sync worker: {}", e);
            std::process::exit(1);
        }
    };

    // Build runner with the sync bridge process and cleanup handlers
    let runner = Runner::new()
        .with_named_process("sync_worker", sync_worker.into_runner_process())
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || {
                Box::pin(async move {
                    info!("Running cleanup tasks...");
                    if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                        client.close().await;
                    }

                    // Shutdown telemetry and flush pending traces and logs
                    shutdown_telemetry(telemetry_providers);

                    info!("Cleanup complete");
                    Ok(())
                })
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    // Run the service
    runner.run().await;
}

async fn initialize_shared_dependencies(
    config: &ServiceConfig,
) -> anyhow::Result<(Arc<NatsClient>, Arc<dyn MirrorStore>)> {
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );

    nats_client
        .ensure_stream(&config.rooms_stream, vec![config.rooms_subject.clone()])
        .await?;

    info!("Initializing mirror store...");
    let mirror_store: Arc<dyn MirrorStore> = Arc::new(
        NatsKvMirrorStore::new(nats_client.jetstream(), &config.mirror_bucket).await?,
    );

    Ok((nats_client, mirror_store))
}
