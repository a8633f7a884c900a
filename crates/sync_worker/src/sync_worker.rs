use crate::domain::MirrorService;
use crate::nats::{DeviceWriteConsumer, DeviceWriteConsumerConfig};
use common::domain::MirrorStore;
use common::nats::NatsClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct SyncWorkerConfig {
    pub stream: String,
    pub consumer_name: String,
    pub filter_subject: String,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
    pub max_in_flight: usize,
}

/// The sync bridge: mirrors device document writes into the flat store.
///
/// The mirror store handle is injected once at construction and shared
/// across all invocations; the worker itself keeps no other state.
pub struct SyncWorker {
    consumer: DeviceWriteConsumer,
}

impl SyncWorker {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        mirror_store: Arc<dyn MirrorStore>,
        config: SyncWorkerConfig,
    ) -> anyhow::Result<Self> {
        debug!("initializing sync worker module");

        let mirror = Arc::new(MirrorService::new(mirror_store));

        let consumer = DeviceWriteConsumer::new(
            nats_client,
            mirror,
            DeviceWriteConsumerConfig {
                stream: config.stream,
                consumer_name: config.consumer_name,
                filter_subject: config.filter_subject,
                batch_size: config.batch_size,
                batch_wait_secs: config.batch_wait_secs,
                max_in_flight: config.max_in_flight,
            },
        )
        .await?;

        Ok(Self { consumer })
    }

    #[allow(clippy::type_complexity)]
    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
            > + Send,
    > {
        Box::new({
            let consumer = self.consumer;
            move |ctx| Box::pin(async move { consumer.run(ctx).await })
        })
    }
}
