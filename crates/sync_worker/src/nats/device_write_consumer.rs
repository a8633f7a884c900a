use crate::domain::MirrorService;
use crate::nats::DeviceWriteService;
use anyhow::Result;
use common::nats::{ConsumeLoggingLayer, ConsumeLoggingService, NatsClient, TowerConsumer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tracing::debug;

/// Type alias for the layered device write consumer service
type DeviceWriteLayeredService = ConsumeLoggingService<DeviceWriteService>;

/// Subscription settings for the device write consumer.
pub struct DeviceWriteConsumerConfig {
    pub stream: String,
    pub consumer_name: String,
    pub filter_subject: String,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
    /// Global cap on simultaneous invocations, set once at startup.
    pub max_in_flight: usize,
}

pub struct DeviceWriteConsumer {
    consumer: TowerConsumer<DeviceWriteLayeredService>,
}

impl DeviceWriteConsumer {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        mirror: Arc<MirrorService>,
        config: DeviceWriteConsumerConfig,
    ) -> Result<Self> {
        debug!(
            stream = %config.stream,
            consumer = %config.consumer_name,
            filter = %config.filter_subject,
            "initializing device write consumer"
        );

        let layered_service = ServiceBuilder::new()
            .layer(ConsumeLoggingLayer::new())
            .service(DeviceWriteService::new(mirror));

        let consumer_client = nats_client.create_consumer_client();
        let consumer = TowerConsumer::new(
            consumer_client,
            &config.stream,
            &config.consumer_name,
            &config.filter_subject,
            config.batch_size,
            config.batch_wait_secs,
            config.max_in_flight,
            layered_service,
        )
        .await?;

        Ok(Self { consumer })
    }

    /// Run the consumer loop
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        debug!("starting device write consumer");
        self.consumer.run(ctx).await
    }
}
