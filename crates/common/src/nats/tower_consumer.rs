use crate::nats::{ConsumeRequest, ConsumeResponse, JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{debug, error, info, warn};

/// A NATS consumer that runs each message through a Tower service stack.
///
/// Every message is one independent invocation of the service: invocations
/// are spawned concurrently, bounded by a global in-flight cap set once at
/// construction. The service returns a `ConsumeResponse` deciding ack/nak;
/// a nak leaves redelivery to JetStream. No state is shared between
/// invocations beyond whatever the service itself holds.
pub struct TowerConsumer<S> {
    consumer: Box<dyn PullConsumer>,
    stream_name: String,
    consumer_name: String,
    batch_size: usize,
    max_wait: Duration,
    in_flight: Arc<Semaphore>,
    service: S,
}

impl<S> TowerConsumer<S>
where
    S: Service<ConsumeRequest, Response = ConsumeResponse, Error = anyhow::Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        max_in_flight: usize,
        service: S,
    ) -> Result<Self> {
        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            filter_subject = %subject_filter,
            max_in_flight,
            "creating tower nats consumer"
        );

        let config = jetstream::consumer::pull::Config {
            name: Some(consumer_name.to_string()),
            durable_name: Some(consumer_name.to_string()),
            filter_subject: subject_filter.to_string(),
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            ..Default::default()
        };

        let consumer = jetstream
            .create_consumer(config, stream_name)
            .await
            .context("failed to create consumer")?;

        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            "tower nats consumer created successfully"
        );

        Ok(Self {
            consumer,
            stream_name: stream_name.to_string(),
            consumer_name: consumer_name.to_string(),
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            service,
        })
    }

    /// Run the consumer loop until cancellation
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        debug!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "starting tower nats consumer"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(
                        stream = %self.stream_name,
                        consumer = %self.consumer_name,
                        "received shutdown signal, stopping consumer"
                    );
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(
                            stream = %self.stream_name,
                            consumer = %self.consumer_name,
                            error = %e,
                            "error processing batch"
                        );
                        // Continue processing despite errors
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        debug!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "consumer stopped gracefully"
        );
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        debug!(
            batch_size = self.batch_size,
            max_wait_secs = self.max_wait.as_secs(),
            "fetching message batch"
        );

        let raw_messages = self
            .consumer
            .fetch_messages(self.batch_size, self.max_wait)
            .await?;

        if raw_messages.is_empty() {
            debug!("no messages in batch");
            return Ok(());
        }

        debug!(message_count = raw_messages.len(), "received message batch");

        // One spawned invocation per message, gated by the in-flight cap.
        // Invocations for the same subject may run concurrently; ordering
        // is whatever the event source provides.
        let mut invocations = JoinSet::new();
        for msg in raw_messages {
            let permit = Arc::clone(&self.in_flight)
                .acquire_owned()
                .await
                .context("in-flight semaphore closed")?;
            let service = self.service.clone();

            invocations.spawn(async move {
                process_message(service, msg).await;
                drop(permit);
            });
        }

        while let Some(result) = invocations.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "invocation task panicked");
            }
        }

        Ok(())
    }
}

/// Process a single message through the service and ack/nak it.
async fn process_message<S>(mut service: S, msg: jetstream::Message)
where
    S: Service<ConsumeRequest, Response = ConsumeResponse, Error = anyhow::Error>,
{
    let request = ConsumeRequest::new(
        msg.subject.to_string(),
        Bytes::copy_from_slice(&msg.payload),
        msg.headers.clone(),
    );

    let response = match service.call(request).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(
                subject = %msg.subject,
                error = %e,
                "service error processing message"
            );
            ConsumeResponse::nak(e.to_string())
        }
    };

    match response {
        ConsumeResponse::Ack => {
            if let Err(e) = msg.ack().await {
                error!(
                    subject = %msg.subject,
                    error = %e,
                    "failed to acknowledge message"
                );
            }
        }
        ConsumeResponse::Nak(reason) => {
            if let Some(ref r) = reason {
                warn!(
                    subject = %msg.subject,
                    reason = %r,
                    "rejecting message"
                );
            } else {
                warn!(
                    subject = %msg.subject,
                    "rejecting message"
                );
            }

            if let Err(e) = msg.ack_with(jetstream::AckKind::Nak(None)).await {
                error!(
                    subject = %msg.subject,
                    error = %e,
                    "failed to reject message"
                );
            }
        }
    }
}
