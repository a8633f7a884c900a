use crate::domain::{MirrorRecord, MirrorStore};
use anyhow::{Context, Result};
use async_nats::jetstream;
use async_trait::async_trait;
use tracing::debug;

/// Mirror store backed by a NATS JetStream key-value bucket.
///
/// The bucket plays the role of the flat real-time database: one key per
/// device, holding the JSON-encoded mirrored record. A single instance is
/// created at startup and shared across all invocations.
pub struct NatsKvMirrorStore {
    store: jetstream::kv::Store,
}

impl NatsKvMirrorStore {
    pub async fn new(jetstream: &jetstream::Context, bucket_name: &str) -> Result<Self> {
        debug!(bucket = %bucket_name, "initializing kv mirror store");

        let store = match jetstream.get_key_value(bucket_name).await {
            Ok(store) => {
                debug!(bucket = %bucket_name, "kv bucket already exists");
                store
            }
            Err(_) => {
                debug!(bucket = %bucket_name, "creating kv bucket");
                jetstream
                    .create_key_value(jetstream::kv::Config {
                        bucket: bucket_name.to_string(),
                        // The record is a projection; only the latest value matters
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .context("failed to create kv bucket")?
            }
        };

        Ok(Self { store })
    }
}

#[async_trait]
impl MirrorStore for NatsKvMirrorStore {
    async fn put(&self, key: &str, record: MirrorRecord) -> Result<()> {
        let payload = serde_json::to_vec(&record).context("failed to encode mirror record")?;
        self.store
            .put(key, payload.into())
            .await
            .context("failed to put mirror record")?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // Purge rather than delete so no tombstone history accumulates.
        // Purging a key that was never written succeeds, which gives the
        // required no-op on absent records.
        self.store
            .purge(key)
            .await
            .context("failed to purge mirror record")?;
        Ok(())
    }
}
