use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream name carrying device document write events
    #[serde(default = "default_rooms_stream")]
    pub rooms_stream: String,

    /// Subject pattern for device write events within the stream
    #[serde(default = "default_rooms_subject")]
    pub rooms_subject: String,

    /// Durable consumer name for the sync bridge
    #[serde(default = "default_sync_consumer_name")]
    pub sync_consumer_name: String,

    /// Batch size for the consumer fetch
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Global cap on simultaneous event invocations
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Key-value bucket holding the mirrored records
    #[serde(default = "default_mirror_bucket")]
    pub mirror_bucket: String,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_rooms_stream() -> String {
    "rooms".to_string()
}

fn default_rooms_subject() -> String {
    "rooms.*.devices.*".to_string()
}

fn default_sync_consumer_name() -> String {
    "room-sync-bridge".to_string()
}

fn default_nats_batch_size() -> usize {
    10
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_max_in_flight() -> usize {
    10
}

fn default_mirror_bucket() -> String {
    "device-mirror".to_string()
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "roomsync-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("ROOMSYNC"))
            .build()?
            .try_deserialize()
    }
}
