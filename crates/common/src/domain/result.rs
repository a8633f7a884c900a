use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("malformed device subject: {0}")]
    MalformedSubject(String),

    #[error("malformed write event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("mirror write failed for {key}: {source}")]
    MirrorWrite {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("mirror delete failed for {key}: {source}")]
    MirrorDelete {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DomainError {
    /// Whether redelivering the triggering event could succeed.
    ///
    /// Store failures are transient from this component's point of view;
    /// the event layer applies its own retry policy. Malformed input will
    /// fail the same way on every delivery.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::MirrorWrite { .. } | DomainError::MirrorDelete { .. }
        )
    }
}
