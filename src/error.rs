use thiserror::Error;

/// Errors produced while building, registering or driving the sample pipeline.
#[derive(Error, Debug)]
pub enum SeriesError {
    /// Failed to create or register an exported metric.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The system-label payload is not valid JSON.
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The system-label payload is valid JSON but not an object.
    #[error("Invalid system labels: {0}")]
    InvalidSystemLabels(&'static str),

    /// A sink refused an emitted sample.
    #[error("Sink error: {0}")]
    Sink(String),
}
