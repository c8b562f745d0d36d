use thiserror::Error;

/// Errors raised while constructing or running a boundary watcher.
///
/// Unresolved element handles are never errors; the tracker just stays idle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundError {
    #[error("threshold must be a finite ratio in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("{edge} margin must be finite, got {value}")]
    InvalidMargin { edge: &'static str, value: f32 },

    #[error("layout lookup failed: {0}")]
    Layout(String),

    #[error("watcher failed: {0}")]
    Watch(String),
}
