//! Structured error types for arcscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to parse tracing model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown event type {code} in {list} at index {index}")]
    UnknownEventType { code: u32, list: String, index: usize },

    #[error("Events out of order in {list} at index {index}: {timestamp} after {previous}")]
    OutOfOrder { list: String, index: usize, timestamp: i64, previous: i64 },

    #[error("Malformed event in {list} at index {index}: {reason}")]
    MalformedEvent { list: String, index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No tracing model loaded")]
    NoModel,

    #[error("Failed to write output file: {0}")]
    WriteFailed(String),

    #[error("Failed to render SVG: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    TerminalError(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_event_type_display() {
        let err = ModelError::UnknownEventType { code: 7, list: "android.buffers[0]".into(), index: 3 };
        assert_eq!(err.to_string(), "Unknown event type 7 in android.buffers[0] at index 3");
    }

    #[test]
    fn test_out_of_order_display() {
        let err = ModelError::OutOfOrder {
            list: "system.memory".to_string(),
            index: 5,
            timestamp: 10,
            previous: 20,
        };
        assert!(err.to_string().contains("system.memory"));
        assert!(err.to_string().contains("10 after 20"));
    }
}
