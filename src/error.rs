//! Error types for treecast.
//!
//! Conversion distinguishes two failure tiers. Everything a well-behaved
//! pass can run into (no listener matched, a consumable was already
//! claimed, the schema rejected an insertion) is a silent, local omission
//! and never surfaces as an error. The variants below cover the remaining
//! tier: broken converters and malformed marker input, which abort the
//! pass and propagate to the caller of `convert()`.

use thiserror::Error;

/// Errors that abort a conversion pass.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A listener left behind a model range that does not resolve against
    /// the tree built so far, or whose end precedes its start. This is a
    /// broken converter, not bad input.
    #[error("listener for `{event}` produced an invalid model range: {reason}")]
    InvalidRange {
        /// Event the offending listener was registered for, e.g. `element:p`.
        event: String,
        /// What exactly failed to resolve.
        reason: String,
    },

    /// A position handed to the writer does not resolve in the tree.
    #[error("position {path:?} does not resolve in the conversion tree: {reason}")]
    InvalidPosition {
        /// Offset path that failed to resolve.
        path: Vec<usize>,
        /// What exactly failed to resolve.
        reason: String,
    },

    /// More than two marker sentinels shared one marker name. Two sentinels
    /// delimit a ranged marker and one denotes a collapsed marker; a third
    /// occurrence has no defined meaning and is rejected outright.
    #[error("marker `{name}` appeared more than twice during conversion")]
    DuplicateMarker {
        /// Name of the over-occurring marker.
        name: String,
    },
}

/// Result type alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

impl ConversionError {
    /// Create an invalid-range error for the given event.
    pub fn invalid_range(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            event: event.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConversionError::invalid_range("element:p", "end precedes start");
        assert_eq!(
            err.to_string(),
            "listener for `element:p` produced an invalid model range: end precedes start"
        );

        let err = ConversionError::DuplicateMarker { name: "comment:1".into() };
        assert_eq!(
            err.to_string(),
            "marker `comment:1` appeared more than twice during conversion"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        static_assertions::assert_impl_all!(ConversionError: Send, Sync);
    }
}
