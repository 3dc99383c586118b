//! Error taxonomy shared by the fetcher, the dispatcher and the transports.

/// Result type for hot-search operations.
pub type HotSearchResult<T> = Result<T, HotSearchError>;

/// Errors raised while configuring or serving hot-search requests.
///
/// Only [`HotSearchError::ConfigInvalid`] is fatal; every other variant is
/// rendered as an error reply on the channel the request arrived on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotSearchError {
    /// Credentials or configuration rejected before serving starts.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Connection refused, DNS failure, timeout or no response at all.
    #[error("network unavailable: {reason}")]
    NetworkUnavailable { reason: String },

    /// The upstream answered with a non-2xx status or a body that is not JSON.
    #[error("upstream request failed with status {status}")]
    UpstreamRequestFailed { status: u16 },

    /// The upstream JSON failed envelope validation.
    #[error("invalid upstream payload: {reason}")]
    InvalidUpstreamPayload { reason: String },

    /// A tool argument violated its declared constraints.
    #[error("invalid argument `{field}`: {reason}")]
    ToolArgumentInvalid { field: String, reason: String },

    /// No tool or resource with this name exists.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl HotSearchError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidUpstreamPayload {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolArgumentInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
