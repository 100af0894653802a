use thiserror::Error;

/// Failures reported by a search client or the pipeline carrying its requests.
///
/// Errors are stored in the application state, so they are cheap to clone and
/// compare.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The client rejected or failed a request.
    #[error("search on index '{index}' failed: {message}")]
    Request { index: String, message: String },

    /// A request targeted an index the client does not know about.
    #[error("index '{0}' does not exist")]
    UnknownIndex(String),

    /// The client does not serve the requested endpoint.
    #[error("endpoint '{0}' is not supported by this client")]
    Unsupported(String),

    /// The worker carrying the request went away before answering.
    #[error("search worker stopped before answering")]
    Disconnected,
}

impl SearchError {
    pub fn request(index: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            index: index.into(),
            message: message.into(),
        }
    }
}
