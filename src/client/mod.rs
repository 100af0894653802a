//! Search client interface consumed by the helper, the hydration adapter and
//! the auxiliary lookups.

mod cache;
mod error;
mod memory;

pub use cache::{
    CacheKey, InMemoryResponsesCache, LEGACY_QUERIES_KEY_PREFIX, LegacyCache, ResponsesCache,
};
pub use error::SearchError;
pub use memory::{CacheMode, Dataset, MemoryClient};

use serde_json::{Value, json};
use vizion_widget_api::{RawResult, SearchParameters};

/// Client endpoint answering location lookups.
pub const GEOCODING_PATH: &str = "geocoding/v1/autocomplete";

/// One query against one index, as sent to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub index_name: String,
    pub params: SearchParameters,
}

impl SearchRequest {
    #[must_use]
    pub fn new(params: SearchParameters) -> Self {
        Self {
            index_name: params.index().to_owned(),
            params,
        }
    }

    /// Wire form: the index name and the serialized query string.
    #[must_use]
    pub fn serialized(&self) -> Value {
        json!({
            "indexName": self.index_name,
            "params": self.params.to_query_string(),
        })
    }
}

/// Request against a client endpoint other than `search`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadRequest {
    pub path: String,
    pub data: Value,
}

/// The external search service.
///
/// Only [`search`](Self::search) is mandatory. Clients opt into agent tagging,
/// caching and extra endpoints by overriding the remaining methods.
pub trait SearchClient: Send + Sync {
    /// Run every request and return one raw result per request, in order.
    fn search(&self, requests: &[SearchRequest]) -> Result<Vec<RawResult>, SearchError>;

    #[must_use]
    fn supports_agents(&self) -> bool {
        false
    }

    /// Tag outgoing requests with an agent string. Ignored by clients that do
    /// not support agents.
    fn add_agent(&self, _agent: &str) {}

    fn responses_cache(&self) -> Option<&dyn ResponsesCache> {
        None
    }

    fn legacy_cache(&self) -> Option<&LegacyCache> {
        None
    }

    fn clear_cache(&self) {
        if let Some(cache) = self.responses_cache() {
            cache.clear();
        }
        if let Some(cache) = self.legacy_cache() {
            cache.clear();
        }
    }

    /// Generic read endpoint, used for geocoding lookups.
    fn read(&self, request: &ReadRequest) -> Result<Value, SearchError> {
        Err(SearchError::Unsupported(request.path.clone()))
    }
}
