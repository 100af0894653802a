use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parameters::SearchParameters;

/// One response entry, as returned by the search client for a single request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawResult {
    pub index: String,
    /// Serialized query parameters of the request that produced this entry.
    pub params: String,
    pub hits: Vec<Value>,
    pub nb_hits: usize,
    pub page: u32,
    pub nb_pages: u32,
    pub hits_per_page: u32,
    pub query: String,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
    #[serde(rename = "queryID", skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

/// Results of one pipeline together with the parameters that produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    state: SearchParameters,
    raw_results: Vec<RawResult>,
}

impl SearchResults {
    #[must_use]
    pub fn new(state: SearchParameters, raw_results: Vec<RawResult>) -> Self {
        Self { state, raw_results }
    }

    #[must_use]
    pub fn state(&self) -> &SearchParameters {
        &self.state
    }

    #[must_use]
    pub fn raw_results(&self) -> &[RawResult] {
        &self.raw_results
    }

    fn main(&self) -> Option<&RawResult> {
        self.raw_results.first()
    }

    #[must_use]
    pub fn hits(&self) -> &[Value] {
        self.main().map(|raw| raw.hits.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn nb_hits(&self) -> usize {
        self.main().map_or(0, |raw| raw.nb_hits)
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.main().map_or(0, |raw| raw.page)
    }

    #[must_use]
    pub fn nb_pages(&self) -> u32 {
        self.main().map_or(0, |raw| raw.nb_pages)
    }

    #[must_use]
    pub fn hits_per_page(&self) -> u32 {
        self.main().map_or(0, |raw| raw.hits_per_page)
    }

    #[must_use]
    pub fn query_id(&self) -> Option<&str> {
        self.main().and_then(|raw| raw.query_id.as_deref())
    }
}

/// Latest results published to widgets.
///
/// The shape follows the search mode: one result while only the primary index
/// is queried, one result per index otherwise. The two are never mixed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultsState {
    Single(SearchResults),
    Multi(IndexMap<String, SearchResults>),
}

impl ResultsState {
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Results relevant to `index_id`.
    ///
    /// Single-index results are shared by every widget regardless of the
    /// index it targets.
    #[must_use]
    pub fn for_index(&self, index_id: &str) -> Option<&SearchResults> {
        match self {
            Self::Single(results) => Some(results),
            Self::Multi(results) => results.get(index_id),
        }
    }

    #[must_use]
    pub fn single(&self) -> Option<&SearchResults> {
        match self {
            Self::Single(results) => Some(results),
            Self::Multi(_) => None,
        }
    }
}
