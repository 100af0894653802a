//! Query-suggestion and geocoding lookups running beside the main search.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::{Map, Value};
use tracing::debug;
use vizion_widget_api::SearchParameters;

use crate::client::{GEOCODING_PATH, ReadRequest, SearchClient, SearchError, SearchRequest};

/// Index queried for query suggestions.
pub const QUERY_SUGGESTIONS_INDEX: &str = "query_suggestions";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LookupKind {
    QuerySuggestions,
    Locations,
}

#[derive(Debug)]
pub(crate) struct LookupEvent {
    pub kind: LookupKind,
    pub outcome: Result<Value, SearchError>,
}

/// Searches the query-suggestions index of a client.
struct QuerySuggestionsIndex {
    client: Arc<dyn SearchClient>,
}

impl QuerySuggestionsIndex {
    fn search(&self, query: &str, params: &Map<String, Value>) -> Result<Value, SearchError> {
        let parameters = params.iter().fold(
            SearchParameters::new(QUERY_SUGGESTIONS_INDEX).set_query(query),
            |parameters, (key, value)| parameters.set_query_parameter(key.clone(), value.clone()),
        );
        let mut results = self.client.search(&[SearchRequest::new(parameters)])?;
        if results.is_empty() {
            return Err(SearchError::request(
                QUERY_SUGGESTIONS_INDEX,
                "client returned no result",
            ));
        }
        serde_json::to_value(results.swap_remove(0))
            .map_err(|err| SearchError::request(QUERY_SUGGESTIONS_INDEX, err.to_string()))
    }
}

/// Calls the geocoding endpoint of a client.
struct GeocodingClient {
    client: Arc<dyn SearchClient>,
}

impl GeocodingClient {
    fn search(&self, query: &str, params: &Map<String, Value>) -> Result<Value, SearchError> {
        let mut data = params.clone();
        data.insert("query".into(), Value::from(query));
        self.client.read(&ReadRequest {
            path: GEOCODING_PATH.to_owned(),
            data: Value::Object(data),
        })
    }
}

/// Lookup clients owned by one coordinator.
///
/// Each client is created on first use and bound to the search client current
/// at that time. Outcomes come back on a channel drained by the coordinator.
pub(crate) struct AuxiliaryLookups {
    query_suggestions: Option<Arc<QuerySuggestionsIndex>>,
    geocoding: Option<Arc<GeocodingClient>>,
    tx: Sender<LookupEvent>,
    rx: Receiver<LookupEvent>,
    in_flight: usize,
}

impl AuxiliaryLookups {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            query_suggestions: None,
            geocoding: None,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Forget the lookup clients so the next lookup binds to a new client.
    pub fn reset(&mut self) {
        self.query_suggestions = None;
        self.geocoding = None;
    }

    pub fn search_query_suggestions(
        &mut self,
        client: &Arc<dyn SearchClient>,
        query: String,
        params: Map<String, Value>,
    ) {
        let index = Arc::clone(self.query_suggestions.get_or_insert_with(|| {
            debug!(index = QUERY_SUGGESTIONS_INDEX, "creating query suggestions index");
            Arc::new(QuerySuggestionsIndex {
                client: Arc::clone(client),
            })
        }));
        self.spawn(LookupKind::QuerySuggestions, move || {
            index.search(&query, &params)
        });
    }

    pub fn search_locations(
        &mut self,
        client: &Arc<dyn SearchClient>,
        query: String,
        params: Map<String, Value>,
    ) {
        let geocoding = Arc::clone(self.geocoding.get_or_insert_with(|| {
            debug!(path = GEOCODING_PATH, "creating geocoding client");
            Arc::new(GeocodingClient {
                client: Arc::clone(client),
            })
        }));
        self.spawn(LookupKind::Locations, move || {
            geocoding.search(&query, &params)
        });
    }

    fn spawn<F>(&mut self, kind: LookupKind, lookup: F)
    where
        F: FnOnce() -> Result<Value, SearchError> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let outcome = lookup();
            let _ = tx.send(LookupEvent { kind, outcome });
        });
    }

    /// Next finished lookup, without blocking.
    pub fn try_next(&mut self) -> Option<LookupEvent> {
        let event = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(event)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn has_query_suggestions_index(&self) -> bool {
        self.query_suggestions.is_some()
    }

    pub fn has_geocoding_client(&self) -> bool {
        self.geocoding.is_some()
    }
}
