use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, trace};
use vizion_widget_api::RawResult;

use super::cache::{CacheKey, InMemoryResponsesCache, LegacyCache, ResponsesCache};
use super::{GEOCODING_PATH, ReadRequest, SearchClient, SearchError, SearchRequest};

const DEFAULT_HITS_PER_PAGE: u32 = 20;

/// Records served by a [`MemoryClient`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dataset {
    /// Records per index name.
    #[serde(default)]
    pub indices: BTreeMap<String, Vec<Value>>,
    /// Places answered by the geocoding endpoint.
    #[serde(default)]
    pub locations: Vec<Value>,
}

/// Cache API exposed by a [`MemoryClient`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// No cache at all.
    None,
    /// Structured `{ method, args }` responses cache.
    #[default]
    Structured,
    /// Flat string-keyed cache, optionally disabled.
    Legacy { enabled: bool },
}

/// In-process client answering queries from a [`Dataset`].
///
/// Matching is a case-insensitive substring test over the string fields of each
/// record; facet refinements require the record field to equal one of the
/// refined values.
#[derive(Debug)]
pub struct MemoryClient {
    dataset: Dataset,
    agents: Option<Mutex<Vec<String>>>,
    responses_cache: Option<InMemoryResponsesCache>,
    legacy_cache: Option<LegacyCache>,
    network_calls: AtomicUsize,
}

impl MemoryClient {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self::with_cache(dataset, CacheMode::default())
    }

    #[must_use]
    pub fn with_cache(dataset: Dataset, mode: CacheMode) -> Self {
        let (responses_cache, legacy_cache) = match mode {
            CacheMode::None => (None, None),
            CacheMode::Structured => (Some(InMemoryResponsesCache::default()), None),
            CacheMode::Legacy { enabled } => (None, Some(LegacyCache::new(enabled))),
        };
        Self {
            dataset,
            agents: Some(Mutex::new(Vec::new())),
            responses_cache,
            legacy_cache,
            network_calls: AtomicUsize::new(0),
        }
    }

    /// Stop accepting agent strings, like third-party clients do.
    #[must_use]
    pub fn without_agents(mut self) -> Self {
        self.agents = None;
        self
    }

    fn agent_list(&self) -> Option<MutexGuard<'_, Vec<String>>> {
        self.agents
            .as_ref()
            .map(|agents| agents.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Agent strings registered so far.
    #[must_use]
    pub fn agents(&self) -> Vec<String> {
        self.agent_list()
            .map(|agents| agents.clone())
            .unwrap_or_default()
    }

    /// Number of `search` calls that were not answered from a cache.
    #[must_use]
    pub fn network_calls(&self) -> usize {
        self.network_calls.load(Ordering::Acquire)
    }

    fn cached(&self, serialized: &[Value]) -> Option<Vec<RawResult>> {
        let payload = if let Some(cache) = &self.responses_cache {
            cache.get(&CacheKey::search(serialized.to_vec()))?
        } else {
            let cache = self.legacy_cache.as_ref().filter(|cache| cache.is_enabled())?;
            let text = cache.get(&LegacyCache::queries_key(serialized))?;
            serde_json::from_str(&text).ok()?
        };
        serde_json::from_value(payload.get("results")?.clone()).ok()
    }

    fn store(&self, serialized: Vec<Value>, results: &[RawResult]) {
        let payload = json!({ "results": results });
        if let Some(cache) = &self.responses_cache {
            cache.set(&CacheKey::search(serialized), payload);
        } else if let Some(cache) = self.legacy_cache.as_ref().filter(|cache| cache.is_enabled()) {
            cache.insert(LegacyCache::queries_key(&serialized), payload.to_string());
        }
    }

    fn run_query(&self, request: &SearchRequest) -> Result<RawResult, SearchError> {
        let started = Instant::now();
        let records = self
            .dataset
            .indices
            .get(&request.index_name)
            .ok_or_else(|| SearchError::UnknownIndex(request.index_name.clone()))?;

        let params = &request.params;
        let query = params.query().unwrap_or_default().to_lowercase();
        let matching: Vec<&Value> = records
            .iter()
            .filter(|record| query.is_empty() || matches_query(record, &query))
            .filter(|record| {
                params
                    .facet_refinements()
                    .iter()
                    .all(|(facet, values)| matches_facet(record, facet, values))
            })
            .collect();

        let hits_per_page = params
            .hits_per_page()
            .unwrap_or(DEFAULT_HITS_PER_PAGE)
            .max(1);
        let page = params.page().unwrap_or(0);
        let nb_hits = matching.len();
        let nb_pages = u32::try_from(nb_hits.div_ceil(hits_per_page as usize)).unwrap_or(u32::MAX);
        let hits = matching
            .into_iter()
            .skip(page as usize * hits_per_page as usize)
            .take(hits_per_page as usize)
            .cloned()
            .collect();

        Ok(RawResult {
            index: request.index_name.clone(),
            params: params.to_query_string(),
            hits,
            nb_hits,
            page,
            nb_pages,
            hits_per_page,
            query: params.query().unwrap_or_default().to_owned(),
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            query_id: None,
        })
    }
}

fn matches_query(record: &Value, query: &str) -> bool {
    match record {
        Value::String(text) => text.to_lowercase().contains(query),
        Value::Array(values) => values.iter().any(|value| matches_query(value, query)),
        Value::Object(fields) => fields.values().any(|value| matches_query(value, query)),
        _ => false,
    }
}

fn matches_facet(record: &Value, facet: &str, values: &[String]) -> bool {
    let matches_one = |value: &Value| match value {
        Value::String(text) => values.iter().any(|wanted| wanted == text),
        other => values.iter().any(|wanted| *wanted == other.to_string()),
    };
    match record.get(facet) {
        Some(Value::Array(items)) => items.iter().any(matches_one),
        Some(value) => matches_one(value),
        None => false,
    }
}

impl SearchClient for MemoryClient {
    fn search(&self, requests: &[SearchRequest]) -> Result<Vec<RawResult>, SearchError> {
        let serialized: Vec<Value> = requests.iter().map(SearchRequest::serialized).collect();
        if let Some(results) = self.cached(&serialized) {
            trace!(requests = requests.len(), "memory client cache hit");
            return Ok(results);
        }

        self.network_calls.fetch_add(1, Ordering::AcqRel);
        let results = requests
            .iter()
            .map(|request| self.run_query(request))
            .collect::<Result<Vec<_>, _>>()?;
        self.store(serialized, &results);
        Ok(results)
    }

    fn supports_agents(&self) -> bool {
        self.agents.is_some()
    }

    fn add_agent(&self, agent: &str) {
        if let Some(mut agents) = self.agent_list() {
            if !agents.iter().any(|existing| existing == agent) {
                debug!(agent, "registered client agent");
                agents.push(agent.to_owned());
            }
        }
    }

    fn responses_cache(&self) -> Option<&dyn ResponsesCache> {
        self.responses_cache
            .as_ref()
            .map(|cache| cache as &dyn ResponsesCache)
    }

    fn legacy_cache(&self) -> Option<&LegacyCache> {
        self.legacy_cache.as_ref()
    }

    fn read(&self, request: &ReadRequest) -> Result<Value, SearchError> {
        if request.path != GEOCODING_PATH {
            return Err(SearchError::Unsupported(request.path.clone()));
        }
        let query = request
            .data
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let predictions: Vec<&Value> = self
            .dataset
            .locations
            .iter()
            .filter(|location| query.is_empty() || matches_query(location, &query))
            .collect();
        Ok(json!({ "predictions": predictions }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vizion_widget_api::SearchParameters;

    fn dataset() -> Dataset {
        serde_json::from_value(json!({
            "indices": {
                "products": [
                    { "name": "Red shoe", "brand": "acme" },
                    { "name": "Blue shoe", "brand": "globex" },
                    { "name": "Red hat", "brand": "acme" }
                ]
            },
            "locations": [{ "name": "Montreal" }, { "name": "Toronto" }]
        }))
        .expect("dataset")
    }

    fn request(params: SearchParameters) -> SearchRequest {
        SearchRequest::new(params)
    }

    #[test]
    fn filters_by_query_and_facets() {
        let client = MemoryClient::new(dataset());
        let params = SearchParameters::new("products")
            .set_query("red")
            .add_facet_refinement("brand", "acme");

        let results = client.search(&[request(params)]).expect("search");

        assert_eq!(results[0].nb_hits, 2);
        assert_eq!(results[0].query, "red");
    }

    #[test]
    fn paginates_results() {
        let client = MemoryClient::new(dataset());
        let params = SearchParameters::new("products")
            .set_hits_per_page(2)
            .set_page(1);

        let results = client.search(&[request(params)]).expect("search");

        assert_eq!(results[0].nb_pages, 2);
        assert_eq!(results[0].hits.len(), 1);
        assert_eq!(results[0].hits[0]["name"], "Red hat");
    }

    #[test]
    fn unknown_index_is_an_error() {
        let client = MemoryClient::new(dataset());
        let error = client
            .search(&[request(SearchParameters::new("missing"))])
            .expect_err("missing index");
        assert_eq!(error, SearchError::UnknownIndex("missing".into()));
    }

    #[test]
    fn repeated_queries_are_served_from_cache() {
        for mode in [CacheMode::Structured, CacheMode::Legacy { enabled: true }] {
            let client = MemoryClient::with_cache(dataset(), mode);
            let requests = [request(SearchParameters::new("products"))];
            client.search(&requests).expect("first");
            client.search(&requests).expect("second");
            assert_eq!(client.network_calls(), 1, "{mode:?}");
        }
    }

    #[test]
    fn disabled_legacy_cache_always_hits_the_network() {
        let client = MemoryClient::with_cache(dataset(), CacheMode::Legacy { enabled: false });
        let requests = [request(SearchParameters::new("products"))];
        client.search(&requests).expect("first");
        client.search(&requests).expect("second");
        assert_eq!(client.network_calls(), 2);
    }

    #[test]
    fn geocoding_filters_locations() {
        let client = MemoryClient::new(dataset());
        let response = client
            .read(&ReadRequest {
                path: GEOCODING_PATH.into(),
                data: json!({ "query": "mont" }),
            })
            .expect("read");
        assert_eq!(response["predictions"], json!([{ "name": "Montreal" }]));
    }

    #[test]
    fn agents_are_deduplicated() {
        let client = MemoryClient::new(dataset());
        client.add_agent("vizion (1.0)");
        client.add_agent("vizion (1.0)");
        assert_eq!(client.agents(), vec!["vizion (1.0)".to_string()]);
        assert!(!client.without_agents().supports_agents());
    }
}
