//! Seeding a search client's cache with results rendered ahead of time, so the
//! first identical search is answered without a network round trip.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use vizion_widget_api::{RawResult, ResultsState, SearchParameters, SearchResults};

use crate::client::{CacheKey, LegacyCache, SearchClient};

/// Results of one index as produced by a previous render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResults {
    #[serde(
        rename = "_internalIndexId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_index_id: Option<String>,
    pub state: SearchParameters,
    pub raw_results: Vec<RawResult>,
}

impl ServerResults {
    /// Index id used as key in multi-index results.
    #[must_use]
    pub fn index_id(&self) -> &str {
        self.internal_index_id
            .as_deref()
            .unwrap_or_else(|| self.state.index())
    }
}

/// Previously rendered results in either single- or multi-index shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialResults {
    Multi(Vec<ServerResults>),
    Single(ServerResults),
}

impl InitialResults {
    fn entries(&self) -> &[ServerResults] {
        match self {
            Self::Multi(results) => results,
            Self::Single(results) => std::slice::from_ref(results),
        }
    }

    /// Requests a client would send to obtain these results, in wire form.
    fn requests(&self) -> Vec<Value> {
        self.raw_results()
            .map(|raw| json!({ "indexName": raw.index, "params": raw.params }))
            .collect()
    }

    fn raw_results(&self) -> impl Iterator<Item = &RawResult> + '_ {
        self.entries()
            .iter()
            .flat_map(|entry| entry.raw_results.iter())
    }

    fn payload(&self) -> Value {
        let results: Vec<&RawResult> = self.raw_results().collect();
        json!({ "results": results })
    }
}

/// How [`hydrate_search_client`] seeded the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Nothing to hydrate, or the client exposes no usable cache.
    Skipped,
    /// Stored in the client's structured responses cache.
    Structured,
    /// Stored in the client's flat legacy cache.
    Legacy,
}

/// Populate the client's cache with `results`.
///
/// Hydration is an optimization and never fails: clients without a usable
/// cache are left untouched.
pub fn hydrate_search_client(
    client: &dyn SearchClient,
    results: Option<&InitialResults>,
) -> HydrationOutcome {
    let Some(results) = results else {
        return HydrationOutcome::Skipped;
    };

    if let Some(cache) = client.responses_cache() {
        cache.set(&CacheKey::search(results.requests()), results.payload());
        debug!(
            requests = results.raw_results().count(),
            "hydrated responses cache"
        );
        return HydrationOutcome::Structured;
    }

    match client.legacy_cache() {
        Some(cache) if cache.is_enabled() && client.supports_agents() => {
            cache.insert(
                LegacyCache::queries_key(&results.requests()),
                results.payload().to_string(),
            );
            debug!(
                requests = results.raw_results().count(),
                "hydrated legacy cache"
            );
            HydrationOutcome::Legacy
        }
        _ => {
            debug!("client exposes no cache to hydrate");
            HydrationOutcome::Skipped
        }
    }
}

/// Results state matching `results`, shaped like the render that produced it.
#[must_use]
pub fn hydrate_results_state(results: Option<&InitialResults>) -> Option<ResultsState> {
    let to_results =
        |entry: &ServerResults| SearchResults::new(entry.state.clone(), entry.raw_results.clone());

    match results? {
        InitialResults::Single(entry) => Some(ResultsState::Single(to_results(entry))),
        InitialResults::Multi(entries) => Some(ResultsState::Multi(
            entries
                .iter()
                .map(|entry| (entry.index_id().to_owned(), to_results(entry)))
                .collect::<IndexMap<_, _>>(),
        )),
    }
}

/// Capture a results state so a later session can be hydrated with it.
#[must_use]
pub fn server_results(results: &ResultsState) -> InitialResults {
    let to_server = |index_id: Option<&str>, results: &SearchResults| ServerResults {
        internal_index_id: index_id.map(str::to_owned),
        state: results.state().clone(),
        raw_results: results.raw_results().to_vec(),
    };

    match results {
        ResultsState::Single(results) => InitialResults::Single(to_server(None, results)),
        ResultsState::Multi(results) => InitialResults::Multi(
            results
                .iter()
                .map(|(index_id, results)| to_server(Some(index_id), results))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::{CacheMode, Dataset, MemoryClient, SearchRequest};

    fn dataset() -> Dataset {
        serde_json::from_value(json!({
            "indices": {
                "products": [{ "name": "red shoe" }, { "name": "blue hat" }],
                "articles": [{ "title": "shoe care" }]
            }
        }))
        .expect("dataset")
    }

    fn render(client: &MemoryClient, requests: &[SearchRequest]) -> InitialResults {
        let raw = client.search(requests).expect("search");
        let entries: Vec<ServerResults> = requests
            .iter()
            .zip(raw)
            .map(|(request, raw)| ServerResults {
                internal_index_id: Some(request.index_name.clone()),
                state: request.params.clone(),
                raw_results: vec![raw],
            })
            .collect();
        match <[ServerResults; 1]>::try_from(entries) {
            Ok([single]) => InitialResults::Single(ServerResults {
                internal_index_id: None,
                ..single
            }),
            Err(entries) => InitialResults::Multi(entries),
        }
    }

    fn requests() -> Vec<SearchRequest> {
        vec![
            SearchRequest::new(SearchParameters::new("products").set_query("shoe")),
            SearchRequest::new(SearchParameters::new("articles").set_query("shoe")),
        ]
    }

    #[test]
    fn structured_cache_answers_the_next_identical_search() {
        let server = MemoryClient::new(dataset());
        let initial = render(&server, &requests());

        let client = MemoryClient::new(dataset());
        let outcome = hydrate_search_client(&client, Some(&initial));
        let raw = client.search(&requests()).expect("search");

        assert_eq!(outcome, HydrationOutcome::Structured);
        assert_eq!(client.network_calls(), 0);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].nb_hits, 1);
    }

    #[test]
    fn legacy_cache_is_keyed_like_the_client() {
        let single = vec![SearchRequest::new(
            SearchParameters::new("products").set_hits_per_page(1),
        )];
        let server = MemoryClient::new(dataset());
        let initial = render(&server, &single);

        let client = MemoryClient::with_cache(dataset(), CacheMode::Legacy { enabled: true });
        let outcome = hydrate_search_client(&client, Some(&initial));
        client.search(&single).expect("search");

        assert_eq!(outcome, HydrationOutcome::Legacy);
        assert_eq!(client.network_calls(), 0);
        assert_eq!(client.legacy_cache().map(LegacyCache::len), Some(1));
    }

    #[test]
    fn unusable_clients_are_skipped() {
        let initial = render(&MemoryClient::new(dataset()), &requests());
        let disabled = MemoryClient::with_cache(dataset(), CacheMode::Legacy { enabled: false });
        let anonymous =
            MemoryClient::with_cache(dataset(), CacheMode::Legacy { enabled: true }).without_agents();
        let uncached = MemoryClient::with_cache(dataset(), CacheMode::None);

        for client in [disabled, anonymous, uncached] {
            assert_eq!(
                hydrate_search_client(&client, Some(&initial)),
                HydrationOutcome::Skipped
            );
        }
        assert_eq!(
            hydrate_search_client(&MemoryClient::new(dataset()), None),
            HydrationOutcome::Skipped
        );
    }

    #[test]
    fn results_state_follows_the_rendered_shape() {
        let client = MemoryClient::new(dataset());
        let multi = render(&client, &requests());
        let single = render(&client, &requests()[..1]);

        let Some(ResultsState::Multi(indices)) = hydrate_results_state(Some(&multi)) else {
            panic!("expected multi-index results");
        };
        assert_eq!(
            indices.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["products", "articles"]
        );
        assert!(matches!(
            hydrate_results_state(Some(&single)),
            Some(ResultsState::Single(_))
        ));
        assert_eq!(hydrate_results_state(None), None);
    }

    #[test]
    fn captured_results_hydrate_a_new_session() {
        let client = MemoryClient::new(dataset());
        let initial = render(&client, &requests());
        let state = hydrate_results_state(Some(&initial)).expect("results");

        assert_eq!(server_results(&state), initial);
    }

    #[test]
    fn server_payload_deserializes_in_both_shapes() {
        let single: InitialResults = serde_json::from_value(json!({
            "state": { "index": "products" },
            "rawResults": [{ "index": "products", "params": "" }]
        }))
        .expect("single");
        let multi: InitialResults = serde_json::from_value(json!([{
            "_internalIndexId": "articles",
            "state": { "index": "articles" },
            "rawResults": []
        }]))
        .expect("multi");

        assert!(matches!(single, InitialResults::Single(_)));
        let InitialResults::Multi(entries) = multi else {
            panic!("expected multi-index payload");
        };
        assert_eq!(entries[0].index_id(), "articles");
        let client: Arc<dyn SearchClient> = Arc::new(MemoryClient::new(dataset()));
        assert_eq!(
            hydrate_search_client(client.as_ref(), Some(&InitialResults::Multi(entries))),
            HydrationOutcome::Structured
        );
    }
}
