use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use vizion::widget_api::{ResultsState, SearchResults, SearchState, Widget};
use vizion::widgets::{Index, Pagination, PerPage, PerPageItem, RefinementList, SearchBox};
use vizion::{
    Dataset, InitialResults, LocalHelper, ManagerOptions, MemoryClient, SearchClient,
    VizionManager, hydration,
};

use crate::settings::ResolvedConfig;

/// Result of one search cycle, ready to print.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchOutcome {
    pub(crate) state: SearchState,
    pub(crate) indices: Vec<IndexOutcome>,
    pub(crate) error: Option<String>,
    pub(crate) stalled: bool,
    /// Searches the client could not answer from its cache.
    pub(crate) network_calls: usize,
    /// Feed back through `--initial-results` to answer the same search from
    /// cache.
    pub(crate) server_results: Option<InitialResults>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexOutcome {
    pub(crate) index_id: String,
    pub(crate) index_name: String,
    pub(crate) nb_hits: usize,
    /// 1-based.
    pub(crate) page: u32,
    pub(crate) nb_pages: u32,
    pub(crate) hits: Vec<Value>,
}

impl IndexOutcome {
    fn new(index_id: &str, results: &SearchResults) -> Self {
        Self {
            index_id: index_id.to_owned(),
            index_name: results.state().index().to_owned(),
            nb_hits: results.nb_hits(),
            page: results.page() + 1,
            nb_pages: results.nb_pages(),
            hits: results.hits().to_vec(),
        }
    }
}

/// Builds a coordinator from the resolved configuration and runs it until the
/// search settles.
pub(crate) struct SearchWorkflow {
    config: ResolvedConfig,
    client: Arc<MemoryClient>,
    initial_results: Option<InitialResults>,
}

impl SearchWorkflow {
    pub(crate) fn from_config(config: ResolvedConfig) -> Result<Self> {
        let dataset: Dataset = read_json(&config.dataset, "dataset")?;
        let initial_results = config
            .initial_results
            .as_deref()
            .map(|path| read_json::<InitialResults>(path, "initial results"))
            .transpose()?;
        let client = Arc::new(MemoryClient::with_cache(dataset, config.cache));
        Ok(Self {
            config,
            client,
            initial_results,
        })
    }

    pub(crate) fn run(self) -> Result<SearchOutcome> {
        let Self {
            config,
            client,
            initial_results,
        } = self;

        let widgets = WidgetSet::from_config(&config);
        let options = ManagerOptions::new(config.index.as_str())
            .with_initial_state(widgets.initial_state(&config))
            .with_results_state(initial_results)
            .with_stalled_search_delay(config.stalled_search_delay);
        let shared: Arc<dyn SearchClient> = client.clone();
        let mut manager = VizionManager::<LocalHelper>::local(options, shared);

        for widget in widgets.into_widgets() {
            manager.register_widget(widget)?;
        }

        if !manager.run_until_idle(config.timeout) {
            bail!(
                "search did not settle within {} ms",
                config.timeout.as_millis()
            );
        }

        let state = manager.store().get_state();
        if let Some(err) = &state.error {
            warn!(error = %err, "search failed");
        }
        let outcome = SearchOutcome {
            state: state.widgets.clone(),
            indices: index_outcomes(state.results.as_ref(), manager.index_name()),
            error: state.error.as_ref().map(ToString::to_string),
            stalled: state.is_search_stalled,
            network_calls: client.network_calls(),
            server_results: state.results.as_ref().map(hydration::server_results),
        };
        manager.teardown();
        debug!(indices = outcome.indices.len(), "search cycle complete");
        Ok(outcome)
    }
}

/// Widgets mounted for one run, in registration order.
struct WidgetSet {
    search_box: Rc<SearchBox>,
    pagination: Rc<Pagination>,
    per_page: Option<Rc<PerPage>>,
    facets: Vec<(Rc<RefinementList>, Vec<String>)>,
    indices: Vec<Rc<Index>>,
}

impl WidgetSet {
    fn from_config(config: &ResolvedConfig) -> Self {
        let per_page = config.per_page.map(|per_page| {
            let items = config
                .per_page_choices
                .iter()
                .map(|&value| PerPageItem::new(value, format!("{value} hits per page")))
                .collect();
            Rc::new(PerPage::new(items, per_page))
        });
        Self {
            search_box: Rc::new(SearchBox::new()),
            pagination: Rc::new(Pagination::new()),
            per_page,
            facets: config
                .facets
                .iter()
                .map(|(attribute, values)| {
                    (Rc::new(RefinementList::new(attribute.as_str())), values.clone())
                })
                .collect(),
            indices: config
                .secondary_indices
                .iter()
                .map(|name| Rc::new(Index::new(name.as_str())))
                .collect(),
        }
    }

    /// Refinements apply in an order that keeps the requested page: every
    /// other refinement resets it.
    fn initial_state(&self, config: &ResolvedConfig) -> SearchState {
        let mut state = SearchState::new();
        if !config.query.is_empty() {
            state = self.search_box.refine(state, config.query.as_str());
        }
        for (widget, values) in &self.facets {
            state = widget.refine(state, values.clone());
        }
        if let (Some(widget), Some(per_page)) = (&self.per_page, config.per_page) {
            state = widget.refine(state, per_page);
        }
        self.pagination.refine(state, config.page)
    }

    fn into_widgets(self) -> Vec<Rc<dyn Widget>> {
        let mut widgets: Vec<Rc<dyn Widget>> = Vec::new();
        widgets.push(self.search_box);
        widgets.push(self.pagination);
        if let Some(per_page) = self.per_page {
            widgets.push(per_page);
        }
        widgets.extend(self.facets.into_iter().map(|(widget, _)| widget as Rc<dyn Widget>));
        widgets.extend(self.indices.into_iter().map(|index| index as Rc<dyn Widget>));
        widgets
    }
}

fn index_outcomes(results: Option<&ResultsState>, main_index: &str) -> Vec<IndexOutcome> {
    match results {
        None => Vec::new(),
        Some(ResultsState::Single(results)) => vec![IndexOutcome::new(main_index, results)],
        Some(ResultsState::Multi(results)) => results
            .iter()
            .map(|(index_id, results)| IndexOutcome::new(index_id, results))
            .collect(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {what} {}", path.display()))
}
