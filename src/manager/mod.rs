//! Search coordinator tying widgets, the search helper and the store together.

mod auxiliary;
mod parameters;
mod stall;

pub use auxiliary::QUERY_SUGGESTIONS_INDEX;
pub use parameters::{DerivedParameters, ParameterPlan};
pub use stall::StallTimer;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};
use vizion_widget_api::{
    Capabilities, HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG, Metadata, ResultsState, SearchParameters,
    SearchResults, SearchState, Widget,
};

use self::auxiliary::{AuxiliaryLookups, LookupEvent, LookupKind};
use crate::client::{SearchClient, SearchError};
use crate::helper::{
    DerivedId, EventReceiver, Generation, HelperEvent, LocalHelper, Pipeline, SearchHelper,
    event_channel,
};
use crate::hydration::{InitialResults, hydrate_results_state, hydrate_search_client};
use crate::registry::{RegistryError, WidgetId, WidgetRegistry};
use crate::store::{AppState, Store};

/// Delay after which an unanswered search is reported as stalled.
pub const DEFAULT_STALLED_SEARCH_DELAY: Duration = Duration::from_millis(200);

const AGENT: &str = concat!("vizion (", env!("CARGO_PKG_VERSION"), ")");

/// Construction options for a [`VizionManager`].
#[derive(Clone, Debug)]
pub struct ManagerOptions {
    pub index_name: String,
    pub initial_state: SearchState,
    pub results_state: Option<InitialResults>,
    pub stalled_search_delay: Duration,
}

impl ManagerOptions {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            initial_state: SearchState::default(),
            results_state: None,
            stalled_search_delay: DEFAULT_STALLED_SEARCH_DELAY,
        }
    }

    #[must_use]
    pub fn with_initial_state(mut self, state: SearchState) -> Self {
        self.initial_state = state;
        self
    }

    #[must_use]
    pub fn with_results_state(mut self, results: Option<InitialResults>) -> Self {
        self.results_state = results;
        self
    }

    #[must_use]
    pub fn with_stalled_search_delay(mut self, delay: Duration) -> Self {
        self.stalled_search_delay = delay;
        self
    }
}

/// What a call to [`VizionManager::pump`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PumpReport {
    /// Helper and lookup events applied to the store.
    pub applied: usize,
    /// Helper events dropped because a newer search superseded them.
    pub discarded: usize,
    /// Lookup errors stored on an earlier turn, reported once here.
    pub surfaced_errors: Vec<SearchError>,
}

/// Coordinates one search session.
///
/// Widgets register through the manager. Each scheduled change recomputes
/// metadata and parameters and dispatches a search through the helper. Helper
/// events are applied to the [`Store`] when [`pump`](Self::pump) runs.
pub struct VizionManager<H: SearchHelper> {
    store: Store,
    registry: WidgetRegistry,
    helper: H,
    events: EventReceiver,
    client: Arc<dyn SearchClient>,
    main_index: String,
    base_parameters: SearchParameters,
    stalled_search_delay: Duration,
    stall: StallTimer,
    skip: bool,
    generation: Generation,
    latest: HashMap<String, Generation>,
    derived_indices: HashMap<DerivedId, String>,
    auxiliary: AuxiliaryLookups,
    deferred_errors: Vec<SearchError>,
    torn_down: bool,
}

impl VizionManager<LocalHelper> {
    /// Coordinator running searches through an in-process [`LocalHelper`].
    pub fn local(options: ManagerOptions, client: Arc<dyn SearchClient>) -> Self {
        let (sink, events) = event_channel();
        let parameters = SearchParameters::new(options.index_name.as_str())
            .set_highlight_tags(HIGHLIGHT_PRE_TAG, HIGHLIGHT_POST_TAG);
        let helper = LocalHelper::new(Arc::clone(&client), parameters, sink);
        Self::new(options, client, helper, events)
    }
}

impl<H: SearchHelper> VizionManager<H> {
    /// Build a coordinator around `helper`, whose events arrive on `events`.
    ///
    /// The helper's current parameters become the base every search starts
    /// from. The client is tagged and hydrated with `options.results_state`.
    pub fn new(
        options: ManagerOptions,
        client: Arc<dyn SearchClient>,
        helper: H,
        events: EventReceiver,
    ) -> Self {
        add_agents(client.as_ref());
        let hydration = hydrate_search_client(client.as_ref(), options.results_state.as_ref());
        debug!(index = %options.index_name, ?hydration, "creating search coordinator");

        let store = Store::new(AppState {
            widgets: options.initial_state,
            results: hydrate_results_state(options.results_state.as_ref()),
            is_search_stalled: true,
            ..AppState::default()
        });

        Self {
            store,
            registry: WidgetRegistry::new(),
            base_parameters: helper.state().clone(),
            helper,
            events,
            client,
            main_index: options.index_name,
            stalled_search_delay: options.stalled_search_delay,
            stall: StallTimer::default(),
            skip: false,
            generation: 0,
            latest: HashMap::new(),
            derived_indices: HashMap::new(),
            auxiliary: AuxiliaryLookups::new(),
            deferred_errors: Vec::new(),
            torn_down: false,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    #[must_use]
    pub fn helper(&self) -> &H {
        &self.helper
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.main_index
    }

    /// Generation of the most recently dispatched search.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn register_widget(&mut self, widget: Rc<dyn Widget>) -> Result<WidgetId, RegistryError> {
        self.registry.register(widget)
    }

    pub fn unregister_widget(&mut self, id: WidgetId) -> Result<(), RegistryError> {
        self.registry.unregister(id)
    }

    /// Report that a widget's inputs changed.
    pub fn widget_changed(&mut self, id: WidgetId) -> Result<(), RegistryError> {
        self.registry.widget_changed(id)
    }

    /// Run the update scheduled by registry changes, if any.
    ///
    /// Returns `true` when an update ran.
    pub fn flush(&mut self) -> bool {
        if !self.registry.take_scheduled_update() {
            return false;
        }
        self.on_widgets_update();
        true
    }

    /// Recompute metadata from the current widget state and search.
    pub fn on_widgets_update(&mut self) {
        let metadata = self.metadata(&self.store.get_state().widgets);
        self.store.update(|state| {
            state.metadata = metadata;
            state.searching = true;
        });
        self.search();
    }

    fn metadata(&self, state: &SearchState) -> Vec<Metadata> {
        self.registry
            .with_capability(Capabilities::METADATA)
            .map(|entry| entry.widget().metadata(state))
            .collect()
    }

    /// Parameters the next search would use.
    #[must_use]
    pub fn search_parameters(&self) -> ParameterPlan {
        parameters::assemble(
            self.registry.widgets(),
            &self.base_parameters,
            &self.main_index,
            &self.store.get_state().widgets,
        )
    }

    /// Dispatch the main and derived pipelines with fresh parameters.
    ///
    /// Derived pipelines of earlier searches are detached first, so only the
    /// latest search reports for secondary indices.
    pub fn search(&mut self) {
        if self.skip {
            debug!("search skipped");
            return;
        }

        let plan = self.search_parameters();

        for id in self.helper.derived_helpers().to_vec() {
            self.helper.detach(id);
        }
        self.derived_indices.clear();
        self.latest.clear();

        self.generation += 1;
        let generation = self.generation;
        for DerivedParameters {
            index_id,
            parameters,
        } in plan.derived
        {
            let id = self.helper.derive(parameters);
            self.latest.insert(index_id.clone(), generation);
            self.derived_indices.insert(id, index_id);
        }
        self.latest.insert(self.main_index.clone(), generation);

        debug!(
            generation,
            derived = self.derived_indices.len(),
            "dispatching search"
        );
        self.helper.set_state(plan.main);
        self.helper.search(generation);
    }

    /// Suspend searches, e.g. while the whole state is being replaced.
    pub fn skip_search(&mut self) {
        self.skip = true;
    }

    pub fn resume_search(&mut self) {
        self.skip = false;
    }

    #[must_use]
    pub fn is_search_skipped(&self) -> bool {
        self.skip
    }

    /// Switch to another client and search again.
    pub fn update_client(&mut self, client: Arc<dyn SearchClient>) {
        add_agents(client.as_ref());
        self.helper.set_client(Arc::clone(&client));
        self.client = client;
        self.auxiliary.reset();
        self.search();
    }

    /// Drop cached responses and search again.
    pub fn clear_cache(&mut self) {
        self.helper.clear_cache();
        self.search();
    }

    /// Change the index of the base parameters.
    ///
    /// No search is issued: widgets reporting the change trigger one.
    pub fn update_index(&mut self, index_name: impl Into<String>) {
        let index_name = index_name.into();
        debug!(index = %index_name, "updating base index");
        self.base_parameters = self.base_parameters.clone().set_index(index_name);
    }

    /// Fold `next` through every widget that may adjust state jumps.
    ///
    /// Each widget sees the committed state and the previous widget's output.
    #[must_use]
    pub fn transition_state(&self, next: SearchState) -> SearchState {
        let current = self.store.get_state();
        self.registry
            .with_capability(Capabilities::TRANSITION_STATE)
            .fold(next, |state, entry| {
                entry.widget().transition_state(&current.widgets, state)
            })
    }

    /// Commit an externally driven state jump and search.
    pub fn on_external_state_update(&mut self, next: SearchState) {
        let next = self.transition_state(next);
        let metadata = self.metadata(&next);
        self.store.update(|state| {
            state.widgets = next;
            state.metadata = metadata;
            state.searching = true;
        });
        self.search();
    }

    /// Ids of the widgets currently reporting metadata.
    #[must_use]
    pub fn widgets_ids(&self) -> Vec<String> {
        self.store
            .get_state()
            .metadata
            .iter()
            .filter_map(|metadata| metadata.id.clone())
            .collect()
    }

    /// Look up suggestions for `query` in the query-suggestions index.
    pub fn on_search_for_query_suggestions(
        &mut self,
        query: impl Into<String>,
        params: Map<String, Value>,
    ) {
        self.store
            .update(|state| state.searching_for_query_suggestions = true);
        self.auxiliary
            .search_query_suggestions(&self.client, query.into(), params);
    }

    /// Look up places matching `query` through the geocoding endpoint.
    pub fn on_search_for_locations(&mut self, query: impl Into<String>, params: Map<String, Value>) {
        self.store.update(|state| state.searching_for_locations = true);
        self.auxiliary
            .search_locations(&self.client, query.into(), params);
    }

    /// Apply everything that happened since the previous turn.
    ///
    /// Runs the scheduled widget update, applies lookup outcomes and helper
    /// events in arrival order and advances the stall timer to `now`.
    pub fn pump(&mut self, now: Instant) -> PumpReport {
        let mut report = PumpReport {
            surfaced_errors: std::mem::take(&mut self.deferred_errors),
            ..PumpReport::default()
        };
        for err in &report.surfaced_errors {
            error!(error = %err, "lookup failed");
        }

        self.flush();

        while let Some(event) = self.auxiliary.try_next() {
            self.handle_lookup(event);
            report.applied += 1;
        }

        while let Some(event) = self.events.try_next() {
            if self.handle_event(event) {
                report.applied += 1;
            } else {
                report.discarded += 1;
            }
        }

        self.tick(now);
        report
    }

    /// Advance the stall timer. Returns `true` when the search became stalled.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.stall.tick(now) {
            return false;
        }
        debug!(generation = self.generation, "search stalled");
        self.store.update(|state| state.is_search_stalled = true);
        true
    }

    /// Returns `true` once nothing is in flight or waiting to be applied.
    pub fn is_idle(&mut self) -> bool {
        !self.registry.has_scheduled_update()
            && !self.helper.has_pending_requests()
            && self.auxiliary.is_idle()
            && !self.events.has_pending()
            && self.deferred_errors.is_empty()
    }

    /// Pump until idle or until `timeout` elapses. Returns `true` when idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            self.pump(now);
            if self.is_idle() {
                return true;
            }
            if now >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop the stall timer and release the helper.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.stall.clear();
        for id in self.helper.derived_helpers().to_vec() {
            self.helper.detach(id);
        }
        self.derived_indices.clear();
        self.latest.clear();
        self.helper.shutdown();
        debug!("search coordinator torn down");
    }

    fn handle_event(&mut self, event: HelperEvent) -> bool {
        match event {
            HelperEvent::Search { at } => {
                self.handle_new_search(at);
                true
            }
            HelperEvent::Result {
                pipeline,
                generation,
                results,
            } => match self.accept(pipeline, generation) {
                Some(index_id) => {
                    self.handle_search_success(index_id, results);
                    true
                }
                None => {
                    self.discard(pipeline, generation);
                    false
                }
            },
            HelperEvent::Error {
                pipeline,
                generation,
                error,
            } => match self.accept(pipeline, generation) {
                Some(index_id) => {
                    self.handle_search_error(&index_id, error);
                    true
                }
                None => {
                    self.discard(pipeline, generation);
                    false
                }
            },
        }
    }

    /// Index an event applies to, or `None` when a newer search superseded it.
    fn accept(&self, pipeline: Pipeline, generation: Generation) -> Option<String> {
        let index_id = match pipeline {
            Pipeline::Main => self.main_index.clone(),
            Pipeline::Derived(id) => self.derived_indices.get(&id)?.clone(),
        };
        (self.latest.get(&index_id) == Some(&generation)).then_some(index_id)
    }

    fn discard(&mut self, pipeline: Pipeline, generation: Generation) {
        trace!(
            ?pipeline,
            generation,
            latest = self.generation,
            "discarding superseded search event"
        );
        if self.settle_stall() && self.store.get_state().is_search_stalled {
            self.store.update(|state| state.is_search_stalled = false);
        }
    }

    /// Reset the stall timer once nothing is in flight.
    fn settle_stall(&mut self) -> bool {
        if self.helper.has_pending_requests() {
            return false;
        }
        self.stall.clear();
        true
    }

    fn handle_new_search(&mut self, at: Instant) {
        if self.stall.arm(at, self.stalled_search_delay) {
            trace!(delay = ?self.stalled_search_delay, "stall timer armed");
        }
    }

    fn handle_search_success(&mut self, index_id: String, results: SearchResults) {
        let multi_index = !self.helper.derived_helpers().is_empty();
        let settled = self.settle_stall();
        trace!(index = %index_id, multi_index, settled, "applying search results");

        self.store.update(|state| {
            let next = if multi_index {
                // A single-index value left over from before the switch is dropped.
                let mut indices = match state.results.take() {
                    Some(ResultsState::Multi(indices)) => indices,
                    _ => IndexMap::new(),
                };
                indices.insert(index_id, results);
                ResultsState::Multi(indices)
            } else {
                ResultsState::Single(results)
            };
            state.results = Some(next);
            if settled {
                state.is_search_stalled = false;
            }
            state.error = None;
            state.searching = false;
        });
    }

    fn handle_search_error(&mut self, index_id: &str, err: SearchError) {
        warn!(index = %index_id, error = %err, "search failed");
        let settled = self.settle_stall();
        self.store.update(|state| {
            if settled {
                state.is_search_stalled = false;
            }
            state.error = Some(err);
            state.searching = false;
        });
    }

    fn handle_lookup(&mut self, event: LookupEvent) {
        let LookupEvent { kind, outcome } = event;
        match outcome {
            Ok(response) => self.store.update(|state| match kind {
                LookupKind::QuerySuggestions => {
                    state.searching_for_query_suggestions = false;
                    state.results_query_suggestions = Some(response);
                }
                LookupKind::Locations => {
                    state.searching_for_locations = false;
                    state.results_locations = Some(response);
                }
            }),
            Err(err) => {
                debug!(?kind, error = %err, "lookup failed");
                self.store.update(|state| {
                    match kind {
                        LookupKind::QuerySuggestions => {
                            state.searching_for_query_suggestions = false;
                        }
                        LookupKind::Locations => state.searching_for_locations = false,
                    }
                    state.error = Some(err.clone());
                });
                self.deferred_errors.push(err);
            }
        }
    }
}

impl<H: SearchHelper> Drop for VizionManager<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn add_agents(client: &dyn SearchClient) {
    client.add_agent(AGENT);
    client.add_agent(&format!("vizion-widget-api ({})", vizion_widget_api::VERSION));
}
