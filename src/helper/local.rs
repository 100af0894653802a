use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use tracing::{debug, trace, warn};
use vizion_widget_api::{SearchParameters, SearchResults};

use super::events::{DerivedId, EventSink, Generation, HelperEvent, Pipeline};
use super::SearchHelper;
use crate::client::{SearchClient, SearchError, SearchRequest};

/// Commands understood by the background search worker.
enum WorkerCommand {
    /// Send every pipeline's request to `client` in one call.
    Search {
        generation: Generation,
        client: Arc<dyn SearchClient>,
        pipelines: Vec<(Pipeline, SearchParameters)>,
    },
    /// Stop the background worker thread.
    Shutdown,
}

type PendingCount = Arc<Mutex<usize>>;

fn lock(pending: &PendingCount) -> MutexGuard<'_, usize> {
    pending
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process [`SearchHelper`] running client calls on a worker thread.
///
/// The primary and derived pipelines of one search go out as a single client
/// call, in that order.
pub struct LocalHelper {
    client: Arc<dyn SearchClient>,
    state: SearchParameters,
    derived: Vec<DerivedId>,
    derived_parameters: Vec<SearchParameters>,
    next_derived: u64,
    pending: PendingCount,
    sink: EventSink,
    commands: Sender<WorkerCommand>,
}

impl LocalHelper {
    #[must_use]
    pub fn new(client: Arc<dyn SearchClient>, state: SearchParameters, sink: EventSink) -> Self {
        let pending = PendingCount::default();
        let commands = spawn(sink.clone(), Arc::clone(&pending));
        Self {
            client,
            state,
            derived: Vec::new(),
            derived_parameters: Vec::new(),
            next_derived: 0,
            pending,
            sink,
            commands,
        }
    }

    fn fail_all(&self, generation: Generation, pipelines: &[(Pipeline, SearchParameters)]) {
        for (pipeline, _) in pipelines {
            self.sink.emit(HelperEvent::Error {
                pipeline: *pipeline,
                generation,
                error: SearchError::Disconnected,
            });
        }
    }
}

impl SearchHelper for LocalHelper {
    fn state(&self) -> &SearchParameters {
        &self.state
    }

    fn set_state(&mut self, parameters: SearchParameters) {
        self.state = parameters;
    }

    fn search(&mut self, generation: Generation) {
        let mut pipelines = vec![(Pipeline::Main, self.state.clone())];
        pipelines.extend(
            self.derived
                .iter()
                .zip(&self.derived_parameters)
                .map(|(id, parameters)| (Pipeline::Derived(*id), parameters.clone())),
        );

        self.sink.emit(HelperEvent::Search { at: Instant::now() });
        *lock(&self.pending) += 1;
        debug!(generation, pipelines = pipelines.len(), "dispatching search");

        let command = WorkerCommand::Search {
            generation,
            client: Arc::clone(&self.client),
            pipelines,
        };
        if let Err(mpsc::SendError(command)) = self.commands.send(command) {
            warn!(generation, "search worker is gone");
            {
                let mut pending = lock(&self.pending);
                *pending = pending.saturating_sub(1);
            }
            if let WorkerCommand::Search { pipelines, .. } = command {
                self.fail_all(generation, &pipelines);
            }
        }
    }

    fn derive(&mut self, parameters: SearchParameters) -> DerivedId {
        self.next_derived = self.next_derived.wrapping_add(1);
        let id = DerivedId(self.next_derived);
        self.derived.push(id);
        self.derived_parameters.push(parameters);
        id
    }

    fn detach(&mut self, id: DerivedId) {
        if let Some(position) = self.derived.iter().position(|candidate| *candidate == id) {
            self.derived.remove(position);
            self.derived_parameters.remove(position);
        }
    }

    fn derived_helpers(&self) -> &[DerivedId] {
        &self.derived
    }

    fn has_pending_requests(&self) -> bool {
        *lock(&self.pending) > 0
    }

    fn set_client(&mut self, client: Arc<dyn SearchClient>) {
        self.client = client;
    }

    fn clear_cache(&mut self) {
        self.client.clear_cache();
    }

    fn shutdown(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
    }
}

impl Drop for LocalHelper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Launches the background search worker thread and returns its command channel.
fn spawn(sink: EventSink, pending: PendingCount) -> Sender<WorkerCommand> {
    let (command_tx, command_rx) = mpsc::channel();
    thread::spawn(move || worker_loop(&sink, &pending, command_rx));
    command_tx
}

fn worker_loop(sink: &EventSink, pending: &PendingCount, command_rx: Receiver<WorkerCommand>) {
    while let Ok(command) = command_rx.recv() {
        if !handle_command(sink, pending, command) {
            break;
        }
    }
    trace!("search worker stopped");
}

fn handle_command(sink: &EventSink, pending: &PendingCount, command: WorkerCommand) -> bool {
    match command {
        WorkerCommand::Search {
            generation,
            client,
            pipelines,
        } => {
            let requests: Vec<SearchRequest> = pipelines
                .iter()
                .map(|(_, parameters)| SearchRequest::new(parameters.clone()))
                .collect();
            let outcome = client.search(&requests).and_then(|raw| {
                if raw.len() == requests.len() {
                    Ok(raw)
                } else {
                    Err(SearchError::request(
                        requests
                            .first()
                            .map(|request| request.index_name.clone())
                            .unwrap_or_default(),
                        format!(
                            "client answered {} of {} requests",
                            raw.len(),
                            requests.len()
                        ),
                    ))
                }
            });

            // The count drops while the lock is held across emission, so a
            // reader that sees zero pending requests also sees every event.
            let mut pending = lock(pending);
            match outcome {
                Ok(raw) => {
                    for ((pipeline, parameters), raw) in pipelines.into_iter().zip(raw) {
                        sink.emit(HelperEvent::Result {
                            pipeline,
                            generation,
                            results: SearchResults::new(parameters, vec![raw]),
                        });
                    }
                }
                Err(error) => {
                    debug!(generation, %error, "search failed");
                    for (pipeline, _) in pipelines {
                        sink.emit(HelperEvent::Error {
                            pipeline,
                            generation,
                            error: error.clone(),
                        });
                    }
                }
            }
            *pending = pending.saturating_sub(1);
            true
        }
        WorkerCommand::Shutdown => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::client::{Dataset, MemoryClient};
    use crate::helper::event_channel;

    fn client() -> Arc<dyn SearchClient> {
        let dataset: Dataset = serde_json::from_value(json!({
            "indices": {
                "products": [{ "name": "shoe" }],
                "articles": [{ "title": "shoe care" }, { "title": "hats" }]
            }
        }))
        .expect("dataset");
        Arc::new(MemoryClient::new(dataset))
    }

    fn wait_idle(helper: &LocalHelper) {
        for _ in 0..500 {
            if !helper.has_pending_requests() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("helper never settled");
    }

    #[test]
    fn emits_search_then_one_result_per_pipeline() {
        let (sink, mut events) = event_channel();
        let mut helper = LocalHelper::new(client(), SearchParameters::new("products"), sink);
        let derived = helper.derive(SearchParameters::new("articles").set_query("shoe"));

        helper.search(7);
        wait_idle(&helper);

        assert!(matches!(events.try_next(), Some(HelperEvent::Search { .. })));
        let Some(HelperEvent::Result {
            pipeline,
            generation,
            results,
        }) = events.try_next()
        else {
            panic!("expected main result");
        };
        assert_eq!(pipeline, Pipeline::Main);
        assert_eq!(generation, 7);
        assert_eq!(results.nb_hits(), 1);

        let Some(HelperEvent::Result {
            pipeline, results, ..
        }) = events.try_next()
        else {
            panic!("expected derived result");
        };
        assert_eq!(pipeline, Pipeline::Derived(derived));
        assert_eq!(results.nb_hits(), 1);
        assert!(events.try_next().is_none());
    }

    #[test]
    fn failures_are_reported_on_every_pipeline() {
        let (sink, mut events) = event_channel();
        let mut helper = LocalHelper::new(client(), SearchParameters::new("missing"), sink);
        helper.derive(SearchParameters::new("articles"));

        helper.search(1);
        wait_idle(&helper);

        let errors: Vec<_> = std::iter::from_fn(|| events.try_next())
            .filter(|event| matches!(event, HelperEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn detach_removes_only_the_given_pipeline() {
        let (sink, _events) = event_channel();
        let mut helper = LocalHelper::new(client(), SearchParameters::new("products"), sink);
        let first = helper.derive(SearchParameters::new("a"));
        let second = helper.derive(SearchParameters::new("b"));

        helper.detach(first);
        helper.detach(first);

        assert_eq!(helper.derived_helpers(), &[second]);
    }
}
