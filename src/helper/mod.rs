//! Search helper abstraction: the component that turns parameters into client
//! requests and reports their outcome as [`HelperEvent`]s.

mod events;
mod local;

pub use events::{
    DerivedId, EventReceiver, EventSink, Generation, HelperEvent, Pipeline, event_channel,
};
pub use local::LocalHelper;

use std::sync::Arc;

use vizion_widget_api::SearchParameters;

use crate::client::SearchClient;

/// Issues searches for a primary pipeline and any number of derived ones.
///
/// Implementations report progress through the [`EventSink`] they were built
/// with. Every event of a search carries the generation passed to
/// [`search`](Self::search).
pub trait SearchHelper {
    /// Parameters of the primary pipeline.
    fn state(&self) -> &SearchParameters;

    fn set_state(&mut self, parameters: SearchParameters);

    /// Dispatch the primary pipeline and every attached derived pipeline.
    fn search(&mut self, generation: Generation);

    /// Attach a derived pipeline searching with `parameters`.
    fn derive(&mut self, parameters: SearchParameters) -> DerivedId;

    /// Detach a derived pipeline. Its pending responses are no longer
    /// meaningful. Unknown ids are ignored.
    fn detach(&mut self, id: DerivedId);

    /// Currently attached derived pipelines, in attachment order.
    fn derived_helpers(&self) -> &[DerivedId];

    /// Returns `true` while a dispatched search has not answered.
    fn has_pending_requests(&self) -> bool;

    fn set_client(&mut self, client: Arc<dyn SearchClient>);

    fn clear_cache(&mut self);

    /// Release background resources. Called once on coordinator teardown.
    fn shutdown(&mut self) {}
}
