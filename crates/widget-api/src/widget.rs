use crate::{
    capabilities::WidgetDescriptor, metadata::Metadata, parameters::SearchParameters,
    state::SearchState,
};

/// A mounted unit contributing refinements to the search.
///
/// Only the hooks advertised by [`descriptor`](Self::descriptor) are called;
/// the defaults leave their input untouched.
pub trait Widget {
    /// Capabilities and scope. Read when the widget is registered and again
    /// whenever it reports a change.
    fn descriptor(&self) -> WidgetDescriptor;

    /// Describe the refinements currently applied from `state`.
    fn metadata(&self, _state: &SearchState) -> Metadata {
        Metadata::default()
    }

    /// Refine `parameters` according to `state`.
    fn search_parameters(&self, parameters: SearchParameters, _state: &SearchState) -> SearchParameters {
        parameters
    }

    /// Adjust an externally driven jump to `next` before it is committed.
    fn transition_state(&self, _current: &SearchState, next: SearchState) -> SearchState {
        next
    }
}
