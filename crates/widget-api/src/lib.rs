pub mod capabilities;
pub mod metadata;
pub mod parameters;
pub mod results;
pub mod scope;
pub mod state;
pub mod widget;

pub use capabilities::{Capabilities, WidgetDescriptor};
pub use metadata::{Metadata, MetadataItem};
pub use parameters::{
    HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG, SearchParameters, serialize_query_parameters,
};
pub use results::{RawResult, ResultsState, SearchResults};
pub use scope::Scope;
pub use state::SearchState;
pub use widget::Widget;

/// Version of the widget API, reported as a client agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
