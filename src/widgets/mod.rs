//! Built-in widgets carrying the refinement logic of common search controls.
//!
//! Every widget reads and writes its refinement through
//! [`SearchState::refinement`] and [`SearchState::refine`], so the same widget
//! works at the top level and nested under an [`Index`] declaration.

mod index;
mod infinite_hits;
mod pagination;
mod per_page;
mod refinement_list;
mod search_box;

pub use index::Index;
pub use infinite_hits::{InfiniteHits, InfiniteHitsView};
pub use pagination::Pagination;
pub use per_page::{PerPage, PerPageItem};
pub use refinement_list::RefinementList;
pub use search_box::SearchBox;

use serde_json::{Map, Value};
use vizion_widget_api::{ResultsState, Scope, SearchResults, SearchState};

/// Results a widget with `scope` renders.
///
/// Widgets without an index of their own read the primary index's entry of
/// multi-index results.
#[must_use]
pub fn results_for<'a>(
    results: &'a ResultsState,
    scope: &Scope,
    main_index: &str,
) -> Option<&'a SearchResults> {
    results.for_index(scope.index_id().unwrap_or(main_index))
}

/// Numeric refinement for `key`, accepting numbers and numeric strings.
fn number_refinement(state: &SearchState, scope: &Scope, key: &str) -> Option<u32> {
    match state.refinement(scope, key)? {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn single(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut next = Map::new();
    next.insert(key.to_owned(), value.into());
    next
}
