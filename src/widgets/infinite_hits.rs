use std::cell::RefCell;

use serde::Serialize;
use serde_json::Value;
use vizion_widget_api::{
    Capabilities, Scope, SearchParameters, SearchResults, SearchState, Widget, WidgetDescriptor,
};

use super::{number_refinement, single};

const ID: &str = "page";
const POSITION_KEY: &str = "__position";
const QUERY_ID_KEY: &str = "__queryID";

/// Hits accumulated so far and whether more can be loaded.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfiniteHitsView {
    pub hits: Vec<Value>,
    pub has_previous: bool,
    pub has_more: bool,
}

#[derive(Debug, Default)]
struct Accumulated {
    hits: Vec<Value>,
    first_page: u32,
    last_page: u32,
    /// Parameters of the last received page, page excluded.
    parameters: Option<SearchParameters>,
}

/// Continuous list of hits, growing as further pages are loaded.
///
/// Pages received for the same parameters are appended or prepended; any other
/// change to the parameters starts a new list.
#[derive(Debug, Default)]
pub struct InfiniteHits {
    scope: Scope,
    accumulated: RefCell<Accumulated>,
}

impl InfiniteHits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Page currently requested, 1-based.
    #[must_use]
    pub fn current_refinement(&self, state: &SearchState) -> u32 {
        number_refinement(state, &self.scope, ID)
            .unwrap_or(1)
            .max(1)
    }

    /// Merge `results` into the accumulated hits.
    pub fn update(&self, results: Option<&SearchResults>) -> InfiniteHitsView {
        let Some(results) = results else {
            return InfiniteHitsView::default();
        };

        let page = results.page();
        let hits = decorate(results);
        let parameters = results.state().clone().set_page(0);

        let mut accumulated = self.accumulated.borrow_mut();
        if accumulated.parameters.as_ref() != Some(&parameters) {
            accumulated.hits = hits;
            accumulated.first_page = page;
            accumulated.last_page = page;
        } else if accumulated.last_page < page {
            accumulated.hits.extend(hits);
            accumulated.last_page = page;
        } else if accumulated.first_page > page {
            accumulated.hits.splice(0..0, hits);
            accumulated.first_page = page;
        }
        accumulated.parameters = Some(parameters);

        InfiniteHitsView {
            hits: accumulated.hits.clone(),
            has_previous: accumulated.first_page > 0,
            has_more: page.saturating_add(1) < results.nb_pages(),
        }
    }

    /// State loading the page after the last one received.
    #[must_use]
    pub fn refine_next(&self, state: SearchState) -> SearchState {
        let accumulated = self.accumulated.borrow();
        // Received pages are 0-based, the state is 1-based.
        let next = if accumulated.parameters.is_some() {
            accumulated.last_page + 2
        } else {
            self.current_refinement(&state) + 1
        };
        state.refine(&self.scope, single(ID, next), false)
    }

    /// State loading the page before the first one received.
    #[must_use]
    pub fn refine_previous(&self, state: SearchState) -> SearchState {
        let accumulated = self.accumulated.borrow();
        let previous = if accumulated.parameters.is_some() {
            accumulated.first_page.max(1)
        } else {
            self.current_refinement(&state).saturating_sub(1).max(1)
        };
        state.refine(&self.scope, single(ID, previous), false)
    }
}

/// Hits tagged with their absolute position and the query id, if any.
fn decorate(results: &SearchResults) -> Vec<Value> {
    let offset = results.page() as usize * results.hits_per_page() as usize;
    results
        .hits()
        .iter()
        .enumerate()
        .map(|(index, hit)| {
            let mut hit = hit.clone();
            if let Value::Object(fields) = &mut hit {
                fields.insert(POSITION_KEY.into(), Value::from(offset + index + 1));
                if let Some(query_id) = results.query_id() {
                    fields.insert(QUERY_ID_KEY.into(), Value::from(query_id));
                }
            }
            hit
        })
        .collect()
}

impl Widget for InfiniteHits {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(Capabilities::SEARCH_PARAMETERS).with_scope(self.scope.clone())
    }

    fn search_parameters(&self, parameters: SearchParameters, state: &SearchState) -> SearchParameters {
        parameters.set_page(self.current_refinement(state) - 1)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vizion_widget_api::RawResult;

    use super::*;

    fn page(parameters: SearchParameters, page: u32, names: &[&str]) -> SearchResults {
        SearchResults::new(
            parameters.set_page(page),
            vec![RawResult {
                hits: names.iter().map(|name| json!({ "name": name })).collect(),
                page,
                nb_pages: 3,
                hits_per_page: 2,
                query_id: Some("q-1".into()),
                ..RawResult::default()
            }],
        )
    }

    fn names(view: &InfiniteHitsView) -> Vec<&str> {
        view.hits
            .iter()
            .filter_map(|hit| hit["name"].as_str())
            .collect()
    }

    #[test]
    fn later_pages_are_appended_with_absolute_positions() {
        let widget = InfiniteHits::new();
        let base = SearchParameters::new("products").set_query("shoe");

        widget.update(Some(&page(base.clone(), 0, &["a", "b"])));
        let view = widget.update(Some(&page(base, 1, &["c", "d"])));

        assert_eq!(names(&view), vec!["a", "b", "c", "d"]);
        assert_eq!(view.hits[2][POSITION_KEY], json!(3));
        assert_eq!(view.hits[2][QUERY_ID_KEY], json!("q-1"));
        assert!(view.has_more);
        assert!(!view.has_previous);
    }

    #[test]
    fn earlier_pages_are_prepended() {
        let widget = InfiniteHits::new();
        let base = SearchParameters::new("products");

        let view = widget.update(Some(&page(base.clone(), 2, &["e"])));
        assert!(view.has_previous);
        assert!(!view.has_more);

        let view = widget.update(Some(&page(base, 1, &["c", "d"])));
        assert_eq!(names(&view), vec!["c", "d", "e"]);
    }

    #[test]
    fn new_parameters_restart_the_list() {
        let widget = InfiniteHits::new();
        widget.update(Some(&page(SearchParameters::new("products"), 0, &["a", "b"])));

        let view = widget.update(Some(&page(
            SearchParameters::new("products").set_query("hat"),
            0,
            &["z"],
        )));

        assert_eq!(names(&view), vec!["z"]);
        assert_eq!(widget.update(None), InfiniteHitsView::default());
    }

    #[test]
    fn refining_next_loads_after_the_last_received_page() {
        let widget = InfiniteHits::new();
        assert_eq!(
            widget.current_refinement(&widget.refine_next(SearchState::new())),
            2
        );

        widget.update(Some(&page(SearchParameters::new("products"), 1, &["c"])));
        let state = widget.refine_next(SearchState::new().with("query", "x"));

        assert_eq!(state.get("page"), Some(&json!(3)));
        assert_eq!(state.get("query"), Some(&json!("x")));
        assert_eq!(
            widget
                .search_parameters(SearchParameters::new("products"), &state)
                .page(),
            Some(2)
        );
        assert_eq!(
            widget.current_refinement(&widget.refine_previous(SearchState::new())),
            1
        );
    }
}
