use vizion_widget_api::{
    Capabilities, Metadata, Scope, SearchParameters, SearchResults, SearchState, Widget,
    WidgetDescriptor,
};

use super::{number_refinement, single};

const ID: &str = "page";

/// Page selector. Pages are 1-based in the search state and 0-based in the
/// search parameters.
#[derive(Clone, Debug, Default)]
pub struct Pagination {
    scope: Scope,
}

impl Pagination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn current_refinement(&self, state: &SearchState) -> u32 {
        number_refinement(state, &self.scope, ID)
            .unwrap_or(1)
            .max(1)
    }

    /// State showing `page`. Changing page keeps every other refinement.
    #[must_use]
    pub fn refine(&self, state: SearchState, page: u32) -> SearchState {
        state.refine(&self.scope, single(ID, page.max(1)), false)
    }

    /// Number of pages available in `results`.
    #[must_use]
    pub fn nb_pages(results: Option<&SearchResults>) -> u32 {
        results.map_or(0, SearchResults::nb_pages)
    }

    /// Returns `true` when there is more than one page to choose from.
    #[must_use]
    pub fn can_refine(results: Option<&SearchResults>) -> bool {
        Self::nb_pages(results) > 1
    }
}

impl Widget for Pagination {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(Capabilities::METADATA | Capabilities::SEARCH_PARAMETERS)
            .with_scope(self.scope.clone())
    }

    fn metadata(&self, _state: &SearchState) -> Metadata {
        Metadata::new(ID).with_index(self.scope.index_id())
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

    #[test]
    fn pages_are_zero_based_on_the_wire() {
        let widget = Pagination::new();

        let first = widget.search_parameters(SearchParameters::new("p"), &SearchState::new());
        let third = widget.search_parameters(
            SearchParameters::new("p"),
            &widget.refine(SearchState::new(), 3),
        );

        assert_eq!(first.page(), Some(0));
        assert_eq!(third.page(), Some(2));
    }

    #[test]
    fn string_pages_from_urls_are_understood() {
        let widget = Pagination::new();
        let state = SearchState::new().with("page", "5");
        assert_eq!(widget.current_refinement(&state), 5);

        let state = SearchState::new().with("page", json!(0));
        assert_eq!(widget.current_refinement(&state), 1);
    }

    #[test]
    fn refining_keeps_other_refinements() {
        let widget = Pagination::new().scoped(Scope::targeting("articles"));
        let state = SearchState::new().refine(
            &Scope::targeting("articles"),
            serde_json::Map::from_iter([("query".to_string(), json!("care"))]),
            true,
        );

        let state = widget.refine(state, 2);

        assert_eq!(state.get("indices"), Some(&json!({ "articles": { "query": "care", "page": 2 } })));
    }

    #[test]
    fn refinement_is_possible_with_several_pages() {
        let results = SearchResults::new(
            SearchParameters::new("p"),
            vec![RawResult {
                nb_pages: 3,
                ..RawResult::default()
            }],
        );
        assert_eq!(Pagination::nb_pages(Some(&results)), 3);
        assert!(Pagination::can_refine(Some(&results)));
        assert!(!Pagination::can_refine(None));
    }
}
