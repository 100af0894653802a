use serde::{Deserialize, Serialize};
use vizion_widget_api::{
    Capabilities, Metadata, Scope, SearchParameters, SearchState, Widget, WidgetDescriptor,
};

use super::{number_refinement, single};

const ID: &str = "hitsPerPage";

/// One choice offered by a [`PerPage`] selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPageItem {
    pub value: u32,
    pub label: String,
}

impl PerPageItem {
    pub fn new(value: u32, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Hits-per-page selector restricted to a fixed list of choices.
#[derive(Clone, Debug)]
pub struct PerPage {
    scope: Scope,
    items: Vec<PerPageItem>,
    default_refinement: u32,
}

impl PerPage {
    /// Selector offering `items`, showing `default_refinement` until refined.
    #[must_use]
    pub fn new(items: Vec<PerPageItem>, default_refinement: u32) -> Self {
        Self {
            scope: Scope::Global,
            items,
            default_refinement,
        }
    }

    #[must_use]
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn items(&self) -> &[PerPageItem] {
        &self.items
    }

    fn is_allowed(&self, value: u32) -> bool {
        self.items.iter().any(|item| item.value == value)
    }

    #[must_use]
    pub fn current_refinement(&self, state: &SearchState) -> u32 {
        number_refinement(state, &self.scope, ID).unwrap_or(self.default_refinement)
    }

    /// State showing `value` hits per page, back on the first page.
    #[must_use]
    pub fn refine(&self, state: SearchState, value: u32) -> SearchState {
        state.refine(&self.scope, single(ID, value), true)
    }
}

impl Widget for PerPage {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(
            Capabilities::METADATA | Capabilities::SEARCH_PARAMETERS | Capabilities::TRANSITION_STATE,
        )
        .with_scope(self.scope.clone())
    }

    fn metadata(&self, _state: &SearchState) -> Metadata {
        Metadata::new(ID).with_index(self.scope.index_id())
    }

    fn search_parameters(&self, parameters: SearchParameters, state: &SearchState) -> SearchParameters {
        parameters.set_hits_per_page(self.current_refinement(state))
    }

    /// Values outside the offered choices keep the committed value.
    fn transition_state(&self, current: &SearchState, next: SearchState) -> SearchState {
        match number_refinement(&next, &self.scope, ID) {
            Some(value) if !self.is_allowed(value) => {
                let kept = self.current_refinement(current);
                next.refine(&self.scope, single(ID, kept), false)
            }
            _ => next,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn widget() -> PerPage {
        PerPage::new(
            vec![
                PerPageItem::new(2, "2 hits per page"),
                PerPageItem::new(4, "4 hits per page"),
                PerPageItem::new(6, "6 hits per page"),
            ],
            2,
        )
    }

    #[test]
    fn default_applies_until_refined() {
        let widget = widget();
        let parameters =
            widget.search_parameters(SearchParameters::new("p"), &SearchState::new());
        assert_eq!(parameters.hits_per_page(), Some(2));

        let state = widget.refine(SearchState::new().with("page", 3), 6);
        assert_eq!(widget.current_refinement(&state), 6);
        assert_eq!(state.get("page"), Some(&json!(1)));
    }

    #[test]
    fn transitions_to_unknown_values_are_refused() {
        let widget = widget();
        let current = widget.refine(SearchState::new(), 4);

        let next = widget.transition_state(&current, SearchState::new().with(ID, "100"));
        assert_eq!(widget.current_refinement(&next), 4);

        let next = widget.transition_state(&current, SearchState::new().with(ID, 6));
        assert_eq!(widget.current_refinement(&next), 6);

        let untouched = SearchState::new().with("query", "x");
        assert_eq!(widget.transition_state(&current, untouched.clone()), untouched);
    }
}
