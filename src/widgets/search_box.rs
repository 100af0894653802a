use serde_json::Value;
use vizion_widget_api::{
    Capabilities, Metadata, MetadataItem, Scope, SearchParameters, SearchState, Widget,
    WidgetDescriptor,
};

use super::single;

const ID: &str = "query";

/// Free-text query input.
#[derive(Clone, Debug, Default)]
pub struct SearchBox {
    scope: Scope,
    default_refinement: Option<String>,
}

impl SearchBox {
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
    pub fn with_default_refinement(mut self, query: impl Into<String>) -> Self {
        self.default_refinement = Some(query.into());
        self
    }

    /// Query currently typed in, falling back to the default refinement.
    #[must_use]
    pub fn current_refinement(&self, state: &SearchState) -> String {
        match state.refinement(&self.scope, ID) {
            Some(Value::String(query)) => query.clone(),
            Some(Value::Null) | None => self.default_refinement.clone().unwrap_or_default(),
            Some(other) => other.to_string(),
        }
    }

    /// State with `query` typed in. Any refinement change starts from page 1.
    #[must_use]
    pub fn refine(&self, state: SearchState, query: impl Into<String>) -> SearchState {
        state.refine(&self.scope, single(ID, query.into()), true)
    }

    #[must_use]
    pub fn clean_up(&self, state: SearchState) -> SearchState {
        state.clean_up(&self.scope, ID)
    }
}

impl Widget for SearchBox {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(Capabilities::METADATA | Capabilities::SEARCH_PARAMETERS)
            .with_scope(self.scope.clone())
    }

    fn metadata(&self, state: &SearchState) -> Metadata {
        let query = self.current_refinement(state);
        let metadata = Metadata::new(ID).with_index(self.scope.index_id());
        if query.is_empty() {
            return metadata;
        }
        metadata.with_item(MetadataItem::new(format!("{ID}: {query}"), query))
    }

    fn search_parameters(&self, parameters: SearchParameters, state: &SearchState) -> SearchParameters {
        parameters.set_query(self.current_refinement(state))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn refining_sets_the_query_and_resets_the_page() {
        let widget = SearchBox::new();
        let state = SearchState::new().with("page", 4);

        let state = widget.refine(state, "shoes");

        assert_eq!(state.get("query"), Some(&json!("shoes")));
        assert_eq!(state.get("page"), Some(&json!(1)));
        assert_eq!(
            widget
                .search_parameters(SearchParameters::new("products"), &state)
                .query(),
            Some("shoes")
        );
    }

    #[test]
    fn scoped_queries_stay_under_their_index() {
        let widget = SearchBox::new().scoped(Scope::targeting("articles"));

        let state = widget.refine(SearchState::new(), "care");

        assert_eq!(state.get("query"), None);
        assert_eq!(widget.current_refinement(&state), "care");
        assert_eq!(widget.metadata(&state).index.as_deref(), Some("articles"));
    }

    #[test]
    fn default_refinement_applies_until_cleaned_up() {
        let widget = SearchBox::new().with_default_refinement("hats");
        assert_eq!(widget.current_refinement(&SearchState::new()), "hats");

        let state = widget.clean_up(widget.refine(SearchState::new(), "shoes"));
        assert_eq!(widget.current_refinement(&state), "hats");
        assert_eq!(widget.metadata(&state).items.len(), 1);
        assert!(
            SearchBox::new()
                .metadata(&SearchState::new())
                .items
                .is_empty()
        );
    }
}
