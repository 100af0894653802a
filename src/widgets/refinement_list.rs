use serde_json::Value;
use vizion_widget_api::{
    Capabilities, Metadata, MetadataItem, Scope, SearchParameters, SearchState, Widget,
    WidgetDescriptor,
};

use super::single;

/// Facet filter. Records match when the facet equals any selected value.
#[derive(Clone, Debug)]
pub struct RefinementList {
    attribute: String,
    scope: Scope,
    default_refinement: Vec<String>,
}

impl RefinementList {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            scope: Scope::Global,
            default_refinement: Vec::new(),
        }
    }

    #[must_use]
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_default_refinement(mut self, values: Vec<String>) -> Self {
        self.default_refinement = values;
        self
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Selected values. A lone string counts as a single selection.
    #[must_use]
    pub fn current_refinement(&self, state: &SearchState) -> Vec<String> {
        match state.refinement(&self.scope, &self.attribute) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    Value::String(text) => Some(text.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(value)) if !value.is_empty() => vec![value.clone()],
            Some(_) => Vec::new(),
            None => self.default_refinement.clone(),
        }
    }

    #[must_use]
    pub fn refine(&self, state: SearchState, values: Vec<String>) -> SearchState {
        state.refine(&self.scope, single(&self.attribute, values), true)
    }

    /// Select `value`, or unselect it when already selected.
    #[must_use]
    pub fn toggle(&self, state: SearchState, value: &str) -> SearchState {
        let mut values = self.current_refinement(&state);
        match values.iter().position(|selected| selected == value) {
            Some(position) => {
                values.remove(position);
            }
            None => values.push(value.to_owned()),
        }
        self.refine(state, values)
    }

    #[must_use]
    pub fn clean_up(&self, state: SearchState) -> SearchState {
        state.clean_up(&self.scope, &self.attribute)
    }
}

impl Widget for RefinementList {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(Capabilities::METADATA | Capabilities::SEARCH_PARAMETERS)
            .with_scope(self.scope.clone())
    }

    fn metadata(&self, state: &SearchState) -> Metadata {
        self.current_refinement(state).into_iter().fold(
            Metadata::new(self.attribute.as_str()).with_index(self.scope.index_id()),
            |metadata, value| {
                let label = format!("{}: {value}", self.attribute);
                metadata.with_item(MetadataItem::new(label, value))
            },
        )
    }

    fn search_parameters(&self, parameters: SearchParameters, state: &SearchState) -> SearchParameters {
        self.current_refinement(state).into_iter().fold(
            parameters.clear_facet_refinements(&self.attribute),
            |parameters, value| parameters.add_facet_refinement(self.attribute.as_str(), value),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn toggling_adds_and_removes_values() {
        let widget = RefinementList::new("brand");

        let state = widget.toggle(SearchState::new(), "acme");
        let state = widget.toggle(state, "globex");
        assert_eq!(state.get("brand"), Some(&json!(["acme", "globex"])));

        let state = widget.toggle(state, "acme");
        assert_eq!(widget.current_refinement(&state), vec!["globex".to_string()]);
        assert_eq!(state.get("page"), Some(&json!(1)));
    }

    #[test]
    fn selections_become_facet_filters() {
        let widget = RefinementList::new("brand").with_default_refinement(vec!["acme".into()]);
        let parameters = SearchParameters::new("products").add_facet_refinement("brand", "stale");

        let parameters = widget.search_parameters(parameters, &SearchState::new());

        assert_eq!(
            parameters.facet_refinements().get("brand"),
            Some(&vec!["acme".to_string()])
        );
        assert_eq!(widget.metadata(&SearchState::new()).items[0].label, "brand: acme");
    }

    #[test]
    fn cleaning_up_restores_the_default() {
        let widget = RefinementList::new("brand").with_default_refinement(vec!["acme".into()]);
        let state = widget.refine(SearchState::new(), Vec::new());
        assert!(widget.current_refinement(&state).is_empty());

        let state = widget.clean_up(state);
        assert_eq!(widget.current_refinement(&state), vec!["acme".to_string()]);
    }
}
