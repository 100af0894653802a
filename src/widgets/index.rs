use vizion_widget_api::{
    Capabilities, Scope, SearchParameters, SearchState, Widget, WidgetDescriptor,
};

/// Declares an index. Widgets targeting `index_id` search `index_name`.
#[derive(Clone, Debug)]
pub struct Index {
    index_name: String,
    index_id: String,
}

impl Index {
    /// Declaration searching `index_name`, identified by the same name.
    pub fn new(index_name: impl Into<String>) -> Self {
        let index_name = index_name.into();
        Self {
            index_id: index_name.clone(),
            index_name,
        }
    }

    /// Use a distinct id, so the same index can be declared more than once.
    #[must_use]
    pub fn with_id(mut self, index_id: impl Into<String>) -> Self {
        self.index_id = index_id.into();
        self
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[must_use]
    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    /// Scope for widgets nested under this declaration.
    #[must_use]
    pub fn target(&self) -> Scope {
        Scope::targeting(self.index_id.as_str())
    }
}

impl Widget for Index {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(Capabilities::SEARCH_PARAMETERS)
            .with_scope(Scope::single_index(self.index_id.as_str()))
    }

    fn search_parameters(&self, parameters: SearchParameters, _state: &SearchState) -> SearchParameters {
        parameters.set_index(self.index_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_its_id_and_searches_its_name() {
        let index = Index::new("articles").with_id("recent_articles");

        assert_eq!(
            index.descriptor().scope,
            Scope::single_index("recent_articles")
        );
        assert_eq!(index.target(), Scope::targeting("recent_articles"));
        assert_eq!(
            index
                .search_parameters(SearchParameters::new("products"), &SearchState::new())
                .index(),
            "articles"
        );
    }
}
