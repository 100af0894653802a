use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opening tag wrapped around highlighted matches.
pub const HIGHLIGHT_PRE_TAG: &str = "<vz-highlight-0000000000>";
/// Closing tag wrapped around highlighted matches.
pub const HIGHLIGHT_POST_TAG: &str = "</vz-highlight-0000000000>";

/// Full query configuration for one index.
///
/// Values are immutable: every setter consumes the parameters and returns an
/// updated copy, so widgets can be folded one after another.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParameters {
    index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    /// Zero-based page.
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hits_per_page: Option<u32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    facet_refinements: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight_pre_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight_post_tag: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, Value>,
}

impl SearchParameters {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    #[must_use]
    pub fn hits_per_page(&self) -> Option<u32> {
        self.hits_per_page
    }

    #[must_use]
    pub fn facet_refinements(&self) -> &BTreeMap<String, Vec<String>> {
        &self.facet_refinements
    }

    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    #[must_use]
    pub fn set_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    #[must_use]
    pub fn set_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn set_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn set_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = Some(hits_per_page);
        self
    }

    /// Add a facet value. Values of the same facet are OR-ed together.
    #[must_use]
    pub fn add_facet_refinement(mut self, facet: impl Into<String>, value: impl Into<String>) -> Self {
        let values = self.facet_refinements.entry(facet.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    #[must_use]
    pub fn clear_facet_refinements(mut self, facet: &str) -> Self {
        self.facet_refinements.remove(facet);
        self
    }

    #[must_use]
    pub fn set_highlight_tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.highlight_pre_tag = Some(pre.into());
        self.highlight_post_tag = Some(post.into());
        self
    }

    /// Set an arbitrary query parameter that has no dedicated setter.
    #[must_use]
    pub fn set_query_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Parameters sent alongside the index name, keyed by their wire name.
    #[must_use]
    pub fn query_parameters(&self) -> Map<String, Value> {
        let mut params = Map::new();
        for (key, value) in &self.extra {
            params.insert(key.clone(), value.clone());
        }
        if let Some(query) = &self.query {
            params.insert("query".into(), Value::from(query.as_str()));
        }
        if let Some(page) = self.page {
            params.insert("page".into(), Value::from(page));
        }
        if let Some(hits_per_page) = self.hits_per_page {
            params.insert("hitsPerPage".into(), Value::from(hits_per_page));
        }
        if !self.facet_refinements.is_empty() {
            let filters: Vec<Value> = self
                .facet_refinements
                .iter()
                .map(|(facet, values)| {
                    values
                        .iter()
                        .map(|value| Value::from(format!("{facet}:{value}")))
                        .collect()
                })
                .collect();
            params.insert("facetFilters".into(), Value::Array(filters));
        }
        if let Some(tag) = &self.highlight_pre_tag {
            params.insert("highlightPreTag".into(), Value::from(tag.as_str()));
        }
        if let Some(tag) = &self.highlight_post_tag {
            params.insert("highlightPostTag".into(), Value::from(tag.as_str()));
        }
        params
    }

    /// Wire form of [`query_parameters`](Self::query_parameters).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        serialize_query_parameters(&self.query_parameters())
    }
}

/// Encode parameters as `key=value` pairs joined with `&`.
///
/// Objects and arrays are JSON encoded, strings are used verbatim and every
/// key and value is percent-encoded. Both cache hydration and the client derive
/// cache keys from this form, so it must stay stable.
#[must_use]
pub fn serialize_query_parameters(parameters: &Map<String, Value>) -> String {
    parameters
        .iter()
        .map(|(key, value)| {
            let raw = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!("{}={}", urlencoding::encode(key), urlencoding::encode(&raw))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn setters_leave_the_original_untouched() {
        let base = SearchParameters::new("products");
        let refined = base.clone().set_page(2).set_hits_per_page(10);

        assert_eq!(base.page(), None);
        assert_eq!(refined.page(), Some(2));
        assert_eq!(refined.hits_per_page(), Some(10));
        assert_eq!(refined.index(), "products");
    }

    #[test]
    fn facet_values_are_deduplicated() {
        let params = SearchParameters::new("products")
            .add_facet_refinement("brand", "acme")
            .add_facet_refinement("brand", "acme")
            .add_facet_refinement("brand", "globex");

        assert_eq!(
            params.facet_refinements().get("brand"),
            Some(&vec!["acme".to_string(), "globex".to_string()])
        );
    }

    #[test]
    fn query_string_encodes_structured_values_as_json() {
        let params = SearchParameters::new("products")
            .set_query("red shoes")
            .add_facet_refinement("brand", "acme");

        assert_eq!(
            params.to_query_string(),
            "facetFilters=%5B%5B%22brand%3Aacme%22%5D%5D&query=red%20shoes"
        );
    }

    #[test]
    fn index_is_not_a_query_parameter() {
        let params = SearchParameters::new("products").set_page(0);
        assert!(!params.query_parameters().contains_key("index"));
        assert_eq!(params.to_query_string(), "page=0");
    }
}
