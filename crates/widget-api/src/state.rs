use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scope::Scope;

const INDICES_KEY: &str = "indices";
const PAGE_KEY: &str = "page";

/// Refinements owned by the widgets, keyed by the widget's state key.
///
/// Refinements of index-scoped widgets are nested under
/// `indices.<index id>` so that two indices can carry different values for
/// the same key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchState(Map<String, Value>);

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a top-level value, returning the updated state.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn index_state(&self, index_id: &str) -> Option<&Map<String, Value>> {
        self.0
            .get(INDICES_KEY)
            .and_then(Value::as_object)
            .and_then(|indices| indices.get(index_id))
            .and_then(Value::as_object)
    }

    fn index_state_mut(&mut self, index_id: &str) -> &mut Map<String, Value> {
        let indices = object_entry(&mut self.0, INDICES_KEY);
        object_entry(indices, index_id)
    }

    /// Current refinement for `key` as seen by a widget with `scope`.
    #[must_use]
    pub fn refinement(&self, scope: &Scope, key: &str) -> Option<&Value> {
        match scope.index_id() {
            Some(index_id) => self.index_state(index_id)?.get(key),
            None => self.0.get(key),
        }
    }

    /// Merge `next` into the scope's refinements.
    ///
    /// With `reset_page` the scope's page goes back to the first page, which is
    /// what every refinement except pagination itself wants.
    #[must_use]
    pub fn refine(mut self, scope: &Scope, next: Map<String, Value>, reset_page: bool) -> Self {
        let target = match scope.index_id() {
            Some(index_id) => self.index_state_mut(index_id),
            None => &mut self.0,
        };
        for (key, value) in next {
            target.insert(key, value);
        }
        if reset_page {
            target.insert(PAGE_KEY.into(), Value::from(1));
        }
        self
    }

    /// Remove the refinement for `key` in the scope.
    #[must_use]
    pub fn clean_up(mut self, scope: &Scope, key: &str) -> Self {
        match scope.index_id() {
            Some(index_id) => {
                self.index_state_mut(index_id).remove(key);
            }
            None => {
                self.0.remove(key);
            }
        }
        self
    }
}

/// Object stored under `key`, replacing whatever non-object value was there.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(object) => object,
        _ => unreachable!("entry was just replaced by an object"),
    }
}

impl From<Map<String, Value>> for SearchState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(key: &str, value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.into(), value);
        map
    }

    #[test]
    fn global_refinements_live_at_the_top_level() {
        let state = SearchState::new().refine(&Scope::Global, one("query", json!("shoe")), true);

        assert_eq!(state.get("query"), Some(&json!("shoe")));
        assert_eq!(state.get("page"), Some(&json!(1)));
    }

    #[test]
    fn scoped_refinements_are_nested_per_index() {
        let a = Scope::targeting("a");
        let b = Scope::targeting("b");
        let state = SearchState::new()
            .refine(&a, one("query", json!("x")), false)
            .refine(&b, one("query", json!("y")), false);

        assert_eq!(state.refinement(&a, "query"), Some(&json!("x")));
        assert_eq!(state.refinement(&b, "query"), Some(&json!("y")));
        assert_eq!(state.refinement(&Scope::Global, "query"), None);
        assert_eq!(
            state.as_map().get("indices"),
            Some(&json!({ "a": { "query": "x" }, "b": { "query": "y" } }))
        );
    }

    #[test]
    fn clean_up_removes_only_the_scoped_key() {
        let a = Scope::targeting("a");
        let state = SearchState::new()
            .with("query", "top")
            .refine(&a, one("query", json!("x")), false)
            .clean_up(&a, "query");

        assert_eq!(state.refinement(&a, "query"), None);
        assert_eq!(state.get("query"), Some(&json!("top")));
    }

    #[test]
    fn malformed_index_entries_are_replaced() {
        let state = SearchState::new().with("indices", "oops").refine(
            &Scope::targeting("a"),
            one("page", json!(3)),
            false,
        );

        assert_eq!(
            state.refinement(&Scope::targeting("a"), "page"),
            Some(&json!(3))
        );
    }
}
