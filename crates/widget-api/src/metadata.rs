use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of the refinements a widget currently applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Search state key owned by the widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Index the refinements apply to, when scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default)]
    pub items: Vec<MetadataItem>,
}

impl Metadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: Option<&str>) -> Self {
        self.index = index.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: MetadataItem) -> Self {
        self.items.push(item);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub label: String,
    pub value: Value,
}

impl MetadataItem {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}
