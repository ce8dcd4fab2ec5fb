//! Selector configuration for assessor detail pages

use serde::{Deserialize, Serialize};

/// Class and tag names that make up the label/value grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailPageSelectors {
    /// Class carried by label elements
    pub label_class: String,

    /// Class carried by value elements
    pub detail_class: String,

    /// Element names either class may appear on
    pub tags: Vec<String>,
}

impl Default for DetailPageSelectors {
    fn default() -> Self {
        Self {
            label_class: "detail-row--label".to_string(),
            detail_class: "detail-row--detail".to_string(),
            tags: vec!["div".to_string(), "span".to_string()],
        }
    }
}

impl DetailPageSelectors {
    /// Combined selector, labels before details for each tag:
    /// `div.detail-row--label, span.detail-row--label, div.detail-row--detail, ...`
    pub fn combined(&self) -> String {
        let labels = self.tags.iter().map(|tag| format!("{tag}.{}", self.label_class));
        let details = self.tags.iter().map(|tag| format!("{tag}.{}", self.detail_class));
        labels.chain(details).collect::<Vec<_>>().join(", ")
    }
}
