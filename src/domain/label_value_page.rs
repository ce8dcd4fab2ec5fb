//! Label/value view of a fetched detail page
//!
//! The assessor markup carries no link between a label and its value other
//! than document order, so a page is reduced to an ordered run of nodes, each
//! either a label or a detail.

use std::collections::BTreeMap;

use super::property_detail::DetailField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Label,
    Detail,
}

/// One flattened markup node with its trimmed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub kind: NodeKind,
    pub text: String,
}

impl PageNode {
    pub fn label(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Label,
            text: text.into(),
        }
    }

    pub fn detail(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Detail,
            text: text.into(),
        }
    }
}

/// Request-scoped node sequence in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelValuePage {
    nodes: Vec<PageNode>,
}

impl LabelValuePage {
    pub fn new(nodes: Vec<PageNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[PageNode] {
        &self.nodes
    }
}

impl FromIterator<PageNode> for LabelValuePage {
    fn from_iter<I: IntoIterator<Item = PageNode>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Things the walk tolerated but could not use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionAnomalies {
    /// Label texts not present in the label table
    pub unknown_labels: Vec<String>,
    /// Detail values seen while no label was pending
    pub orphan_values: Vec<String>,
}

impl ExtractionAnomalies {
    pub fn is_empty(&self) -> bool {
        self.unknown_labels.is_empty() && self.orphan_values.is_empty()
    }
}

/// Canonical field → raw value. A present key with `None` means the label was
/// seen but no value followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDetails {
    values: BTreeMap<DetailField, Option<String>>,
    pub anomalies: ExtractionAnomalies,
}

impl ExtractedDetails {
    /// Register a label, resetting any earlier value to null
    pub fn open_field(&mut self, field: DetailField) {
        self.values.insert(field, None);
    }

    /// Assign a value to a field that was opened by a label.
    ///
    /// Returns false when the field was never opened.
    pub fn assign(&mut self, field: DetailField, value: String) -> bool {
        match self.values.get_mut(&field) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Raw value; absent and null are the same thing to callers
    pub fn get(&self, field: DetailField) -> Option<&str> {
        self.values.get(&field).and_then(|v| v.as_deref())
    }

    /// True if a label for the field was seen, whether or not a value followed
    pub fn contains(&self, field: DetailField) -> bool {
        self.values.contains_key(&field)
    }

    /// Number of recognized labels
    pub fn recognized(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DetailField, Option<&str>)> {
        self.values.iter().map(|(k, v)| (*k, v.as_deref()))
    }
}
