//! Detail page extractor
//!
//! Two passes: `flatten` reduces markup to a [`LabelValuePage`], `walk` pairs
//! labels with the values that follow them.

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::DetailPageSelectors;
use super::error::{ParsingError, ParsingResult};
use crate::domain::{DetailField, ExtractedDetails, LabelValuePage, NodeKind, PageNode};

/// Walk state: either waiting for a label or holding the field the next value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    AwaitingLabel,
    HaveLabel(DetailField),
}

/// Extractor for assessor detail pages
#[derive(Debug)]
pub struct DetailExtractor {
    node_selector: Selector,
    label_class: String,
}

impl DetailExtractor {
    /// Extractor with the default `detail-row--*` selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_selectors(&DetailPageSelectors::default())
    }

    /// Compile the combined selector once; bad configuration fails here, not per page
    pub fn with_selectors(selectors: &DetailPageSelectors) -> ParsingResult<Self> {
        let combined = selectors.combined();
        for class in [&selectors.label_class, &selectors.detail_class] {
            if class.trim().is_empty() {
                return Err(ParsingError::MissingClass { selector: combined });
            }
        }

        let node_selector = Selector::parse(&combined)
            .map_err(|e| ParsingError::invalid_selector(&combined, e))?;

        Ok(Self {
            node_selector,
            label_class: selectors.label_class.clone(),
        })
    }

    /// Parse markup and extract labeled fields
    pub fn extract(&self, html: &str) -> ExtractedDetails {
        let page = self.flatten(html);
        Self::walk(&page)
    }

    /// Matching elements in document order; label class wins over detail class
    pub fn flatten(&self, html: &str) -> LabelValuePage {
        let document = Html::parse_document(html);

        document
            .select(&self.node_selector)
            .map(|element| {
                let text = Self::node_text(element);
                if self.is_label(element) {
                    PageNode::label(text)
                } else {
                    PageNode::detail(text)
                }
            })
            .collect()
    }

    fn is_label(&self, element: ElementRef<'_>) -> bool {
        element
            .value()
            .classes()
            .any(|class| class == self.label_class)
    }

    /// All descendant text, trimmed
    fn node_text(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    /// Pair labels with values.
    ///
    /// A recognized label opens its field as null. A detail fills the most
    /// recently opened field, overwriting any earlier value. Details with no
    /// open field and unrecognized labels are tallied as anomalies.
    pub fn walk(page: &LabelValuePage) -> ExtractedDetails {
        let mut details = ExtractedDetails::default();
        let mut state = WalkState::AwaitingLabel;

        for node in page.nodes() {
            state = match (node.kind, state) {
                (NodeKind::Label, current) => match DetailField::from_label(&node.text) {
                    Some(field) => {
                        details.open_field(field);
                        WalkState::HaveLabel(field)
                    }
                    None => {
                        debug!("Unknown label ignored: '{}'", node.text);
                        details.anomalies.unknown_labels.push(node.text.clone());
                        current
                    }
                },
                (NodeKind::Detail, WalkState::HaveLabel(field)) => {
                    details.assign(field, node.text.clone());
                    WalkState::HaveLabel(field)
                }
                (NodeKind::Detail, WalkState::AwaitingLabel) => {
                    debug!("Skipping value with no preceding label: '{}'", node.text);
                    details.anomalies.orphan_values.push(node.text.clone());
                    WalkState::AwaitingLabel
                }
            };
        }

        details
    }
}
