//! intercept::matcher
//!
//! Locale-aware matching of interactive elements against a rule.

use crate::host::{Element, ElementRef};

use super::rules::InterceptRule;

/// Attributes checked besides the text content.
pub const NAME_ATTRIBUTES: &[&str] = &["aria-label", "title"];

/// Whether the element's text or accessible name carries one of the rule's
/// labels. Visibility is not considered.
pub fn matches(element: &dyn Element, rule: &InterceptRule) -> bool {
    if rule.matches_text(&element.text_content()) {
        return true;
    }
    NAME_ATTRIBUTES
        .iter()
        .filter_map(|name| element.attribute(name))
        .any(|value| rule.matches_text(&value))
}

/// First visible candidate matching `rule`.
pub fn find_match(candidates: &[ElementRef], rule: &InterceptRule) -> Option<ElementRef> {
    candidates
        .iter()
        .find(|el| el.is_visible() && matches(el.as_ref(), rule))
        .cloned()
}

/// Every candidate matching `rule`, hidden ones included.
pub fn find_all(candidates: &[ElementRef], rule: &InterceptRule) -> Vec<ElementRef> {
    candidates
        .iter()
        .filter(|el| matches(el.as_ref(), rule))
        .cloned()
        .collect()
}
