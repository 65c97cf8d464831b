//! intercept::marker
//!
//! Per-instance stamp recording that an element has been rewritten. The
//! stamp is an attribute, so it lives and dies with the element instance.

use crate::host::Element;

/// Attribute carrying the stamp.
pub const MARKER_ATTRIBUTE: &str = "data-sso-intercepted";

const MARKER_VALUE: &str = "true";

pub fn is_marked(element: &dyn Element) -> bool {
    element.attribute(MARKER_ATTRIBUTE).as_deref() == Some(MARKER_VALUE)
}

pub fn stamp(element: &dyn Element) {
    element.set_attribute(MARKER_ATTRIBUTE, MARKER_VALUE);
}
