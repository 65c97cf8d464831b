//! host::dom
//!
//! The structural document view used by the element interceptor.
//!
//! # Element Identity
//!
//! An [`ElementRef`] names one element instance. When the host re-renders a
//! control it creates a new instance; handles to the old one stay readable
//! but are detached from the document.

use std::sync::Arc;

use super::page::Listener;

/// Shared handle to an element instance.
pub type ElementRef = Arc<dyn Element>;

/// Click listener.
pub type ClickHandler = Arc<dyn Fn(&mut ClickEvent) + Send + Sync>;

/// Dispatch phase a click listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    /// Runs on the way down, ahead of bubble-phase listeners.
    Capture,
    /// Runs on the way back up.
    Bubble,
}

/// A click being dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}

/// The host document.
pub trait Document: Send + Sync {
    /// Whether the document body exists yet.
    fn has_body(&self) -> bool;

    /// Interactive elements (buttons, links, `role="button"`) currently
    /// attached under the body, in document order.
    fn interactive_elements(&self) -> Vec<ElementRef>;

    /// Call `callback` after structural changes anywhere under the body.
    ///
    /// Returns false when there is no body to observe yet.
    fn observe_subtree(&self, callback: Listener) -> bool;
}

/// One element instance.
pub trait Element: Send + Sync {
    /// Concatenated text of the element and its descendants.
    fn text_content(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: &str);

    /// Inline style property value, if set.
    fn style(&self, property: &str) -> Option<String>;

    /// Remove an inline style property.
    fn remove_style(&self, property: &str);

    fn parent(&self) -> Option<ElementRef>;

    /// Replace this element in its parent with a deep structural copy that
    /// carries no event listeners. Returns the copy, or `None` if this
    /// element is detached.
    fn replace_with_clone(&self) -> Option<ElementRef>;

    fn add_click_listener(&self, phase: ListenerPhase, handler: ClickHandler);

    /// Whether inline styling leaves the element visible.
    fn is_visible(&self) -> bool {
        self.style("display").as_deref() != Some("none")
            && self.style("visibility").as_deref() != Some("hidden")
    }
}
