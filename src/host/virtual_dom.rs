//! host::virtual_dom
//!
//! An in-memory [`Document`] with just enough structure to exercise the
//! element interceptor: a node arena, inline attributes and styles, click
//! dispatch with capture and bubble phases, and subtree observers.
//!
//! # Mutation Delivery
//!
//! Structural changes (append, remove, host re-render, clone replacement)
//! schedule one observer delivery on the tokio runtime. Changes made before
//! that delivery runs are coalesced into it, and observers never run inside
//! the call that caused the change. Attribute and style changes are not
//! structural and do not notify.
//!
//! # Example
//!
//! ```
//! use sso_bridge::host::{Document, Element, VirtualDom};
//!
//! let dom = VirtualDom::with_body();
//! let body = dom.body().unwrap();
//! let button = dom.append(body, "button", "Sign out").unwrap();
//!
//! let elements = dom.interactive_elements();
//! assert_eq!(elements.len(), 1);
//! assert_eq!(elements[0].text_content(), "Sign out");
//! assert!(dom.is_attached(button));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::dom::{ClickEvent, ClickHandler, Document, Element, ElementRef, ListenerPhase};
use super::page::Listener;

/// Node identifier within one [`VirtualDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Clone, Default)]
struct Node {
    tag: String,
    text: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(ListenerPhase, ClickHandler)>,
}

impl Node {
    fn is_interactive(&self) -> bool {
        self.tag == "button"
            || self.tag == "a"
            || self.attributes.get("role").map(String::as_str) == Some("button")
    }
}

#[derive(Default)]
struct DomInner {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    body: Option<NodeId>,
    observers: Vec<Listener>,
    delivery_scheduled: bool,
    deliveries: usize,
}

impl DomInner {
    fn insert(&mut self, node: Node) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if Some(node_id) == self.body {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent);
        }
        false
    }

    fn text_of(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(&id) else {
            return String::new();
        };
        let mut text = node.text.clone();
        for child in &node.children {
            text.push_str(&self.text_of(*child));
        }
        text
    }

    fn collect_interactive(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.is_interactive() {
            out.push(id);
        }
        for child in &node.children {
            self.collect_interactive(*child, out);
        }
    }

    /// Deep copy of the subtree at `id` without listeners. Returns the new root.
    fn clone_subtree(&mut self, id: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let source = self.nodes.get(&id)?.clone();
        let copy = self.insert(Node {
            tag: source.tag,
            text: source.text,
            attributes: source.attributes,
            styles: source.styles,
            parent,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        for child in source.children {
            if let Some(child_copy) = self.clone_subtree(child, Some(copy)) {
                if let Some(node) = self.nodes.get_mut(&copy) {
                    node.children.push(child_copy);
                }
            }
        }
        Some(copy)
    }

    /// Put `replacement` where `old` sits in its parent and detach `old`.
    fn swap_in_parent(&mut self, old: NodeId, replacement: NodeId) -> bool {
        let Some(parent) = self.nodes.get(&old).and_then(|n| n.parent) else {
            return false;
        };
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let Some(index) = parent_node.children.iter().position(|c| *c == old) else {
            return false;
        };
        parent_node.children[index] = replacement;
        if let Some(node) = self.nodes.get_mut(&replacement) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&old) {
            node.parent = None;
        }
        true
    }
}

/// In-memory document. Cloning shares the same tree.
#[derive(Clone, Default)]
pub struct VirtualDom {
    inner: Arc<Mutex<DomInner>>,
}

impl VirtualDom {
    /// A document whose body does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with an empty body.
    pub fn with_body() -> Self {
        let dom = Self::new();
        dom.attach_body();
        dom
    }

    fn lock(&self) -> Option<MutexGuard<'_, DomInner>> {
        self.inner.lock().ok()
    }

    /// Create the body if missing and return it.
    pub fn attach_body(&self) -> Option<NodeId> {
        let mut inner = self.lock()?;
        if let Some(body) = inner.body {
            return Some(body);
        }
        let body = inner.insert(Node {
            tag: "body".into(),
            ..Node::default()
        });
        inner.body = Some(body);
        Some(body)
    }

    pub fn body(&self) -> Option<NodeId> {
        self.lock().and_then(|i| i.body)
    }

    /// Append a `tag` element with own text `text` under `parent`.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn append(&self, parent: NodeId, tag: &str, text: &str) -> Option<NodeId> {
        let mut inner = self.lock()?;
        if !inner.nodes.contains_key(&parent) {
            return None;
        }
        let id = inner.insert(Node {
            tag: tag.into(),
            text: text.into(),
            parent: Some(parent),
            ..Node::default()
        });
        if let Some(node) = inner.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        self.schedule_delivery(&mut inner);
        Some(id)
    }

    /// Detach `id` from its parent.
    pub fn remove(&self, id: NodeId) {
        let Some(mut inner) = self.lock() else {
            return;
        };
        let Some(parent) = inner.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = inner.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = inner.nodes.get_mut(&id) {
            node.parent = None;
        }
        self.schedule_delivery(&mut inner);
    }

    /// Replace `id` with a fresh instance, the way the host re-renders a
    /// control. The new instance keeps tag, text, children and `role`; other
    /// attributes, inline styles and listeners are gone.
    pub fn rerender(&self, id: NodeId) -> Option<NodeId> {
        let mut inner = self.lock()?;
        let copy = inner.clone_subtree(id, None)?;
        if let Some(node) = inner.nodes.get_mut(&copy) {
            node.attributes.retain(|k, _| k == "role");
            node.styles.clear();
        }
        if !inner.swap_in_parent(id, copy) {
            return None;
        }
        self.schedule_delivery(&mut inner);
        Some(copy)
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.lock().as_mut().and_then(|i| i.nodes.get_mut(&id)) {
            node.attributes.insert(name.into(), value.into());
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.lock()?.nodes.get(&id)?.attributes.get(name).cloned()
    }

    pub fn set_style(&self, id: NodeId, property: &str, value: &str) {
        if let Some(node) = self.lock().as_mut().and_then(|i| i.nodes.get_mut(&id)) {
            node.styles.insert(property.into(), value.into());
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.lock()?.nodes.get(&id)?.styles.get(property).cloned()
    }

    /// Register a click listener directly on `id`.
    pub fn add_click_listener(&self, id: NodeId, phase: ListenerPhase, handler: ClickHandler) {
        if let Some(node) = self.lock().as_mut().and_then(|i| i.nodes.get_mut(&id)) {
            node.listeners.push((phase, handler));
        }
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.lock()
            .and_then(|i| i.nodes.get(&id).map(|n| n.listeners.len()))
            .unwrap_or(0)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.lock().map(|i| i.is_attached(id)).unwrap_or(false)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.lock().map(|i| i.text_of(id)).unwrap_or_default()
    }

    /// First attached interactive element whose text contains `needle`.
    pub fn find_by_text(&self, needle: &str) -> Option<NodeId> {
        let inner = self.lock()?;
        let body = inner.body?;
        let mut ids = Vec::new();
        inner.collect_interactive(body, &mut ids);
        let found = ids.into_iter().find(|id| inner.text_of(*id).contains(needle));
        found
    }

    /// Handle for `id`.
    pub fn element(&self, id: NodeId) -> Option<ElementRef> {
        let exists = self.lock()?.nodes.contains_key(&id);
        exists.then(|| Arc::new(VirtualElement { dom: self.clone(), id }) as ElementRef)
    }

    /// Dispatch a click at `target`: capture listeners root to target, then
    /// bubble listeners target to root.
    pub fn click(&self, target: NodeId) -> ClickEvent {
        let mut event = ClickEvent::new();
        let path = self.path_to_root(target);

        for id in path.iter().rev() {
            if !self.dispatch_at(*id, ListenerPhase::Capture, &mut event) {
                return event;
            }
        }
        for id in &path {
            if !self.dispatch_at(*id, ListenerPhase::Bubble, &mut event) {
                return event;
            }
        }
        event
    }

    /// Number of observer deliveries so far.
    pub fn deliveries(&self) -> usize {
        self.lock().map(|i| i.deliveries).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().map(|i| i.observers.len()).unwrap_or(0)
    }

    fn path_to_root(&self, target: NodeId) -> Vec<NodeId> {
        let Some(inner) = self.lock() else {
            return Vec::new();
        };
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            path.push(id);
            current = inner.nodes.get(&id).and_then(|n| n.parent);
        }
        path
    }

    /// Run `phase` listeners on `id`. Returns false once propagation stops.
    fn dispatch_at(&self, id: NodeId, phase: ListenerPhase, event: &mut ClickEvent) -> bool {
        let handlers: Vec<ClickHandler> = match self.lock() {
            Some(inner) => inner
                .nodes
                .get(&id)
                .map(|n| {
                    n.listeners
                        .iter()
                        .filter(|(p, _)| *p == phase)
                        .map(|(_, h)| h.clone())
                        .collect()
                })
                .unwrap_or_default(),
            None => return false,
        };
        for handler in handlers {
            handler(event);
            if event.immediate_propagation_stopped() {
                return false;
            }
        }
        !event.propagation_stopped()
    }

    fn schedule_delivery(&self, inner: &mut DomInner) {
        if inner.delivery_scheduled || inner.observers.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime; dropping mutation notification");
            return;
        };
        inner.delivery_scheduled = true;
        let shared = self.inner.clone();
        runtime.spawn(async move {
            let observers = match shared.lock() {
                Ok(mut inner) => {
                    inner.delivery_scheduled = false;
                    inner.deliveries += 1;
                    inner.observers.clone()
                }
                Err(_) => return,
            };
            for observer in observers {
                observer();
            }
        });
    }
}

impl Document for VirtualDom {
    fn has_body(&self) -> bool {
        self.body().is_some()
    }

    fn interactive_elements(&self) -> Vec<ElementRef> {
        let ids = match self.lock() {
            Some(inner) => match inner.body {
                Some(body) => {
                    let mut ids = Vec::new();
                    inner.collect_interactive(body, &mut ids);
                    ids
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        ids.into_iter()
            .map(|id| {
                Arc::new(VirtualElement {
                    dom: self.clone(),
                    id,
                }) as ElementRef
            })
            .collect()
    }

    fn observe_subtree(&self, callback: Listener) -> bool {
        match self.lock() {
            Some(mut inner) if inner.body.is_some() => {
                inner.observers.push(callback);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for VirtualDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (nodes, body) = self
            .lock()
            .map(|i| (i.nodes.len(), i.body))
            .unwrap_or((0, None));
        f.debug_struct("VirtualDom")
            .field("nodes", &nodes)
            .field("body", &body)
            .finish_non_exhaustive()
    }
}

/// Element handle into a [`VirtualDom`].
pub struct VirtualElement {
    dom: VirtualDom,
    id: NodeId,
}

impl VirtualElement {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Element for VirtualElement {
    fn text_content(&self) -> String {
        self.dom.text_content(self.id)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.dom.attribute(self.id, name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.dom.set_attribute(self.id, name, value);
    }

    fn style(&self, property: &str) -> Option<String> {
        self.dom.style(self.id, property)
    }

    fn remove_style(&self, property: &str) {
        if let Some(node) = self
            .dom
            .lock()
            .as_mut()
            .and_then(|i| i.nodes.get_mut(&self.id))
        {
            node.styles.remove(property);
        }
    }

    fn parent(&self) -> Option<ElementRef> {
        let parent = self.dom.lock()?.nodes.get(&self.id)?.parent?;
        self.dom.element(parent)
    }

    fn replace_with_clone(&self) -> Option<ElementRef> {
        let copy = {
            let mut inner = self.dom.lock()?;
            let copy = inner.clone_subtree(self.id, None)?;
            if !inner.swap_in_parent(self.id, copy) {
                return None;
            }
            self.dom.schedule_delivery(&mut inner);
            copy
        };
        self.dom.element(copy)
    }

    fn add_click_listener(&self, phase: ListenerPhase, handler: ClickHandler) {
        self.dom.add_click_listener(self.id, phase, handler);
    }
}

impl std::fmt::Debug for VirtualElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualElement")
            .field("id", &self.id)
            .finish()
    }
}
