//! host - The surface the bridge runs against
//!
//! # Architecture
//!
//! The bridge never touches a concrete browser. Everything it needs from
//! its host goes through two traits:
//!
//! - [`Page`] - route fragment, navigation, readiness and page events
//! - [`Document`] / [`Element`] - interactive elements and click listeners
//!
//! [`HeadlessPage`] and [`VirtualDom`] are in-process implementations that
//! record what the bridge does. The CLI drives them against a real server;
//! tests drive them directly.

mod dom;
mod headless;
mod page;
mod virtual_dom;

pub use dom::{ClickEvent, ClickHandler, Document, Element, ElementRef, ListenerPhase};
pub use headless::{HeadlessPage, Navigation};
pub use page::{Listener, Page, PageEvent, ReadyState};
pub use virtual_dom::{NodeId, VirtualDom, VirtualElement};
