//! Component module - the explicit registry of live components.
//!
//! The host registers exactly the instances this subsystem should see.
//! Registering the first instance of a type runs its [`Component::declare`]
//! once and records the class tags; every instance gets its methods bound to
//! itself.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aixpand_gateway::component::{ComponentRegistry, ComponentScanner};
//! use aixpand_gateway::metadata::Declaration;
//! use aixpand_gateway::router::Arguments;
//! use aixpand_gateway::Component;
//!
//! struct Alerts;
//!
//! impl Component for Alerts {
//!     fn declare(decl: &mut Declaration<'_, Self>) {
//!         decl.gateway();
//!         decl.method("on_alert", |_: &Self, _: Arguments| {}).payload("ALERT");
//!     }
//! }
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register(Arc::new(Alerts));
//!
//! let scanner = ComponentScanner::new(&registry);
//! assert_eq!(scanner.list_gateways().len(), 1);
//! ```

mod registry;
mod scanner;

pub use registry::{BoundMethod, BoundProperty, Callback, ComponentHandle, ComponentRegistry};
pub use scanner::ComponentScanner;

use crate::metadata::Declaration;

/// A component type that can be registered and explored.
pub trait Component: Sized + Send + Sync + 'static {
    /// Declare handlers, parameter roles and client properties.
    ///
    /// Called once per type, before any instance is explored.
    fn declare(decl: &mut Declaration<'_, Self>);
}
