//! # aixpand-gateway
//!
//! Declarative event gateways bound to a long-lived AiXpand network client.
//!
//! Components declare, once per type, which of their methods handle which
//! client events and which of their properties receive the client itself.
//! At application bootstrap a single pass discovers every declaration,
//! subscribes the handlers on the client and injects the client into the
//! declared properties.
//!
//! ## Architecture
//!
//! - **Metadata**: tags attached to classes, methods, parameters and properties
//! - **Explorer**: turns method tags into handler descriptors
//! - **Router**: subscribes descriptors as payload, stream or lifecycle handlers
//! - **Binder**: injects the client into declared properties
//! - **Module**: builds and boots the client, runs the pass, shuts down
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use aixpand_gateway::client::{LocalClient, NetworkClient};
//! use aixpand_gateway::component::ComponentRegistry;
//! use aixpand_gateway::metadata::{Declaration, ParamRole};
//! use aixpand_gateway::module::{ClientOptions, GatewayModule};
//! use aixpand_gateway::router::Arguments;
//! use aixpand_gateway::{ClientSlot, Component, Result};
//! use serde_json::json;
//!
//! struct Heartbeats {
//!     client: ClientSlot,
//! }
//!
//! impl Component for Heartbeats {
//!     fn declare(decl: &mut Declaration<'_, Self>) {
//!         decl.gateway();
//!         decl.method("on_heartbeat", |_: &Self, args: Arguments| {
//!             println!("heartbeat {:?}", args.get(0));
//!         })
//!         .payload("HEARTBEAT")
//!         .params(&[ParamRole::Payload]);
//!         decl.client_property("client", |h: &Self| &h.client);
//!     }
//! }
//!
//! let local = Arc::new(LocalClient::default());
//! let shared = local.clone();
//! let connector = move |_: &ClientOptions| -> Result<Arc<dyn NetworkClient>> {
//!     Ok(shared.clone())
//! };
//!
//! let gateway = Arc::new(Heartbeats { client: ClientSlot::new() });
//! let components = ComponentRegistry::new().with(gateway.clone());
//! let module = GatewayModule::register(ClientOptions::default(), &connector, components)?;
//! module.on_application_bootstrap()?;
//!
//! local.emit("HEARTBEAT", vec![json!("ctx"), json!(null), json!({"cpu": 12})]);
//! assert!(gateway.client.is_bound());
//! # Ok::<(), aixpand_gateway::GatewayError>(())
//! ```

pub mod binder;
pub mod client;
pub mod component;
pub mod error;
pub mod explorer;
pub mod metadata;
pub mod module;
pub mod router;
pub mod service;

pub use binder::ClientSlot;
pub use client::{ClientEvent, LocalClient, MessageStream, NetworkClient};
pub use component::{Component, ComponentRegistry};
pub use error::{GatewayError, Result};
pub use explorer::{HandlerDescriptor, MappingKind, ParamOrder};
pub use metadata::{Declaration, ParamRole};
pub use module::{AsyncModuleOptions, ClientOptions, GatewayModule};
pub use router::Arguments;
pub use service::{BindingSummary, GatewayService};
