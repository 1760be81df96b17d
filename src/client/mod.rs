//! Client module - the surface required from the network client.
//!
//! Provides:
//! - [`NetworkClient`] - event subscription, message streams and lifecycle
//! - [`MessageStream`] - push-based sequence of messages for one event type
//! - [`ClientEvent`] - lifecycle events the client emits
//! - [`LocalClient`] - in-process implementation for tests and demos

mod events;
mod local;
mod stream;

pub use events::ClientEvent;
pub use local::LocalClient;
pub use stream::MessageStream;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Boxed future returned by async client operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Event listener. Receives every argument of one emission, in the
/// client's own order.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Public event surface of a long-lived network client.
pub trait NetworkClient: Send + Sync + 'static {
    /// Subscribe `listener` to the event named `event`.
    fn on(&self, event: &str, listener: Listener);

    /// Open a live sequence of messages for `event_type`. The sequence ends
    /// only when the client closes it.
    fn get_stream(&self, event_type: &str) -> MessageStream;

    /// Start the client.
    fn boot(&self) -> Result<()>;

    /// Stop the client and close every subscription.
    fn shutdown(&self) -> BoxFuture<'_, Result<()>>;
}
