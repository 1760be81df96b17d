//! Property binder - injects the client into consumer properties.
//!
//! A consumer exposes a [`ClientSlot`] and declares it with
//! [`Declaration::client_property`](crate::metadata::Declaration::client_property).
//! The binder fills each tagged slot once; a filled slot is never
//! reassigned.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::client::NetworkClient;
use crate::component::{ComponentHandle, ComponentScanner};

/// Write-once holder for the injected client.
#[derive(Default)]
pub struct ClientSlot {
    inner: OnceLock<Arc<dyn NetworkClient>>,
}

impl ClientSlot {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// The injected client, once bound.
    pub fn get(&self) -> Option<&Arc<dyn NetworkClient>> {
        self.inner.get()
    }

    /// Whether a client has been injected.
    pub fn is_bound(&self) -> bool {
        self.inner.get().is_some()
    }

    /// Inject `client`. Hands it back if the slot is already bound.
    pub fn set(&self, client: Arc<dyn NetworkClient>) -> Result<(), Arc<dyn NetworkClient>> {
        self.inner.set(client)
    }

    /// Whether the slot holds exactly `client` (same allocation).
    pub fn holds(&self, client: &Arc<dyn NetworkClient>) -> bool {
        self.get()
            .is_some_and(|bound| std::ptr::addr_eq(Arc::as_ptr(bound), Arc::as_ptr(client)))
    }
}

impl fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSlot")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Assigns the client singleton into tagged properties.
pub struct PropertyBinder<'a> {
    scanner: ComponentScanner<'a>,
    client: Arc<dyn NetworkClient>,
}

impl<'a> PropertyBinder<'a> {
    /// Create a binder assigning `client`.
    pub fn new(scanner: ComponentScanner<'a>, client: Arc<dyn NetworkClient>) -> Self {
        Self { scanner, client }
    }

    /// Fill every tagged property of `consumers`. Returns the number of
    /// slots filled; already bound slots are left untouched.
    pub fn bind(&self, consumers: &[&ComponentHandle]) -> usize {
        let mut bound = 0;
        for consumer in consumers {
            for property in self.scanner.client_hooks(consumer) {
                match property.assign(self.client.clone()) {
                    Ok(()) => bound += 1,
                    Err(_) => tracing::warn!(
                        component = consumer.class().name(),
                        property = property.name(),
                        "Client slot already bound, leaving it unchanged"
                    ),
                }
            }
        }
        bound
    }

    /// Fill the tagged properties of every client consumer.
    pub fn bind_all(&self) -> usize {
        self.bind(&self.scanner.list_client_consumers())
    }
}
