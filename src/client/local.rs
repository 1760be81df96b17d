//! In-process client.
//!
//! [`LocalClient`] implements [`NetworkClient`] without a transport: events
//! are emitted and stream messages published by calling it directly. It
//! records boot and shutdown calls so hosts can assert on the lifecycle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aixpand_gateway::client::{LocalClient, NetworkClient};
//! use serde_json::{json, Value};
//!
//! let client = LocalClient::default();
//! client.on("ENGINE_STATUS", Arc::new(|args: &[Value]| println!("{args:?}")));
//!
//! assert_eq!(client.emit("ENGINE_STATUS", vec![json!("ctx"), json!(null), json!(1)]), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{BoxFuture, ClientEvent, Listener, MessageStream, NetworkClient};
use crate::error::{GatewayError, Result};
use crate::module::ClientOptions;

/// In-process [`NetworkClient`].
pub struct LocalClient {
    options: ClientOptions,
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    streams: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    boots: AtomicUsize,
    shutdowns: AtomicUsize,
    /// When set, `shutdown` fails with this reason.
    shutdown_failure: Option<String>,
}

impl LocalClient {
    /// Create a client for `options`.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            listeners: RwLock::new(HashMap::new()),
            streams: Mutex::new(HashMap::new()),
            boots: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            shutdown_failure: None,
        }
    }

    /// Make `shutdown` fail with `reason`.
    pub fn with_shutdown_failure(mut self, reason: impl Into<String>) -> Self {
        self.shutdown_failure = Some(reason.into());
        self
    }

    /// Options the client was created with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Emit `event` to its listeners, in subscription order. Returns the
    /// number of listeners called.
    pub fn emit(&self, event: &str, args: Vec<Value>) -> usize {
        // Listeners may subscribe while being called.
        let listeners = match self.listeners.read().get(event) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };

        for listener in &listeners {
            listener(&args);
        }
        listeners.len()
    }

    /// Emit a lifecycle event.
    pub fn emit_event(&self, event: ClientEvent, args: Vec<Value>) -> usize {
        self.emit(event.as_str(), args)
    }

    /// Push `message` to every open stream of `event_type`. Returns the
    /// number of streams reached; closed streams are dropped.
    pub fn publish(&self, event_type: &str, message: Value) -> usize {
        let mut streams = self.streams.lock();
        let Some(senders) = streams.get_mut(event_type) else {
            return 0;
        };

        senders.retain(|tx| tx.send(message.clone()).is_ok());
        senders.len()
    }

    /// Listeners subscribed to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Streams opened for `event_type` and not yet closed.
    pub fn stream_count(&self, event_type: &str) -> usize {
        self.streams
            .lock()
            .get(event_type)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Times `boot` was called.
    pub fn boot_count(&self) -> usize {
        self.boots.load(Ordering::Acquire)
    }

    /// Times `shutdown` was called.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::Acquire)
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl NetworkClient for LocalClient {
    fn on(&self, event: &str, listener: Listener) {
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    fn get_stream(&self, event_type: &str) -> MessageStream {
        let (tx, stream) = MessageStream::channel();
        self.streams
            .lock()
            .entry(event_type.to_string())
            .or_default()
            .push(tx);
        stream
    }

    fn boot(&self) -> Result<()> {
        if self.boots.fetch_add(1, Ordering::AcqRel) > 0 {
            return Err(GatewayError::Client("client already booted".to_string()));
        }

        self.emit_event(
            ClientEvent::Connected,
            vec![json!({ "upstream": self.options.upstream.url })],
        );
        self.emit_event(ClientEvent::Booted, Vec::new());
        Ok(())
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.shutdowns.fetch_add(1, Ordering::AcqRel);
            if let Some(reason) = &self.shutdown_failure {
                return Err(GatewayError::Client(reason.clone()));
            }

            self.emit_event(ClientEvent::Shutdown, Vec::new());
            // Dropping the senders ends every open stream.
            self.streams.lock().clear();
            self.listeners.write().clear();
            Ok(())
        })
    }
}
