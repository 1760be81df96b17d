//! Router module - wires handler descriptors to the client.
//!
//! - **Payload**: `on(signature)`; each emission is read as
//!   `(context, error, payload)` and laid out by the descriptor's
//!   [`ParamOrder`](crate::explorer::ParamOrder).
//! - **Stream**: `get_stream(signature)`; one delivery task per descriptor
//!   forwards every message until the client closes the stream. A handler
//!   panic is logged and delivery goes on with the next message.
//! - **ClientEvent**: `on(signature)`; emitted arguments are passed through.
//!
//! Handlers are invoked synchronously from the listener (or delivery task)
//! and their outcome is not observed.

mod arguments;

pub use arguments::{Arguments, CONTEXT_POSITION, ERROR_POSITION, PAYLOAD_POSITION};

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;

use crate::client::NetworkClient;
use crate::component::ComponentHandle;
use crate::error::{GatewayError, Result};
use crate::explorer::{HandlerDescriptor, MappingKind};

/// Counts of subscriptions created for one gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSummary {
    pub payloads: usize,
    pub streams: usize,
    pub client_events: usize,
}

impl RouteSummary {
    /// Total subscriptions.
    pub fn total(&self) -> usize {
        self.payloads + self.streams + self.client_events
    }
}

/// Subscribes descriptors on a live client.
pub struct DispatchRouter {
    client: Arc<dyn NetworkClient>,
    runtime: Option<Handle>,
}

impl DispatchRouter {
    /// Create a router for `client`, delivering streams on the current
    /// tokio runtime if there is one.
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self::with_runtime(client, Handle::try_current().ok())
    }

    /// Create a router delivering streams on `runtime`.
    pub fn with_runtime(client: Arc<dyn NetworkClient>, runtime: Option<Handle>) -> Self {
        Self { client, runtime }
    }

    /// Subscribe every descriptor of `gateway`.
    ///
    /// At most one subscription is created per `(kind, signature)`; later
    /// descriptors repeating a pair are skipped. Fails with
    /// [`GatewayError::NoRuntime`] before subscribing anything if a stream
    /// handler is present and the router has no runtime.
    pub fn route(
        &self,
        gateway: &ComponentHandle,
        descriptors: &[HandlerDescriptor],
    ) -> Result<RouteSummary> {
        let class = gateway.class().name();
        let mut seen = HashSet::new();
        let mut wired = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if !seen.insert((descriptor.kind, descriptor.signature.as_str())) {
                tracing::warn!(
                    gateway = class,
                    method = descriptor.method_name,
                    signature = %descriptor.signature,
                    kind = %descriptor.kind,
                    "Duplicate subscription skipped"
                );
                continue;
            }
            wired.push(descriptor);
        }

        let mut summary = RouteSummary::default();

        // Streams first, so a missing runtime fails before anything is wired.
        let streams: Vec<_> = wired
            .iter()
            .filter(|d| d.kind == MappingKind::Stream)
            .collect();
        if !streams.is_empty() {
            let Some(runtime) = &self.runtime else {
                return Err(GatewayError::NoRuntime);
            };
            for descriptor in streams {
                self.subscribe_stream(descriptor, runtime);
                summary.streams += 1;
            }
        }

        for descriptor in &wired {
            match descriptor.kind {
                MappingKind::Payload => {
                    self.subscribe_payload(descriptor);
                    summary.payloads += 1;
                }
                MappingKind::ClientEvent => {
                    self.subscribe_client_event(descriptor);
                    summary.client_events += 1;
                }
                MappingKind::Stream => {}
            }
        }

        for descriptor in wired {
            tracing::info!(
                "{} subscribed to the \"{}\" payloads.",
                class,
                descriptor.signature
            );
        }

        Ok(summary)
    }

    fn subscribe_payload(&self, descriptor: &HandlerDescriptor) {
        let order = descriptor.param_order;
        let callback = descriptor.callback.clone();

        self.client.on(
            &descriptor.signature,
            Arc::new(move |emission: &[Value]| {
                callback(Arguments::for_payload(&order, emission));
            }),
        );
    }

    fn subscribe_stream(&self, descriptor: &HandlerDescriptor, runtime: &Handle) {
        let mut stream = self.client.get_stream(&descriptor.signature);
        let callback = descriptor.callback.clone();
        let signature = descriptor.signature.clone();

        runtime.spawn(async move {
            while let Some(message) = stream.next().await {
                let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                    callback(Arguments::from_values([message]))
                }));
                if delivered.is_err() {
                    tracing::error!(signature = %signature, "Stream handler panicked");
                }
            }
            tracing::debug!(signature = %signature, "Message stream closed");
        });
    }

    fn subscribe_client_event(&self, descriptor: &HandlerDescriptor) {
        let callback = descriptor.callback.clone();

        self.client.on(
            &descriptor.signature,
            Arc::new(move |emission: &[Value]| {
                callback(Arguments::from_values(emission.iter().cloned()));
            }),
        );
    }
}
