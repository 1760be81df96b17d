//! Discovery-and-binding pass.
//!
//! [`GatewayService::subscribe`] runs the whole pass once, synchronously:
//! scan the registry, explore every gateway, route the descriptors, then
//! bind the client into every consumer. Every gateway is explored before
//! anything is wired, so a pass that fails on a missing runtime leaves the
//! client untouched and can be run again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::binder::PropertyBinder;
use crate::client::NetworkClient;
use crate::component::{ComponentRegistry, ComponentScanner};
use tokio::runtime::Handle;

use crate::error::{GatewayError, Result};
use crate::explorer::{HandlerDescriptor, MappingKind, MetadataExplorer};
use crate::router::DispatchRouter;

/// What one pass wired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingSummary {
    pub gateways: usize,
    pub payload_handlers: usize,
    pub stream_handlers: usize,
    pub client_event_handlers: usize,
    pub properties_bound: usize,
}

/// Binds gateway handlers and client properties to one client.
pub struct GatewayService {
    client: Arc<dyn NetworkClient>,
    components: Arc<ComponentRegistry>,
    subscribed: AtomicBool,
}

impl GatewayService {
    /// Create a service over `components` for `client`.
    pub fn new(client: Arc<dyn NetworkClient>, components: Arc<ComponentRegistry>) -> Self {
        Self {
            client,
            components,
            subscribed: AtomicBool::new(false),
        }
    }

    /// Registered components.
    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    /// Whether the pass has run.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Run the pass. Later calls do nothing and return `Ok(None)`.
    ///
    /// Fails with [`GatewayError::NoRuntime`] if a stream handler exists and
    /// no tokio runtime is reachable. Nothing is wired in that case and the
    /// pass may be retried.
    pub fn subscribe(&self) -> Result<Option<BindingSummary>> {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            tracing::warn!("Gateway subscriptions already bound, ignoring repeated pass");
            return Ok(None);
        }

        match self.bind() {
            Ok(summary) => Ok(Some(summary)),
            Err(e) => {
                self.subscribed.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn bind(&self) -> Result<BindingSummary> {
        let scanner = ComponentScanner::new(&self.components);
        let explorer = MetadataExplorer::new(scanner.metadata());

        let plan: Vec<(_, Vec<HandlerDescriptor>)> = scanner
            .list_gateways()
            .into_iter()
            .map(|gateway| (gateway, explorer.explore(gateway)))
            .collect();

        let needs_runtime = plan
            .iter()
            .flat_map(|(_, descriptors)| descriptors)
            .any(|d| d.kind == MappingKind::Stream);
        let runtime = if needs_runtime {
            Some(Handle::try_current().map_err(|_| GatewayError::NoRuntime)?)
        } else {
            None
        };

        let router = DispatchRouter::with_runtime(self.client.clone(), runtime);
        let mut summary = BindingSummary::default();

        for (gateway, descriptors) in &plan {
            let routed = router.route(gateway, descriptors)?;

            summary.gateways += 1;
            summary.payload_handlers += routed.payloads;
            summary.stream_handlers += routed.streams;
            summary.client_event_handlers += routed.client_events;
        }

        summary.properties_bound = PropertyBinder::new(scanner, self.client.clone()).bind_all();

        tracing::debug!(
            gateways = summary.gateways,
            payloads = summary.payload_handlers,
            streams = summary.stream_handlers,
            client_events = summary.client_event_handlers,
            properties = summary.properties_bound,
            "Gateway binding pass complete"
        );
        Ok(summary)
    }
}
