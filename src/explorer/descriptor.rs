//! Handler descriptor types.

use std::fmt;

use crate::component::Callback;
use crate::metadata::ParamRole;

/// How a handler is fed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    /// Discrete event carrying `(context, error, payload)`.
    Payload,
    /// Continuous message stream for one event type.
    Stream,
    /// Raw client event, arguments passed through.
    ClientEvent,
}

impl MappingKind {
    /// Kind name as written in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Payload => "payload",
            MappingKind::Stream => "stream",
            MappingKind::ClientEvent => "client_event",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call position of each role, `None` when the method does not ask for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamOrder {
    pub context: Option<usize>,
    pub payload: Option<usize>,
    pub error: Option<usize>,
}

impl ParamOrder {
    /// Position of `role`.
    pub fn get(&self, role: ParamRole) -> Option<usize> {
        match role {
            ParamRole::Context => self.context,
            ParamRole::Payload => self.payload,
            ParamRole::Error => self.error,
        }
    }

    /// Place `role` at `index`, replacing any earlier position.
    pub fn set(&mut self, role: ParamRole, index: usize) {
        let slot = match role {
            ParamRole::Context => &mut self.context,
            ParamRole::Payload => &mut self.payload,
            ParamRole::Error => &mut self.error,
        };
        *slot = Some(index);
    }

    /// Whether no role is requested.
    pub fn is_empty(&self) -> bool {
        self.context.is_none() && self.payload.is_none() && self.error.is_none()
    }

    /// Number of call positions needed to cover every requested role.
    pub fn width(&self) -> usize {
        [self.context, self.payload, self.error]
            .into_iter()
            .flatten()
            .map(|index| index.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

/// One handler method, as reconstructed from its tags.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub kind: MappingKind,
    /// Event or topic the handler listens on.
    pub signature: String,
    pub method_name: &'static str,
    /// Method bound to its owning instance.
    pub callback: Callback,
    /// Only meaningful for [`MappingKind::Payload`].
    pub param_order: ParamOrder,
}

/// Equality ignores the callback.
impl PartialEq for HandlerDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.signature == other.signature
            && self.method_name == other.method_name
            && self.param_order == other.param_order
    }
}

impl Eq for HandlerDescriptor {}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("kind", &self.kind)
            .field("signature", &self.signature)
            .field("method_name", &self.method_name)
            .field("param_order", &self.param_order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_set_replaces() {
        let mut order = ParamOrder::default();
        assert!(order.is_empty());

        order.set(ParamRole::Payload, 0);
        order.set(ParamRole::Payload, 2);

        assert_eq!(order.get(ParamRole::Payload), Some(2));
        assert_eq!(order.width(), 3);
    }

    #[test]
    fn test_width_empty() {
        assert_eq!(ParamOrder::default().width(), 0);
    }

    #[test]
    fn test_width_saturates() {
        let mut order = ParamOrder::default();
        order.set(ParamRole::Error, usize::MAX);

        assert_eq!(order.width(), usize::MAX);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MappingKind::ClientEvent.to_string(), "client_event");
    }
}
