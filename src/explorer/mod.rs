//! Explorer module - reconstructs handler descriptors from tags.
//!
//! For every method of a gateway (own and inherited), the explorer reads
//! the mapping tags declared for it and emits at most one
//! [`HandlerDescriptor`]. The result depends only on the declared tags, so
//! exploring the same gateway twice yields equal descriptor sequences.

mod descriptor;

pub use descriptor::{HandlerDescriptor, MappingKind, ParamOrder};
pub use crate::metadata::ParamRole;

use crate::component::{BoundMethod, ComponentHandle};
use crate::metadata::{MetadataRegistry, TagKey, TagValue, Target, MAX_ARITY};

/// Mapping tags in precedence order.
const MAPPINGS: [(TagKey, MappingKind); 3] = [
    (TagKey::PayloadMapping, MappingKind::Payload),
    (TagKey::StreamMapping, MappingKind::Stream),
    (TagKey::ClientEventMapping, MappingKind::ClientEvent),
];

/// Reads handler declarations out of a [`MetadataRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct MetadataExplorer<'a> {
    metadata: &'a MetadataRegistry,
}

impl<'a> MetadataExplorer<'a> {
    /// Create an explorer over `metadata`.
    pub fn new(metadata: &'a MetadataRegistry) -> Self {
        Self { metadata }
    }

    /// Descriptors for every handler method of `gateway`, in method order.
    pub fn explore(&self, gateway: &ComponentHandle) -> Vec<HandlerDescriptor> {
        gateway
            .methods()
            .iter()
            .filter_map(|method| self.explore_method(method))
            .collect()
    }

    /// Descriptor for one method, or `None` if it is not a handler.
    pub fn explore_method(&self, method: &BoundMethod) -> Option<HandlerDescriptor> {
        let target = Target::method(method.owner(), method.name());

        let (kind, tag) = MAPPINGS.iter().find_map(|(key, kind)| {
            self.metadata.get_tag(&target, *key).map(|tag| (*kind, tag))
        })?;

        let Some(signature) = tag.as_signature() else {
            tracing::debug!(
                class = method.owner().name(),
                method = method.name(),
                kind = %kind,
                "Unsupported mapping value, method not routed"
            );
            return None;
        };

        let param_order = match kind {
            MappingKind::Payload => self.param_order(method),
            MappingKind::Stream | MappingKind::ClientEvent => ParamOrder::default(),
        };

        Some(HandlerDescriptor {
            kind,
            signature: signature.to_string(),
            method_name: method.name(),
            callback: method.callback().clone(),
            param_order,
        })
    }

    /// Role positions over the declared parameter list, capped at
    /// [`MAX_ARITY`]. A role tagged at more than one index ends up at the
    /// highest one.
    fn param_order(&self, method: &BoundMethod) -> ParamOrder {
        let owner = method.owner();
        let name = method.name();
        let arity = self
            .metadata
            .get_tag(&Target::method(owner, name), TagKey::ParamCount)
            .and_then(TagValue::as_count)
            .unwrap_or(0)
            .min(MAX_ARITY);

        let mut order = ParamOrder::default();
        for index in 0..arity {
            let role = self
                .metadata
                .get_tag(&Target::param(owner, name, index), TagKey::ParamRole)
                .and_then(TagValue::as_role);
            if let Some(role) = role {
                order.set(role, index);
            }
        }
        order
    }
}
