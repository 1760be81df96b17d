//! Component scanner - selects gateways and client consumers.

use super::registry::{BoundProperty, ComponentHandle, ComponentRegistry};
use crate::metadata::{MetadataRegistry, TagKey, TagValue, Target};

/// Read-only view over a [`ComponentRegistry`].
///
/// Both listings are snapshots of the registry at the time of the call.
#[derive(Debug, Clone, Copy)]
pub struct ComponentScanner<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> ComponentScanner<'a> {
    /// Create a scanner over `registry`.
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Tags backing the scan.
    pub fn metadata(&self) -> &'a MetadataRegistry {
        self.registry.metadata()
    }

    /// Instances whose class carries a truthy gateway tag.
    pub fn list_gateways(&self) -> Vec<&'a ComponentHandle> {
        let metadata = self.metadata();
        self.registry
            .components()
            .iter()
            .filter(|component| {
                metadata
                    .get_tag(&Target::Class(component.class()), TagKey::Gateway)
                    .is_some_and(TagValue::is_truthy)
            })
            .collect()
    }

    /// Instances with at least one property tagged as wanting the client.
    pub fn list_client_consumers(&self) -> Vec<&'a ComponentHandle> {
        self.registry
            .components()
            .iter()
            .filter(|component| self.client_hooks(component).next().is_some())
            .collect()
    }

    /// Properties of `component` tagged as wanting the client.
    pub fn client_hooks<'c>(
        &self,
        component: &'c ComponentHandle,
    ) -> impl Iterator<Item = &'c BoundProperty> + 'c
    where
        'a: 'c,
    {
        let metadata = self.metadata();
        component.properties().iter().filter(move |property| {
            metadata.has_tag(
                &Target::property(property.owner(), property.name()),
                TagKey::ClientHook,
            )
        })
    }
}
