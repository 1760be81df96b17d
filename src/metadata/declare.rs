//! Static declaration surface for components.
//!
//! A [`Component`] describes itself once, when its type is first registered,
//! by calling into a [`Declaration`]. Each call records the callable member
//! in the class table and writes the matching tags into the
//! [`MetadataRegistry`]. Exploration later reads only those tags.
//!
//! # Example
//!
//! ```
//! use aixpand_gateway::metadata::{Declaration, ParamRole};
//! use aixpand_gateway::router::Arguments;
//! use aixpand_gateway::Component;
//!
//! struct Heartbeats;
//!
//! impl Heartbeats {
//!     fn on_heartbeat(&self, _args: Arguments) {}
//! }
//!
//! impl Component for Heartbeats {
//!     fn declare(decl: &mut Declaration<'_, Self>) {
//!         decl.gateway();
//!         decl.method("on_heartbeat", Self::on_heartbeat)
//!             .payload("AIXP_HEARTBEAT")
//!             .params(&[ParamRole::Payload, ParamRole::Context]);
//!     }
//! }
//! ```

use std::sync::Arc;

use super::registry::{ClassId, MetadataRegistry, ParamRole, TagKey, TagValue, Target};
use crate::binder::ClientSlot;
use crate::component::Component;
use crate::router::Arguments;

/// Largest parameter count a handler may declare. Larger counts are
/// clamped, and roles at higher indices are dropped.
pub const MAX_ARITY: usize = 32;

/// Unbound method callback.
pub type MethodFn<G> = Arc<dyn Fn(&G, Arguments) + Send + Sync>;

/// Accessor for a client slot on a component.
pub type SlotAccessor<G> = Arc<dyn Fn(&G) -> &ClientSlot + Send + Sync>;

/// Method recorded in a class table.
pub(crate) struct MethodEntry<G> {
    pub(crate) name: &'static str,
    /// Class whose declaration recorded the method (tags live under it).
    pub(crate) owner: ClassId,
    pub(crate) callback: MethodFn<G>,
}

/// Client property recorded in a class table.
pub(crate) struct PropertyEntry<G> {
    pub(crate) name: &'static str,
    pub(crate) owner: ClassId,
    pub(crate) accessor: SlotAccessor<G>,
}

/// Every member a class exposes, own members first, inherited after.
pub(crate) struct ClassTable<G> {
    pub(crate) class: ClassId,
    pub(crate) methods: Vec<MethodEntry<G>>,
    pub(crate) properties: Vec<PropertyEntry<G>>,
}

/// Declaration context handed to [`Component::declare`].
pub struct Declaration<'r, G> {
    class: ClassId,
    metadata: &'r mut MetadataRegistry,
    /// False when the class's tags were written by an earlier declaration.
    record: bool,
    methods: Vec<MethodEntry<G>>,
    inherited_methods: Vec<MethodEntry<G>>,
    properties: Vec<PropertyEntry<G>>,
    inherited_properties: Vec<PropertyEntry<G>>,
}

impl<'r, G: Component> Declaration<'r, G> {
    /// Run `G::declare` and collect its class table.
    pub(crate) fn run(metadata: &'r mut MetadataRegistry) -> ClassTable<G> {
        let class = ClassId::of::<G>();
        let record = metadata.mark_declared(class);

        let mut decl = Declaration {
            class,
            metadata,
            record,
            methods: Vec::new(),
            inherited_methods: Vec::new(),
            properties: Vec::new(),
            inherited_properties: Vec::new(),
        };
        G::declare(&mut decl);
        decl.finish()
    }

    /// Class being declared.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Mark the class as an event gateway.
    pub fn gateway(&mut self) -> &mut Self {
        if self.record {
            self.metadata
                .set_tag(Target::Class(self.class), TagKey::Gateway, TagValue::Flag(true));
        }
        self
    }

    /// Declare a method. Chain a mapping on the returned builder to make it
    /// a handler; a method without a mapping is never routed.
    ///
    /// Declaring the same name twice replaces the callback.
    pub fn method<F>(&mut self, name: &'static str, callback: F) -> MethodDeclaration<'_>
    where
        F: Fn(&G, Arguments) + Send + Sync + 'static,
    {
        let callback: MethodFn<G> = Arc::new(callback);
        match self.methods.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.callback = callback,
            None => self.methods.push(MethodEntry {
                name,
                owner: self.class,
                callback,
            }),
        }

        MethodDeclaration {
            metadata: &mut *self.metadata,
            record: self.record,
            class: self.class,
            method: name,
            arity: 0,
        }
    }

    /// Declare a property that wants the client injected.
    pub fn client_property<F>(&mut self, name: &'static str, accessor: F) -> &mut Self
    where
        F: Fn(&G) -> &ClientSlot + Send + Sync + 'static,
    {
        if self.record {
            self.metadata.set_tag(
                Target::property(self.class, name),
                TagKey::ClientHook,
                TagValue::Flag(true),
            );
        }
        self.properties.retain(|p| p.name != name);
        self.properties.push(PropertyEntry {
            name,
            owner: self.class,
            accessor: Arc::new(accessor),
        });
        self
    }

    /// Inherit the members of base component `B` reachable through
    /// `project`. Members this class declares itself shadow inherited ones
    /// with the same name, whatever the call order.
    pub fn extend<B, P>(&mut self, project: P) -> &mut Self
    where
        B: Component,
        P: Fn(&G) -> &B + Send + Sync + 'static,
    {
        let base = Declaration::<B>::run(self.metadata);
        let project = Arc::new(project);

        for entry in base.methods {
            if self.inherited_methods.iter().any(|m| m.name == entry.name) {
                continue;
            }
            let project = project.clone();
            let callback = entry.callback;
            self.inherited_methods.push(MethodEntry {
                name: entry.name,
                owner: entry.owner,
                callback: Arc::new(move |derived: &G, args: Arguments| {
                    callback(project(derived), args)
                }),
            });
        }

        for entry in base.properties {
            if self.inherited_properties.iter().any(|p| p.name == entry.name) {
                continue;
            }
            let project = project.clone();
            let accessor = entry.accessor;
            self.inherited_properties.push(PropertyEntry {
                name: entry.name,
                owner: entry.owner,
                accessor: slot_accessor(move |derived: &G| accessor(project(derived))),
            });
        }

        self
    }

    fn finish(self) -> ClassTable<G> {
        let mut methods = self.methods;
        for entry in self.inherited_methods {
            if !methods.iter().any(|m| m.name == entry.name) {
                methods.push(entry);
            }
        }

        let mut properties = self.properties;
        for entry in self.inherited_properties {
            if !properties.iter().any(|p| p.name == entry.name) {
                properties.push(entry);
            }
        }

        ClassTable {
            class: self.class,
            methods,
            properties,
        }
    }
}

fn slot_accessor<G, F>(accessor: F) -> SlotAccessor<G>
where
    F: Fn(&G) -> &ClientSlot + Send + Sync + 'static,
{
    Arc::new(accessor)
}

/// Builder for the tags of one declared method.
pub struct MethodDeclaration<'a> {
    metadata: &'a mut MetadataRegistry,
    record: bool,
    class: ClassId,
    method: &'static str,
    arity: usize,
}

impl MethodDeclaration<'_> {
    /// Handle the payload event `signature`.
    pub fn payload(self, signature: impl Into<String>) -> Self {
        self.tag_method(TagKey::PayloadMapping, TagValue::Signature(signature.into()))
    }

    /// Handle every message of the stream `event_type`.
    pub fn stream(self, event_type: impl Into<String>) -> Self {
        self.tag_method(TagKey::StreamMapping, TagValue::Signature(event_type.into()))
    }

    /// Receive the raw client event `event`.
    pub fn client_event(self, event: impl Into<String>) -> Self {
        self.tag_method(TagKey::ClientEventMapping, TagValue::Signature(event.into()))
    }

    /// Set the declared parameter count, at most [`MAX_ARITY`].
    pub fn arity(mut self, count: usize) -> Self {
        self.arity = count.min(MAX_ARITY);
        let count = self.arity;
        self.tag_method(TagKey::ParamCount, TagValue::Count(count))
    }

    /// Tag parameter `index` with `role`, growing the arity to cover it.
    /// Indices at or past [`MAX_ARITY`] are ignored.
    pub fn param(mut self, index: usize, role: ParamRole) -> Self {
        if index >= MAX_ARITY {
            tracing::warn!(
                class = self.class.name(),
                method = self.method,
                index,
                "Parameter index out of range, role ignored"
            );
            return self;
        }
        if index >= self.arity {
            self = self.arity(index + 1);
        }
        let target = Target::param(self.class, self.method, index);
        self.tag(target, TagKey::ParamRole, TagValue::Role(role))
    }

    /// Declare the full parameter list, one role per position.
    pub fn params(mut self, roles: &[ParamRole]) -> Self {
        self = self.arity(roles.len());
        for (index, role) in roles.iter().enumerate() {
            self = self.param(index, *role);
        }
        self
    }

    fn tag_method(self, key: TagKey, value: TagValue) -> Self {
        let target = Target::method(self.class, self.method);
        self.tag(target, key, value)
    }

    fn tag(self, target: Target, key: TagKey, value: TagValue) -> Self {
        if self.record {
            self.metadata.set_tag(target, key, value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base {
        client: ClientSlot,
    }

    impl Base {
        fn on_status(&self, _: Arguments) {}
        fn on_tick(&self, _: Arguments) {}
    }

    impl Component for Base {
        fn declare(decl: &mut Declaration<'_, Self>) {
            decl.gateway();
            decl.method("on_status", Self::on_status).payload("STATUS");
            decl.method("on_tick", Self::on_tick).stream("TICK");
            decl.client_property("client", |b: &Self| &b.client);
        }
    }

    struct Derived {
        base: Base,
    }

    impl Derived {
        fn on_tick(&self, _: Arguments) {}
    }

    impl Component for Derived {
        fn declare(decl: &mut Declaration<'_, Self>) {
            decl.extend(|d: &Self| &d.base);
            decl.method("on_tick", Self::on_tick);
        }
    }

    #[test]
    fn test_declaration_writes_tags() {
        let mut metadata = MetadataRegistry::new();
        let table = Declaration::<Base>::run(&mut metadata);
        let class = ClassId::of::<Base>();

        assert_eq!(table.methods.len(), 2);
        assert_eq!(table.properties.len(), 1);
        assert_eq!(
            metadata.get_tag(&Target::Class(class), TagKey::Gateway),
            Some(&TagValue::Flag(true))
        );
        assert_eq!(
            metadata
                .get_tag(&Target::method(class, "on_status"), TagKey::PayloadMapping)
                .and_then(TagValue::as_signature),
            Some("STATUS")
        );
        assert!(metadata.has_tag(&Target::property(class, "client"), TagKey::ClientHook));
    }

    #[test]
    fn test_param_grows_arity() {
        let mut metadata = MetadataRegistry::new();
        let class = ClassId::of::<Base>();
        metadata.mark_declared(class);

        let mut decl = Declaration::<Base> {
            class,
            metadata: &mut metadata,
            record: true,
            methods: Vec::new(),
            inherited_methods: Vec::new(),
            properties: Vec::new(),
            inherited_properties: Vec::new(),
        };
        decl.method("on_status", Base::on_status)
            .payload("STATUS")
            .param(2, ParamRole::Error);

        let target = Target::method(class, "on_status");
        assert_eq!(
            metadata.get_tag(&target, TagKey::ParamCount).and_then(TagValue::as_count),
            Some(3)
        );
    }

    #[test]
    fn test_extend_shadows_and_keeps_owner() {
        let mut metadata = MetadataRegistry::new();
        let table = Declaration::<Derived>::run(&mut metadata);

        let names: Vec<_> = table.methods.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["on_tick", "on_status"]);

        let tick = &table.methods[0];
        assert_eq!(tick.owner, ClassId::of::<Derived>());
        let status = &table.methods[1];
        assert_eq!(status.owner, ClassId::of::<Base>());

        assert_eq!(table.properties.len(), 1);
        assert_eq!(table.properties[0].owner, ClassId::of::<Base>());
        assert!(!metadata.has_tag(
            &Target::Class(ClassId::of::<Derived>()),
            TagKey::Gateway
        ));
    }

    #[test]
    fn test_redeclaration_does_not_rewrite_tags() {
        let mut metadata = MetadataRegistry::new();
        let _ = Declaration::<Base>::run(&mut metadata);
        let count = metadata.len();

        let again = Declaration::<Base>::run(&mut metadata);

        assert_eq!(metadata.len(), count);
        assert_eq!(again.methods.len(), 2);
    }

    #[test]
    fn test_inherited_property_resolves_through_projection() {
        let mut metadata = MetadataRegistry::new();
        let table = Declaration::<Derived>::run(&mut metadata);

        let derived = Derived {
            base: Base {
                client: ClientSlot::new(),
            },
        };
        let slot = (table.properties[0].accessor)(&derived);
        assert!(std::ptr::eq(slot, &derived.base.client));
    }

    #[test]
    fn test_arity_is_clamped() {
        let mut metadata = MetadataRegistry::new();
        let class = ClassId::of::<Base>();
        metadata.mark_declared(class);

        let mut decl = Declaration::<Base> {
            class,
            metadata: &mut metadata,
            record: true,
            methods: Vec::new(),
            inherited_methods: Vec::new(),
            properties: Vec::new(),
            inherited_properties: Vec::new(),
        };
        decl.method("on_status", Base::on_status)
            .payload("STATUS")
            .arity(usize::MAX)
            .param(usize::MAX, ParamRole::Payload)
            .param(MAX_ARITY, ParamRole::Context);

        let method = Target::method(class, "on_status");
        assert_eq!(
            metadata.get_tag(&method, TagKey::ParamCount).and_then(TagValue::as_count),
            Some(MAX_ARITY)
        );
        assert!(!metadata.has_tag(
            &Target::param(class, "on_status", MAX_ARITY),
            TagKey::ParamRole
        ));
        assert!(!metadata.has_tag(
            &Target::param(class, "on_status", usize::MAX),
            TagKey::ParamRole
        ));
    }
}
