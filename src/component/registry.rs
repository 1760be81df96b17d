//! Component registry and instance-bound members.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Component;
use crate::binder::ClientSlot;
use crate::client::NetworkClient;
use crate::metadata::{ClassId, ClassTable, Declaration, MetadataRegistry};
use crate::router::Arguments;

/// Method callback bound to its owning instance.
pub type Callback = Arc<dyn Fn(Arguments) + Send + Sync>;

type Assign = Arc<dyn Fn(Arc<dyn NetworkClient>) -> Result<(), Arc<dyn NetworkClient>> + Send + Sync>;

/// A method of one registered instance.
#[derive(Clone)]
pub struct BoundMethod {
    name: &'static str,
    owner: ClassId,
    callback: Callback,
}

impl BoundMethod {
    /// Method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Class that declared the method.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// Callback bound to the instance.
    pub fn callback(&self) -> &Callback {
        &self.callback
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A client property of one registered instance.
#[derive(Clone)]
pub struct BoundProperty {
    name: &'static str,
    owner: ClassId,
    assign: Assign,
}

impl BoundProperty {
    /// Property name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Class that declared the property.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// Fill the instance's slot. Hands the client back if the slot is
    /// already bound.
    pub fn assign(&self, client: Arc<dyn NetworkClient>) -> Result<(), Arc<dyn NetworkClient>> {
        (self.assign)(client)
    }
}

impl fmt::Debug for BoundProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundProperty")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// One registered component instance.
#[derive(Clone)]
pub struct ComponentHandle {
    class: ClassId,
    instance: Arc<dyn Any + Send + Sync>,
    methods: Vec<BoundMethod>,
    properties: Vec<BoundProperty>,
}

impl ComponentHandle {
    fn bind<G: Component>(table: &ClassTable<G>, instance: Arc<G>) -> Self {
        let methods = table
            .methods
            .iter()
            .map(|entry| {
                let this = instance.clone();
                let callback = entry.callback.clone();
                BoundMethod {
                    name: entry.name,
                    owner: entry.owner,
                    callback: Arc::new(move |args: Arguments| callback(this.as_ref(), args)),
                }
            })
            .collect();

        let properties = table
            .properties
            .iter()
            .map(|entry| {
                let this = instance.clone();
                let accessor = entry.accessor.clone();
                BoundProperty {
                    name: entry.name,
                    owner: entry.owner,
                    assign: Arc::new(move |client: Arc<dyn NetworkClient>| {
                        let slot: &ClientSlot = accessor(this.as_ref());
                        slot.set(client)
                    }),
                }
            })
            .collect();

        Self {
            class: table.class,
            instance,
            methods,
            properties,
        }
    }

    /// Class of the instance.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Methods, own first then inherited, deduplicated by name.
    pub fn methods(&self) -> &[BoundMethod] {
        &self.methods
    }

    /// Declared client properties.
    pub fn properties(&self) -> &[BoundProperty] {
        &self.properties
    }

    /// The instance, if it is a `G`.
    pub fn downcast<G: Component>(&self) -> Option<Arc<G>> {
        self.instance.clone().downcast::<G>().ok()
    }

    fn is_instance(&self, other: &Arc<dyn Any + Send + Sync>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(other))
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("class", &self.class)
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Explicit registry of the component instances relevant to the gateway
/// subsystem, with the tags their classes declared.
#[derive(Default)]
pub struct ComponentRegistry {
    metadata: MetadataRegistry,
    /// Class tables by type, erased.
    tables: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    components: Vec<ComponentHandle>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live instance. Registering the same instance twice is a
    /// no-op.
    pub fn register<G: Component>(&mut self, instance: Arc<G>) -> &mut Self {
        let erased: Arc<dyn Any + Send + Sync> = instance.clone();
        if self.components.iter().any(|c| c.is_instance(&erased)) {
            tracing::debug!(class = ClassId::of::<G>().name(), "Instance already registered");
            return self;
        }

        let table = self.table::<G>();
        self.components.push(ComponentHandle::bind(&table, instance));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<G: Component>(mut self, instance: Arc<G>) -> Self {
        self.register(instance);
        self
    }

    /// Tags declared by every registered class.
    pub fn metadata(&self) -> &MetadataRegistry {
        &self.metadata
    }

    /// Mutable tag access for hand-written tags. Tags must be in place
    /// before the registry is handed to the service.
    pub fn metadata_mut(&mut self) -> &mut MetadataRegistry {
        &mut self.metadata
    }

    /// Registered instances, in registration order.
    pub fn components(&self) -> &[ComponentHandle] {
        &self.components
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn table<G: Component>(&mut self) -> Arc<ClassTable<G>> {
        let key = TypeId::of::<G>();
        if let Some(table) = self
            .tables
            .get(&key)
            .and_then(|t| t.clone().downcast::<ClassTable<G>>().ok())
        {
            return table;
        }

        let table = Arc::new(Declaration::<G>::run(&mut self.metadata));
        self.tables.insert(key, table.clone());
        table
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.components)
            .field("tags", &self.metadata.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        hits: AtomicUsize,
        client: ClientSlot,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                hits: AtomicUsize::new(0),
                client: ClientSlot::new(),
            }
        }

        fn on_hit(&self, _: Arguments) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Component for Counter {
        fn declare(decl: &mut Declaration<'_, Self>) {
            decl.gateway();
            decl.method("on_hit", Self::on_hit).payload("HIT");
            decl.client_property("client", |c: &Self| &c.client);
        }
    }

    #[test]
    fn test_callbacks_bound_to_their_instance() {
        let first = Arc::new(Counter::new());
        let second = Arc::new(Counter::new());
        let registry = ComponentRegistry::new()
            .with(first.clone())
            .with(second.clone());

        let callback = registry.components()[1].methods()[0].callback().clone();
        callback(Arguments::default());
        callback(Arguments::default());

        assert_eq!(first.hits.load(Ordering::SeqCst), 0);
        assert_eq!(second.hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_declare_runs_once_per_type() {
        let registry = ComponentRegistry::new()
            .with(Arc::new(Counter::new()))
            .with(Arc::new(Counter::new()));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tables.len(), 1);
        // gateway + mapping + client hook
        assert_eq!(registry.metadata().len(), 3);
    }

    #[test]
    fn test_duplicate_instance_ignored() {
        let counter = Arc::new(Counter::new());
        let mut registry = ComponentRegistry::new();
        registry.register(counter.clone());
        registry.register(counter.clone());

        assert_eq!(registry.len(), 1);
        assert!(registry.components()[0].downcast::<Counter>().is_some());
    }
}
