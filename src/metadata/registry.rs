//! Tag storage addressed by `(target, key)`.
//!
//! The registry is plain storage: no validation on write, and reads return
//! `None` for an absent tag so callers can tell "absent" apart from a
//! present-but-falsy value such as `TagValue::Flag(false)`.
//!
//! # Example
//!
//! ```
//! use aixpand_gateway::metadata::{ClassId, MetadataRegistry, TagKey, TagValue, Target};
//!
//! struct Telemetry;
//!
//! let mut registry = MetadataRegistry::new();
//! let class = Target::Class(ClassId::of::<Telemetry>());
//!
//! registry.set_tag(class, TagKey::Gateway, TagValue::Flag(true));
//!
//! assert_eq!(registry.get_tag(&class, TagKey::Gateway), Some(&TagValue::Flag(true)));
//! assert_eq!(registry.get_tag(&class, TagKey::ClientHook), None);
//! ```

use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a component class.
///
/// Equality and hashing use the `TypeId` only; the name is kept for logs.
#[derive(Clone, Copy)]
pub struct ClassId {
    id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// Class identity of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
        }
    }

    /// Unqualified type name (`Telemetry` for `app::gateways::Telemetry`).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    base.rsplit("::").next().unwrap_or(base)
}

/// What a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A component class.
    Class(ClassId),
    /// A method declared by `class`.
    Method {
        class: ClassId,
        method: &'static str,
    },
    /// Positional parameter `index` of a method declared by `class`.
    Param {
        class: ClassId,
        method: &'static str,
        index: usize,
    },
    /// A property declared by `class`.
    Property {
        class: ClassId,
        property: &'static str,
    },
}

impl Target {
    /// Method target shorthand.
    pub fn method(class: ClassId, method: &'static str) -> Self {
        Target::Method { class, method }
    }

    /// Parameter target shorthand.
    pub fn param(class: ClassId, method: &'static str, index: usize) -> Self {
        Target::Param {
            class,
            method,
            index,
        }
    }

    /// Property target shorthand.
    pub fn property(class: ClassId, property: &'static str) -> Self {
        Target::Property { class, property }
    }
}

/// Tag keys understood by the scanner and explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKey {
    /// Class is an event gateway.
    Gateway,
    /// Method handles a payload event; value is the signature.
    PayloadMapping,
    /// Method handles a message stream; value is the event type.
    StreamMapping,
    /// Method receives a raw client event; value is the event name.
    ClientEventMapping,
    /// Declared parameter count of a method.
    ParamCount,
    /// Role of one method parameter.
    ParamRole,
    /// Property wants the client injected.
    ClientHook,
}

/// Semantic role of a payload handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// Execution context of the event.
    Context,
    /// Event payload.
    Payload,
    /// Error reported alongside the event (may be null).
    Error,
}

impl ParamRole {
    /// Role name as written in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamRole::Context => "context",
            ParamRole::Payload => "payload",
            ParamRole::Error => "error",
        }
    }
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Flag(bool),
    Signature(String),
    Count(usize),
    Role(ParamRole),
}

impl TagValue {
    /// Signature string, if this is a signature.
    pub fn as_signature(&self) -> Option<&str> {
        match self {
            TagValue::Signature(s) => Some(s),
            _ => None,
        }
    }

    /// Count, if this is a count.
    pub fn as_count(&self) -> Option<usize> {
        match self {
            TagValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Role, if this is a role.
    pub fn as_role(&self) -> Option<ParamRole> {
        match self {
            TagValue::Role(r) => Some(*r),
            _ => None,
        }
    }

    /// Truthiness: `Flag(false)`, empty signatures and zero counts are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            TagValue::Flag(b) => *b,
            TagValue::Signature(s) => !s.is_empty(),
            TagValue::Count(n) => *n > 0,
            TagValue::Role(_) => true,
        }
    }
}

/// Key/value tag store.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    tags: HashMap<(Target, TagKey), TagValue>,
    /// Classes whose declarations have been recorded.
    declared: HashSet<ClassId>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(target, key)`, replacing any previous value.
    pub fn set_tag(&mut self, target: Target, key: TagKey, value: TagValue) {
        self.tags.insert((target, key), value);
    }

    /// Read the tag under `(target, key)`.
    pub fn get_tag(&self, target: &Target, key: TagKey) -> Option<&TagValue> {
        self.tags.get(&(*target, key))
    }

    /// Whether any value is stored under `(target, key)`.
    pub fn has_tag(&self, target: &Target, key: TagKey) -> bool {
        self.tags.contains_key(&(*target, key))
    }

    /// Number of stored tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags are stored.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Whether `class` has already recorded its declaration.
    pub fn is_declared(&self, class: ClassId) -> bool {
        self.declared.contains(&class)
    }

    /// Mark `class` declared. Returns `false` if it already was.
    pub(crate) fn mark_declared(&mut self, class: ClassId) -> bool {
        self.declared.insert(class)
    }
}
