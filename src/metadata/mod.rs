//! Metadata module - component tags and their declaration.
//!
//! Provides:
//! - [`MetadataRegistry`] - `(target, key) -> value` tag storage
//! - [`Declaration`] - the surface components use to declare handlers,
//!   parameter roles and client properties

mod declare;
mod registry;

pub use declare::{Declaration, MethodDeclaration, MethodFn, SlotAccessor, MAX_ARITY};
pub use registry::{ClassId, MetadataRegistry, ParamRole, TagKey, TagValue, Target};

pub(crate) use declare::ClassTable;
