//! Archetype schema: descriptors, assertions and the process-wide registry.

pub mod archetype;
pub mod archetype_id;
pub mod assertion;
pub mod loader;
pub mod node;
pub mod registry;
pub mod short_name;
pub mod value_type;

pub use archetype::ArchetypeDescriptor;
pub use archetype_id::ArchetypeId;
pub use assertion::{Assertion, LookupSource, full_match_pattern};
pub use loader::ArchetypeLoader;
pub use node::{DEFAULT_MAX_LENGTH, NodeDescriptor};
pub use registry::{ArchetypeSnapshot, DescriptorRegistry};
pub use short_name::{is_a, matches};
pub use value_type::ValueType;
