//! # OpenVPMS Archetype
//!
//! An archetype-driven dynamic object model. Business objects carry no static
//! type beyond a small set of runtime classes; what fields they have, how
//! those fields are validated and how they relate to other objects is
//! declared by archetype descriptors loaded at startup.
//!
//! ## Features
//!
//! - **Descriptors**: load archetype XML (or JSON) into an atomically
//!   swappable registry
//! - **Beans**: typed, validated node access over a single object, including
//!   collections, participations and relationships
//! - **Path resolution**: dotted paths like `act.customer.entity.firstName`
//!   across objects, references and lookups
//! - **Assembly**: two-way copy between objects and persistent records,
//!   used by the in-memory object store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openvpms_archetype::*;
//!
//! # fn example() -> Result<()> {
//! let service = ArchetypeService::from_config(ArchetypeConfig::for_directory("archetypes"))?;
//!
//! let mut customer = IMObjectBean::create("party.customerperson", &service)?;
//! customer.set_value("firstName", "J")?;
//! customer.set_value("lastName", "Smith")?;
//! customer.save()?;
//!
//! let set = ObjectSet::new().with("customer", customer.into_object());
//! let name = PropertySetResolver::new(&set, &service).get_object("customer.firstName")?;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod bean;
pub mod core;
pub mod descriptor;
pub mod error;
pub mod model;
pub mod resolver;
pub mod service;
pub mod validation;

pub use assembler::{
    ArchetypeDescriptorAssembler, Assembler, AssemblyContext, IMObjectAssembler, MapAssembler,
    ObjectRecord, RecordValue,
};
pub use bean::{ActBean, EntityBean, IMObjectBean};
pub use crate::core::{ArchetypeConfig, PersistenceConfig, ValidationConfig};
pub use descriptor::{
    ArchetypeDescriptor, ArchetypeId, ArchetypeLoader, Assertion, DescriptorRegistry,
    NodeDescriptor, ValueType,
};
pub use error::Result;
pub use error::{ArchetypeError, PropertyResolverError, PropertyResolverErrorCode};
pub use model::{IMObject, ObjectClass, ObjectReference, Value, ValuePath};
pub use resolver::{NodeResolver, ObjectSet, PropertyPath, PropertySetResolver, PropertyState};
pub use service::{ArchetypeService, InMemoryObjectService, LookupService, ObjectService};
pub use validation::{ValidationError, ValidationErrorCode};
