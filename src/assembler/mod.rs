//! Two-way translation between in-memory objects and descriptors and their
//! persisted record form.
//!
//! Records are what an [`ObjectService`](crate::service::ObjectService)
//! stores. Object records are driven by the archetype: only class properties
//! that some node maps are copied, plus the core fields and the whole
//! `details` map. Child objects held in parent-child collections are
//! flattened into a table on the owning record and shared by key, so a child
//! reachable from two collections is stored once.

pub mod context;
pub mod descriptor;
pub mod map;
pub mod object;
pub mod record;

use crate::error::Result;

pub use context::AssemblyContext;
pub use descriptor::{ArchetypeDescriptorAssembler, NodeAssembler};
pub use map::MapAssembler;
pub use object::{IMObjectAssembler, ValueAssembler};
pub use record::{ArchetypeRecord, AssertionRecord, NodeRecord, ObjectRecord, RecordValue};

/// Copies between a runtime type and its record type.
pub trait Assembler {
    type Object;
    type Record;

    fn assemble_record(
        &self,
        object: &Self::Object,
        context: &mut AssemblyContext,
    ) -> Result<Self::Record>;

    fn assemble_object(
        &self,
        record: &Self::Record,
        context: &mut AssemblyContext,
    ) -> Result<Self::Object>;
}
