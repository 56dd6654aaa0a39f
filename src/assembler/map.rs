use indexmap::IndexMap;

use super::{Assembler, AssemblyContext};
use crate::error::Result;

/// Assembles keyed maps entry by entry with an item assembler, preserving
/// key order.
#[derive(Debug, Clone, Default)]
pub struct MapAssembler<A> {
    item: A,
}

impl<A: Assembler> MapAssembler<A> {
    pub fn new(item: A) -> Self {
        Self { item }
    }

    /// Bring an existing record map in line with `source`: entries missing
    /// from the source are removed, the rest are replaced in source order.
    pub fn merge(
        &self,
        target: &mut IndexMap<String, A::Record>,
        source: &IndexMap<String, A::Object>,
        context: &mut AssemblyContext,
    ) -> Result<()> {
        let before = target.len();
        target.retain(|key, _| source.contains_key(key));
        let removed = before - target.len();
        if removed > 0 {
            tracing::debug!("Removed {} stale map entries", removed);
        }
        for (key, value) in source {
            let record = self.item.assemble_record(value, context)?;
            target.insert(key.clone(), record);
        }
        target.sort_by(|a, _, b, _| {
            source
                .get_index_of(a)
                .cmp(&source.get_index_of(b))
        });
        Ok(())
    }
}

impl<A: Assembler> Assembler for MapAssembler<A> {
    type Object = IndexMap<String, A::Object>;
    type Record = IndexMap<String, A::Record>;

    fn assemble_record(
        &self,
        object: &Self::Object,
        context: &mut AssemblyContext,
    ) -> Result<Self::Record> {
        object
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.item.assemble_record(value, context)?)))
            .collect()
    }

    fn assemble_object(
        &self,
        record: &Self::Record,
        context: &mut AssemblyContext,
    ) -> Result<Self::Object> {
        record
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.item.assemble_object(value, context)?)))
            .collect()
    }
}
