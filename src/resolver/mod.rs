//! Dotted property path resolution.
//!
//! A path such as `act.customer.entity.firstName` is parsed into a
//! [`PropertyPath`] and walked segment by segment: node names descend into
//! objects, references are dereferenced through the archetype service,
//! filtered collections yield their first element, and lookup nodes expose
//! their `code`, `name`, `id` and `displayName`. Objects also answer the
//! reserved names `displayName`, `shortName`, `id`, `name` and, for lookups,
//! `code` when no node of that name exists.

pub mod object_set;
pub mod path;
pub mod resolve;
pub mod state;

pub use object_set::ObjectSet;
pub use path::{PropertyPath, Segment};
pub use resolve::{NodeResolver, PropertySetResolver};
pub use state::PropertyState;
