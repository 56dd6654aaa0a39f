//! Typed accessors over single objects.
//!
//! [`IMObjectBean`] resolves node names through the object's archetype and
//! handles coercion, collections, participations and relationships.
//! [`EntityBean`] and [`ActBean`] add the entity relationship and act
//! participation helpers on top of it.

pub mod act_bean;
pub mod entity_bean;
pub mod object_bean;

pub use act_bean::ActBean;
pub use entity_bean::EntityBean;
pub use object_bean::IMObjectBean;
