pub mod class;
pub mod object;
pub mod path;
pub mod reference;
pub mod value;

pub use class::{ClassProperty, ObjectClass, PropertyKind};
pub use object::IMObject;
pub use path::ValuePath;
pub use reference::ObjectReference;
pub use value::Value;
