use crate::descriptor::NodeDescriptor;
use crate::model::{IMObject, Value};

/// Where a path ended up: the value, plus the object and node it was read
/// from when the last step went through a real node.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyState {
    pub(crate) parent: Option<IMObject>,
    pub(crate) node: Option<NodeDescriptor>,
    pub(crate) name: String,
    pub(crate) value: Value,
}

impl PropertyState {
    /// The object the value was read from. `None` for roots, values reached
    /// through a null or a lookup, and reference metadata.
    pub fn parent(&self) -> Option<&IMObject> {
        self.parent.as_ref()
    }

    /// The node the value was read from. `None` for pseudo-properties.
    pub fn node(&self) -> Option<&NodeDescriptor> {
        self.node.as_ref()
    }

    /// The last segment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn display_name(&self) -> String {
        match &self.node {
            Some(node) => node.display_name(),
            None => self.name.clone(),
        }
    }
}
