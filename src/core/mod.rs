pub mod config;

pub use config::{ArchetypeConfig, PersistenceConfig, ValidationConfig};
