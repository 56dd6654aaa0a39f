use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::descriptor::DEFAULT_MAX_LENGTH;
use crate::error::{ArchetypeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeConfig {
    /// Archetype definition files or directories, loaded in order.
    pub archetype_paths: Vec<PathBuf>,
    pub validation: ValidationConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validate whole objects before they are persisted.
    pub validate_on_save: bool,
    /// Validate single values as they are assigned through a bean.
    pub validate_on_set: bool,
    /// Max length applied to string nodes that do not declare one.
    pub default_max_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// First id handed out by the object id sequence.
    pub first_id: i64,
    /// Reject saves whose version does not match the stored version.
    pub optimistic_locking: bool,
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            archetype_paths: Vec::new(),
            validation: ValidationConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_on_save: true,
            validate_on_set: true,
            default_max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            first_id: 1000,
            optimistic_locking: true,
        }
    }
}

impl ArchetypeConfig {
    /// Configuration loading every archetype below `dir`.
    pub fn for_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            archetype_paths: vec![dir.into()],
            ..Default::default()
        }
    }

    /// Read a JSON configuration file. Relative archetype paths are resolved
    /// against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        if let Some(base) = path.parent() {
            for source in &mut config.archetype_paths {
                if source.is_relative() {
                    *source = base.join(&*source);
                }
            }
        }
        config.check()?;
        Ok(config)
    }

    pub fn with_archetype_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archetype_paths.push(path.into());
        self
    }

    pub fn with_validation_config(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_persistence_config(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_validate_on_save(mut self, enabled: bool) -> Self {
        self.validation.validate_on_save = enabled;
        self
    }

    pub fn with_first_id(mut self, first_id: i64) -> Self {
        self.persistence.first_id = first_id;
        self
    }

    fn check(&self) -> Result<()> {
        if self.persistence.first_id < 1 {
            return Err(ArchetypeError::Configuration {
                message: format!("first_id must be positive, got {}", self.persistence.first_id),
            });
        }
        if self.validation.default_max_length == 0 {
            return Err(ArchetypeError::Configuration {
                message: "default_max_length must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl ValidationConfig {
    /// Validate on every assignment and on save.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Validate on save only, allowing objects to pass through invalid
    /// intermediate states while being edited.
    pub fn deferred() -> Self {
        Self {
            validate_on_set: false,
            ..Self::default()
        }
    }

    /// No validation; for bulk loading of trusted data.
    pub fn disabled() -> Self {
        Self {
            validate_on_save: false,
            validate_on_set: false,
            default_max_length: DEFAULT_MAX_LENGTH,
        }
    }
}
