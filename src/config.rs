//! Entity scope configuration

use serde::{Deserialize, Serialize};

/// Controls what happens when an entity scope is opened on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Copy compatible fields from older versions of the schema
    pub migrate_on_open: bool,
    /// Delete old-version entities once their fields have been copied
    pub remove_old_entities: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            migrate_on_open: true,
            remove_old_entities: true,
        }
    }
}

impl ScopeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_migrate_on_open(mut self, migrate: bool) -> Self {
        self.migrate_on_open = migrate;
        self
    }

    pub fn with_remove_old_entities(mut self, remove: bool) -> Self {
        self.remove_old_entities = remove;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_migrate_and_remove() {
        let config = ScopeConfig::new();
        assert!(config.migrate_on_open);
        assert!(config.remove_old_entities);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ScopeConfig = serde_json::from_str(r#"{"remove_old_entities": false}"#).unwrap();
        assert!(config.migrate_on_open);
        assert!(!config.remove_old_entities);
    }
}
