//! Catalog validation: names are valid identifiers, names and wire keys are unique per module.

use crate::case::{is_valid_identifier, to_snake_case};
use crate::config::types::FieldDescriptor;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate_catalog(module: &str, fields: &[FieldDescriptor]) -> Result<(), ConfigError> {
    if module.trim().is_empty() {
        return Err(ConfigError::Validation("module key must not be empty".into()));
    }
    let mut names = HashSet::new();
    let mut members = HashSet::new();
    let mut wire_names = HashSet::new();
    for f in fields {
        if !is_valid_identifier(&f.name) {
            return Err(ConfigError::InvalidIdentifier(f.name.clone()));
        }
        if !names.insert(f.name.as_str()) || !members.insert(to_snake_case(&f.name)) {
            return Err(ConfigError::DuplicateField {
                module: module.to_string(),
                name: f.name.clone(),
            });
        }
        if f.wire_name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "field {} of module {} has no wire name",
                f.name, module
            )));
        }
        if !wire_names.insert(f.wire_name.as_str()) {
            return Err(ConfigError::DuplicateField {
                module: module.to_string(),
                name: f.wire_name.clone(),
            });
        }
    }
    Ok(())
}
