//! Resolved field catalog: one module's descriptors validated and indexed for runtime use.

use crate::config::types::{FieldDescriptor, FieldSection};
use crate::config::validator::validate_catalog;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct FieldCatalog {
    module: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    /// Wire names first, then labels that do not shadow a wire name.
    by_wire: HashMap<String, usize>,
}

/// Serialized form embedded in generated access types.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    module: String,
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    pub fn new(module: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, ConfigError> {
        let module = module.into();
        validate_catalog(&module, &fields)?;
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let mut by_wire: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.wire_name.clone(), i))
            .collect();
        for (i, f) in fields.iter().enumerate() {
            if !f.label.is_empty() {
                by_wire.entry(f.label.clone()).or_insert(i);
            }
        }
        Ok(FieldCatalog {
            module,
            fields,
            by_name,
            by_wire,
        })
    }

    pub fn from_sections(module: impl Into<String>, sections: &[FieldSection]) -> Result<Self, ConfigError> {
        let fields = sections.iter().flat_map(|s| s.fields.iter().cloned()).collect();
        Self::new(module, fields)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Lookup by generated field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Lookup by wire key (or display label, which older payloads use as the key).
    pub fn by_wire_name(&self, wire: &str) -> Option<&FieldDescriptor> {
        self.by_wire.get(wire).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Fields that carry a change flag, in catalog order.
    pub fn tracked(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_tracked())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_snapshot(json: &str) -> Result<Self, ConfigError> {
        let snapshot: Snapshot = serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::new(snapshot.module, snapshot.fields)
    }

    pub fn to_snapshot(&self) -> Result<String, ConfigError> {
        let snapshot = Snapshot {
            module: self.module.clone(),
            fields: self.fields.clone(),
        };
        serde_json::to_string_pretty(&snapshot).map_err(|e| ConfigError::Load(e.to_string()))
    }
}
