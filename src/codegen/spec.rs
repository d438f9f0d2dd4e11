//! Intermediate type specifications produced from a module schema, consumed by renderers.

use crate::config::{TypeTag, ValueType};

/// One generated property (non-system, generated type).
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySpec {
    /// Field name used by name-keyed access ("accountNameID").
    pub name: String,
    /// Rust member name, before keyword escaping ("account_name_id").
    pub member: String,
    pub wire_name: String,
    pub label: String,
    pub type_tag: TypeTag,
    pub value_type: ValueType,
    pub required: bool,
    pub read_only: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataObjectSpec {
    pub type_name: String,
    pub module: String,
    /// Discovery order.
    pub properties: Vec<PropertySpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataAccessSpec {
    pub type_name: String,
    pub object_type: String,
    pub module: String,
    pub singular_name: String,
    pub plural_name: String,
    /// Field catalog snapshot (JSON) the runtime re-reads instead of querying the schema.
    pub catalog: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedModule {
    pub object: DataObjectSpec,
    pub access: DataAccessSpec,
    /// Wire names of fields left out because their type has no property form.
    pub excluded: Vec<String>,
}

impl GeneratedModule {
    /// Rename both generated types, keeping the access type derived from the object type.
    pub fn rename(&mut self, type_name: String) {
        self.access.type_name = access_type_name(&type_name);
        self.access.object_type = type_name.clone();
        self.object.type_name = type_name;
    }
}

pub fn access_type_name(object_type: &str) -> String {
    format!("{}Access", object_type)
}
