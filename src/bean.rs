//! Data objects: the contract generated types implement, name-keyed dispatch tables, and a
//! catalog-driven object for modules without generated code.

use crate::config::{FieldCatalog, ValueType};
use crate::error::CrmError;
use crate::wire::Record;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Record metadata carried by every object. Never change-tracked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemFields {
    /// Empty until the object has been persisted.
    pub id: String,
    pub created_time: Option<DateTime<FixedOffset>>,
    pub modified_time: Option<DateTime<FixedOffset>>,
    pub last_activity_time: Option<DateTime<FixedOffset>>,
    pub created_by_id: Option<String>,
    pub created_by_name: Option<String>,
    pub modified_by_id: Option<String>,
    pub modified_by_name: Option<String>,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    /// Record this object was last decoded from, for attributes not mapped to properties.
    pub last_record: Option<Record>,
}

/// A field value detached from its property type.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::List(_) => "text list",
        }
    }

    /// Value of an unset property of type `value_type`.
    pub fn empty(value_type: ValueType) -> FieldValue {
        match value_type {
            ValueType::Boolean => FieldValue::Boolean(false),
            ValueType::TextList => FieldValue::List(Vec::new()),
            _ => FieldValue::Null,
        }
    }

    pub fn fits(&self, value_type: ValueType) -> bool {
        matches!(
            (self, value_type),
            (FieldValue::Null, _)
                | (FieldValue::Text(_), ValueType::Text)
                | (FieldValue::Integer(_), ValueType::Integer)
                | (FieldValue::Integer(_), ValueType::Decimal)
                | (FieldValue::Decimal(_), ValueType::Decimal)
                | (FieldValue::Boolean(_), ValueType::Boolean)
                | (FieldValue::Date(_), ValueType::Date)
                | (FieldValue::DateTime(_), ValueType::DateTime)
                | (FieldValue::List(_), ValueType::TextList)
        )
    }
}

/// Property types of generated objects.
pub trait FieldType: Sized {
    const EXPECTED: &'static str;
    fn into_value(self) -> FieldValue;
    fn from_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for Option<String> {
    const EXPECTED: &'static str = "text";
    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::Text)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            FieldValue::Text(s) => Some(Some(s)),
            _ => None,
        }
    }
}

impl FieldType for Option<i64> {
    const EXPECTED: &'static str = "integer";
    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::Integer)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            FieldValue::Integer(n) => Some(Some(n)),
            _ => None,
        }
    }
}

impl FieldType for Option<f64> {
    const EXPECTED: &'static str = "decimal";
    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::Decimal)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            FieldValue::Decimal(n) => Some(Some(n)),
            FieldValue::Integer(n) => Some(Some(n as f64)),
            _ => None,
        }
    }
}

impl FieldType for bool {
    const EXPECTED: &'static str = "boolean";
    fn into_value(self) -> FieldValue {
        FieldValue::Boolean(self)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(false),
            FieldValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldType for Option<NaiveDate> {
    const EXPECTED: &'static str = "date";
    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::Date)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            FieldValue::Date(d) => Some(Some(d)),
            _ => None,
        }
    }
}

impl FieldType for Option<DateTime<FixedOffset>> {
    const EXPECTED: &'static str = "datetime";
    fn into_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::DateTime)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            FieldValue::DateTime(d) => Some(Some(d)),
            _ => None,
        }
    }
}

impl FieldType for Vec<String> {
    const EXPECTED: &'static str = "text list";
    fn into_value(self) -> FieldValue {
        FieldValue::List(self)
    }
    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(Vec::new()),
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Convert a detached value into a property type, naming `field` on mismatch.
pub fn convert<T: FieldType>(field: &str, value: FieldValue) -> Result<T, CrmError> {
    let found = value.kind();
    T::from_value(value).ok_or_else(|| CrmError::TypeMismatch {
        field: field.to_string(),
        expected: T::EXPECTED,
        found: found.to_string(),
    })
}

/// An in-memory record of one module. Field names are the generated names from the catalog.
pub trait DataObject: Send {
    fn system(&self) -> &SystemFields;
    fn system_mut(&mut self) -> &mut SystemFields;
    fn field(&self, name: &str) -> Result<FieldValue, CrmError>;
    /// Store `value` and mark the field changed.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CrmError>;
    /// False for unknown names and system fields.
    fn is_dirty(&self, name: &str) -> bool;
    fn set_dirty(&mut self, name: &str, dirty: bool) -> Result<(), CrmError>;

    fn id(&self) -> &str {
        &self.system().id
    }

    fn has_id(&self) -> bool {
        !self.system().id.is_empty()
    }
}

/// Accessors of one property of `T`.
pub struct FieldSlot<T: 'static> {
    pub name: &'static str,
    pub get: fn(&T) -> FieldValue,
    pub set: fn(&mut T, FieldValue) -> Result<(), CrmError>,
    pub dirty: fn(&T) -> bool,
    pub mark: fn(&mut T, bool),
}

/// Name -> accessor table of one generated type. Slots must be sorted by name.
pub struct FieldTable<T: 'static> {
    slots: &'static [FieldSlot<T>],
}

impl<T: 'static> FieldTable<T> {
    pub const fn new(slots: &'static [FieldSlot<T>]) -> Self {
        FieldTable { slots }
    }

    pub fn slot(&self, name: &str) -> Option<&FieldSlot<T>> {
        self.slots
            .binary_search_by(|s| s.name.cmp(name))
            .ok()
            .map(|i| &self.slots[i])
    }

    fn require(&self, name: &str) -> Result<&FieldSlot<T>, CrmError> {
        self.slot(name).ok_or_else(|| CrmError::UnknownField(name.to_string()))
    }

    pub fn get(&self, obj: &T, name: &str) -> Result<FieldValue, CrmError> {
        Ok((self.require(name)?.get)(obj))
    }

    pub fn set(&self, obj: &mut T, name: &str, value: FieldValue) -> Result<(), CrmError> {
        let slot = self.require(name)?;
        (slot.set)(obj, value)?;
        (slot.mark)(obj, true);
        Ok(())
    }

    pub fn is_dirty(&self, obj: &T, name: &str) -> bool {
        self.slot(name).map_or(false, |s| (s.dirty)(obj))
    }

    pub fn set_dirty(&self, obj: &mut T, name: &str, dirty: bool) -> Result<(), CrmError> {
        (self.require(name)?.mark)(obj, dirty);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|s| s.name)
    }
}

/// Catalog-driven object: one slot per tracked field of the catalog, typed by its value type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicBean {
    system: SystemFields,
    types: BTreeMap<String, ValueType>,
    values: BTreeMap<String, FieldValue>,
    dirty: BTreeSet<String>,
}

impl DynamicBean {
    pub fn new(catalog: &FieldCatalog) -> Self {
        let types = catalog
            .tracked()
            .map(|f| (f.name.clone(), f.value_type()))
            .collect();
        DynamicBean {
            types,
            ..Self::default()
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    fn value_type(&self, name: &str) -> Result<ValueType, CrmError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| CrmError::UnknownField(name.to_string()))
    }
}

impl DataObject for DynamicBean {
    fn system(&self) -> &SystemFields {
        &self.system
    }

    fn system_mut(&mut self) -> &mut SystemFields {
        &mut self.system
    }

    fn field(&self, name: &str) -> Result<FieldValue, CrmError> {
        let value_type = self.value_type(name)?;
        Ok(self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| FieldValue::empty(value_type)))
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CrmError> {
        let value_type = self.value_type(name)?;
        if !value.fits(value_type) {
            return Err(CrmError::TypeMismatch {
                field: name.to_string(),
                expected: value_type.name(),
                found: value.kind().to_string(),
            });
        }
        let value = match (value, value_type) {
            (FieldValue::Null, vt) => FieldValue::empty(vt),
            (FieldValue::Integer(n), ValueType::Decimal) => FieldValue::Decimal(n as f64),
            (v, _) => v,
        };
        self.values.insert(name.to_string(), value);
        self.dirty.insert(name.to_string());
        Ok(())
    }

    fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    fn set_dirty(&mut self, name: &str, dirty: bool) -> Result<(), CrmError> {
        self.value_type(name)?;
        if dirty {
            self.dirty.insert(name.to_string());
        } else {
            self.dirty.remove(name);
        }
        Ok(())
    }
}
