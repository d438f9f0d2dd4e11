//! Pre-flight validation of objects against their field descriptors.

use crate::bean::{DataObject, FieldValue};
use crate::config::{FieldCatalog, FieldDescriptor, TypeTag};
use crate::error::CrmError;
use regex::Regex;
use std::sync::OnceLock;

pub struct RecordValidator;

impl RecordValidator {
    /// Validate an object about to be inserted. Required fields must hold a value.
    pub fn validate_insert<O>(obj: &O, catalog: &FieldCatalog) -> Result<(), CrmError>
    where
        O: DataObject + ?Sized,
    {
        for field in catalog.tracked() {
            let value = obj.field(&field.name)?;
            if field.required && is_empty(&value) && field.default_value.is_none() {
                return Err(CrmError::Validation(format!("{} is required", field.wire_name)));
            }
            if obj.is_dirty(&field.name) {
                validate_field(field, &value)?;
            }
        }
        Ok(())
    }

    /// Validate the changed fields of an object about to be updated.
    pub fn validate_update<O>(obj: &O, catalog: &FieldCatalog) -> Result<(), CrmError>
    where
        O: DataObject + ?Sized,
    {
        for field in catalog.tracked() {
            if !obj.is_dirty(&field.name) {
                continue;
            }
            let value = obj.field(&field.name)?;
            if field.required && is_empty(&value) {
                return Err(CrmError::Validation(format!("{} cannot be cleared", field.wire_name)));
            }
            validate_field(field, &value)?;
        }
        Ok(())
    }
}

fn is_empty(v: &FieldValue) -> bool {
    match v {
        FieldValue::Null => true,
        FieldValue::Text(s) => s.trim().is_empty(),
        FieldValue::List(items) => items.is_empty(),
        _ => false,
    }
}

fn validate_field(field: &FieldDescriptor, v: &FieldValue) -> Result<(), CrmError> {
    if field.read_only {
        return Err(CrmError::Validation(format!("{} is read-only", field.wire_name)));
    }
    if is_empty(v) {
        return Ok(());
    }
    if field.max_length > 0 {
        if let FieldValue::Text(s) = v {
            if s.chars().count() > field.max_length as usize {
                return Err(CrmError::Validation(format!(
                    "{} must be at most {} characters",
                    field.wire_name, field.max_length
                )));
            }
        }
    }
    if let Some(ref allowed) = field.allowed_values {
        let candidates: Vec<&str> = match (field.type_tag, v) {
            (TypeTag::Picklist, FieldValue::Text(s)) => vec![s.as_str()],
            (TypeTag::MultiPicklist, FieldValue::List(items)) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        };
        for c in candidates {
            if !allowed.iter().any(|a| a == c) {
                return Err(CrmError::Validation(format!(
                    "{} must be one of: {:?}",
                    field.wire_name,
                    allowed.iter().take(5).collect::<Vec<_>>()
                )));
            }
        }
    }
    if field.remote_type.eq_ignore_ascii_case("email") {
        if let FieldValue::Text(s) = v {
            if !email_pattern().is_match(s) {
                return Err(CrmError::Validation(format!("{} must be a valid email", field.wire_name)));
            }
        }
    }
    Ok(())
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("email pattern: {}", e)))
}
