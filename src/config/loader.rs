//! Turn raw field-catalog sections into named descriptors. Field order is discovery order, so
//! regenerating from the same schema yields the same names.

use crate::case::{unique_identifier, UsedNames};
use crate::config::types::{FieldDescriptor, FieldSection, RawField, RawSection, TypeTag};
use crate::config::validator::validate_catalog;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Canonical name of a system field, if `raw` is one.
fn system_name(raw: &RawField, type_tag: TypeTag) -> Option<&'static str> {
    let key: String = raw
        .wire_name()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "id" => Some("id"),
        "createdtime" => Some("createdTime"),
        "modifiedtime" => Some("modifiedTime"),
        "lastactivitytime" => Some("lastActivityTime"),
        "createdby" | "smcreatorid" => Some("createdBy"),
        "modifiedby" => Some("modifiedBy"),
        "owner" | "smownerid" => Some("owner"),
        k if type_tag == TypeTag::OwnerLookup && k.ends_with("owner") => Some("owner"),
        _ => None,
    }
}

fn describe(raw: &RawField, name: String, is_system: bool, section: &str) -> FieldDescriptor {
    let type_tag = TypeTag::from_remote(&raw.type_);
    FieldDescriptor {
        name,
        wire_name: raw.wire_name().to_string(),
        label: raw.label.clone(),
        type_tag,
        remote_type: raw.type_.clone(),
        required: raw.req,
        read_only: raw.isreadonly,
        max_length: raw.maxlength,
        default_value: raw.dv.clone().filter(|v| !v.is_empty()),
        is_custom: raw.customfield,
        is_system,
        lookup_module: raw.lm.clone().filter(|m| !m.is_empty()),
        allowed_values: if raw.val.is_empty() { None } else { Some(raw.val.clone()) },
        section: if section.is_empty() { None } else { Some(section.to_string()) },
    }
}

/// Name every raw field of one module and validate the result. Reference fields get their type
/// suffix before sanitizing ("Account Name" lookup -> `accountNameID`).
pub fn resolve_sections(module: &str, raw: Vec<RawSection>) -> Result<Vec<FieldSection>, ConfigError> {
    let mut used = UsedNames::with_reserved();
    let mut seen_system = HashSet::new();
    let mut sections = Vec::with_capacity(raw.len());

    for section in raw {
        let mut fields = Vec::with_capacity(section.fields.len());
        for f in &section.fields {
            let type_tag = TypeTag::from_remote(&f.type_);
            let system = system_name(f, type_tag).filter(|n| seen_system.insert(*n));
            let descriptor = match system {
                Some(name) => describe(f, name.to_string(), true, &section.name),
                None => {
                    let label = format!("{}{}", f.wire_name(), type_tag.name_suffix());
                    let name = unique_identifier(&label, &mut used);
                    describe(f, name, false, &section.name)
                }
            };
            fields.push(descriptor);
        }
        sections.push(FieldSection {
            name: section.name,
            fields,
        });
    }

    let all: Vec<FieldDescriptor> = sections.iter().flat_map(|s| s.fields.iter().cloned()).collect();
    validate_catalog(module, &all)?;
    Ok(sections)
}
