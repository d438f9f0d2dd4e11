//! Wire representation of one remote record: ordered wire-name -> value pairs plus system metadata.

use crate::error::CrmError;
use crate::wire::{many, text_of};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Null,
    Text(String),
    List(Vec<String>),
    /// Related record (or user): id plus display name when the remote sent one.
    Reference { id: String, name: Option<String> },
    /// Numbered child rows (line items) under the child element `tag`.
    Items { tag: String, rows: BTreeMap<u32, Vec<(String, String)>> },
}

impl WireValue {
    /// Plain text view: text as-is, reference id, list joined by ';'.
    pub fn as_text(&self) -> Option<String> {
        match self {
            WireValue::Text(s) => Some(s.clone()),
            WireValue::Reference { id, .. } => Some(id.clone()),
            WireValue::List(items) => Some(items.join(";")),
            WireValue::Null | WireValue::Items { .. } => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Text(_) => "text",
            WireValue::List(_) => "list",
            WireValue::Reference { .. } => "reference",
            WireValue::Items { .. } => "items",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// Empty until the record exists remotely.
    pub id: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub last_activity_time: Option<String>,
    pub created_by: Option<UserRef>,
    pub modified_by: Option<UserRef>,
    pub owner: Option<UserRef>,
    fields: Vec<(String, WireValue)>,
}

enum SystemKey {
    Id,
    CreatedTime,
    ModifiedTime,
    LastActivityTime,
    CreatedBy,
    CreatedById,
    ModifiedBy,
    ModifiedById,
    Owner,
    OwnerId,
}

fn singular_key(module: &str) -> String {
    module.strip_suffix('s').unwrap_or(module).to_string()
}

fn system_key(module: &str, key: &str) -> Option<SystemKey> {
    let upper = module.to_uppercase();
    if key.eq_ignore_ascii_case("id")
        || key == format!("{}ID", singular_key(&upper))
        || key == format!("{}_ID", upper)
    {
        return Some(SystemKey::Id);
    }
    Some(match key {
        "Created_Time" | "Created Time" => SystemKey::CreatedTime,
        "Modified_Time" | "Modified Time" => SystemKey::ModifiedTime,
        "Last_Activity_Time" | "Last Activity Time" => SystemKey::LastActivityTime,
        "Created_By" | "Created By" => SystemKey::CreatedBy,
        "SMCREATORID" => SystemKey::CreatedById,
        "Modified_By" | "Modified By" => SystemKey::ModifiedBy,
        "MODIFIEDBY" => SystemKey::ModifiedById,
        "Owner" => SystemKey::Owner,
        "SMOWNERID" => SystemKey::OwnerId,
        k if k == format!("{} Owner", singular_key(module)) => SystemKey::Owner,
        _ => return None,
    })
}

fn merge_user(slot: &mut Option<UserRef>, value: &WireValue, id_only: bool) {
    let user = slot.get_or_insert_with(UserRef::default);
    match value {
        WireValue::Reference { id, name } => {
            user.id = id.clone();
            if let Some(name) = name {
                user.name = name.clone();
            }
        }
        WireValue::Text(s) if id_only => user.id = s.clone(),
        WireValue::Text(s) => user.name = s.clone(),
        _ => {}
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, wire_name: &str) -> Option<&WireValue> {
        self.fields.iter().find(|(k, _)| k == wire_name).map(|(_, v)| v)
    }

    /// Set a field, keeping its original position when it already exists.
    pub fn set(&mut self, wire_name: impl Into<String>, value: WireValue) {
        let wire_name = wire_name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == wire_name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((wire_name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode an `FL` list. System keys go to the metadata slots; everything else stays in order.
    pub fn from_fl(module: &str, fl: &Value) -> Result<Record, CrmError> {
        let mut record = Record::new();
        for entry in many(fl) {
            let (key, value) = parse_entry(entry)?;
            match system_key(module, &key) {
                Some(SystemKey::Id) => record.id = value.as_text().unwrap_or_default(),
                Some(SystemKey::CreatedTime) => record.created_time = value.as_text(),
                Some(SystemKey::ModifiedTime) => record.modified_time = value.as_text(),
                Some(SystemKey::LastActivityTime) => record.last_activity_time = value.as_text(),
                Some(SystemKey::CreatedBy) => merge_user(&mut record.created_by, &value, false),
                Some(SystemKey::CreatedById) => merge_user(&mut record.created_by, &value, true),
                Some(SystemKey::ModifiedBy) => merge_user(&mut record.modified_by, &value, false),
                Some(SystemKey::ModifiedById) => merge_user(&mut record.modified_by, &value, true),
                Some(SystemKey::Owner) => merge_user(&mut record.owner, &value, false),
                Some(SystemKey::OwnerId) => merge_user(&mut record.owner, &value, true),
                None => record.set(key, value),
            }
        }
        Ok(record)
    }

    /// Encode as an `FL` list: id first, then owner, then fields in insertion order.
    pub fn to_fl(&self) -> Value {
        let mut fl = Vec::with_capacity(self.fields.len() + 2);
        if !self.id.is_empty() {
            fl.push(json!({"val": "Id", "content": self.id}));
        }
        if let Some(owner) = self.owner.as_ref().filter(|o| !o.id.is_empty()) {
            fl.push(json!({"val": "Owner", "id": owner.id, "content": owner.id}));
        }
        for (key, value) in &self.fields {
            fl.push(encode_entry(key, value));
        }
        Value::Array(fl)
    }
}

fn parse_entry(entry: &Value) -> Result<(String, WireValue), CrmError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| CrmError::Malformed(format!("FL entry must be an object, got {}", entry)))?;
    let key = obj
        .get("val")
        .and_then(text_of)
        .ok_or_else(|| CrmError::Malformed("FL entry without \"val\"".into()))?;

    if let Some((tag, rows)) = obj
        .iter()
        .find(|(k, v)| !matches!(k.as_str(), "val" | "content" | "id") && has_numbered_rows(v))
    {
        return Ok((key, WireValue::Items { tag: tag.clone(), rows: parse_items(rows)? }));
    }

    let content = obj.get("content").unwrap_or(&Value::Null);
    if let Some(id) = obj.get("id").and_then(text_of) {
        return Ok((key, WireValue::Reference { id, name: text_of(content) }));
    }
    let value = match content {
        Value::Null => WireValue::Null,
        Value::Array(items) => WireValue::List(items.iter().filter_map(text_of).collect()),
        other => text_of(other).map(WireValue::Text).unwrap_or(WireValue::Null),
    };
    Ok((key, value))
}

fn has_numbered_rows(v: &Value) -> bool {
    many(v).first().map_or(false, |r| r.get("no").is_some() && r.get("FL").is_some())
}

fn parse_items(rows: &Value) -> Result<BTreeMap<u32, Vec<(String, String)>>, CrmError> {
    let mut out = BTreeMap::new();
    for row in many(rows) {
        let no = row_number(row)?;
        let mut cells = Vec::new();
        for cell in many(row.get("FL").unwrap_or(&Value::Null)) {
            let (key, value) = parse_entry(cell)?;
            cells.push((key, value.as_text().unwrap_or_default()));
        }
        out.insert(no, cells);
    }
    Ok(out)
}

/// The `no` attribute of a numbered row, as a number.
pub(crate) fn row_number(row: &Value) -> Result<u32, CrmError> {
    row.get("no")
        .and_then(text_of)
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| CrmError::Malformed(format!("row without a numeric \"no\": {}", row)))
}

fn encode_entry(key: &str, value: &WireValue) -> Value {
    let mut obj = Map::new();
    obj.insert("val".into(), Value::String(key.to_string()));
    match value {
        WireValue::Null => {
            obj.insert("content".into(), Value::Null);
        }
        WireValue::Text(s) => {
            obj.insert("content".into(), Value::String(s.clone()));
        }
        WireValue::List(items) => {
            obj.insert("content".into(), json!(items));
        }
        WireValue::Reference { id, name } => {
            obj.insert("id".into(), Value::String(id.clone()));
            obj.insert("content".into(), Value::String(name.clone().unwrap_or_else(|| id.clone())));
        }
        WireValue::Items { tag, rows } => {
            let encoded: Vec<Value> = rows
                .iter()
                .map(|(no, cells)| {
                    let fl: Vec<Value> = cells.iter().map(|(k, v)| json!({"val": k, "content": v})).collect();
                    json!({"no": no.to_string(), "FL": fl})
                })
                .collect();
            obj.insert(tag.clone(), Value::Array(encoded));
        }
    }
    Value::Object(obj)
}

impl std::fmt::Display for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "<{}>", self.kind()),
        }
    }
}
