//! Schema types: field descriptors as persisted in catalog snapshots, plus the raw field-catalog
//! entries as the remote discovery call returns them.

use serde::{Deserialize, Deserializer, Serialize};

/// Semantic type of a remote field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Picklist,
    MultiPicklist,
    Lookup,
    OwnerLookup,
    UserLookup,
    MultiUserLookup,
    FileUpload,
    Unsupported,
}

impl TypeTag {
    /// Map a remote type name ("Pick List", "multiselectpicklist", "currency", ...). Unknown names are text.
    pub fn from_remote(remote: &str) -> TypeTag {
        let key: String = remote
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "boolean" | "checkbox" => TypeTag::Boolean,
            "date" => TypeTag::Date,
            "datetime" => TypeTag::DateTime,
            "picklist" => TypeTag::Picklist,
            "multiselectpicklist" => TypeTag::MultiPicklist,
            "lookup" => TypeTag::Lookup,
            "ownerlookup" => TypeTag::OwnerLookup,
            "userlookup" => TypeTag::UserLookup,
            "multiuserlookup" => TypeTag::MultiUserLookup,
            "fileupload" => TypeTag::FileUpload,
            "integer" | "bigint" | "autonumber" | "currency" | "decimal" | "double" | "percent" => {
                TypeTag::Number
            }
            "multiselectlookup" | "consent_lookup" | "profileimage" | "alarm" | "rrule"
            | "event_reminder" => TypeTag::Unsupported,
            _ => TypeTag::Text,
        }
    }

    /// Suffix appended to the label before it is turned into a field name.
    pub fn name_suffix(self) -> &'static str {
        match self {
            TypeTag::Lookup => "_ID",
            TypeTag::OwnerLookup => "_OwnerID",
            TypeTag::UserLookup => "_UserID",
            TypeTag::MultiUserLookup => "_UserIDs",
            _ => "",
        }
    }

    /// False for types that get no property in generated objects.
    pub fn is_generated(self) -> bool {
        !matches!(self, TypeTag::FileUpload | TypeTag::Unsupported)
    }

    pub fn is_reference(self) -> bool {
        matches!(self, TypeTag::Lookup | TypeTag::OwnerLookup | TypeTag::UserLookup)
    }

    pub fn is_multi(self) -> bool {
        matches!(self, TypeTag::MultiPicklist | TypeTag::MultiUserLookup)
    }
}

/// In-memory value shape of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    TextList,
}

impl ValueType {
    /// Rust type of the generated property.
    pub fn rust_type(self) -> &'static str {
        match self {
            ValueType::Text => "Option<String>",
            ValueType::Integer => "Option<i64>",
            ValueType::Decimal => "Option<f64>",
            ValueType::Boolean => "bool",
            ValueType::Date => "Option<NaiveDate>",
            ValueType::DateTime => "Option<DateTime<FixedOffset>>",
            ValueType::TextList => "Vec<String>",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::TextList => "text list",
        }
    }
}

/// One remote field. `name` is the generated identifier (unique per module); `wire_name` is the
/// remote key, used verbatim on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub wire_name: String,
    #[serde(default)]
    pub label: String,
    pub type_tag: TypeTag,
    /// Remote type name as discovered ("currency", "Pick List", ...).
    #[serde(default)]
    pub remote_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub max_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, wire_name: impl Into<String>, type_tag: TypeTag) -> Self {
        let wire_name = wire_name.into();
        FieldDescriptor {
            name: name.into(),
            label: wire_name.clone(),
            wire_name,
            type_tag,
            remote_type: String::new(),
            required: false,
            read_only: false,
            max_length: 0,
            default_value: None,
            is_custom: false,
            is_system: false,
            lookup_module: None,
            allowed_values: None,
            section: None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self.type_tag {
            TypeTag::Boolean => ValueType::Boolean,
            TypeTag::Date => ValueType::Date,
            TypeTag::DateTime => ValueType::DateTime,
            TypeTag::MultiPicklist | TypeTag::MultiUserLookup => ValueType::TextList,
            TypeTag::Number => match self.remote_type.to_lowercase().as_str() {
                "integer" | "bigint" | "autonumber" => ValueType::Integer,
                _ => ValueType::Decimal,
            },
            _ => ValueType::Text,
        }
    }

    /// Non-system field that gets a property, setter and change flag.
    pub fn is_tracked(&self) -> bool {
        !self.is_system && self.type_tag.is_generated()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module key used on the wire ("Contacts").
    pub key: String,
    pub singular_label: String,
    pub plural_label: String,
}

/// Descriptors of one remote category ("Contact Information", ...), in discovery order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSection {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

/// One section of a raw field-catalog payload.
#[derive(Clone, Debug, Deserialize)]
pub struct RawSection {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "FL", default, deserialize_with = "one_or_many")]
    pub fields: Vec<RawField>,
}

/// One field entry of a raw field-catalog payload. Flags arrive as "true"/"false" strings or
/// booleans, numbers as strings or numbers.
#[derive(Clone, Debug, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default, deserialize_with = "flag")]
    pub req: bool,
    #[serde(default, deserialize_with = "flag")]
    pub isreadonly: bool,
    #[serde(default, deserialize_with = "number")]
    pub maxlength: u32,
    #[serde(default, deserialize_with = "optional_text")]
    pub dv: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub customfield: bool,
    #[serde(default)]
    pub lm: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub val: Vec<String>,
}

impl RawField {
    pub fn wire_name(&self) -> &str {
        match self.api_name.as_deref() {
            Some(api) if !api.is_empty() => api,
            _ => &self.label,
        }
    }
}

/// Accept a single object or an array of them.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<U> {
        Many(Vec<U>),
        One(U),
    }
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(x)) => vec![x],
        None => Vec::new(),
    })
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "flag must be a boolean or \"true\"/\"false\"; got {}",
            type_name_of_json(&other)
        ))),
    }
}

fn number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("length out of range: {}", n))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("length must be numeric; got {:?}", s))),
        serde_json::Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!(
            "length must be a number; got {}",
            type_name_of_json(&other)
        ))),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    let items = match v {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Object(mut obj) => match obj.remove("content") {
                Some(serde_json::Value::String(s)) => Ok(s),
                _ => Err(serde::de::Error::custom("picklist value object without \"content\"")),
            },
            other => Ok(other.to_string()),
        })
        .collect()
}

pub(crate) fn type_name_of_json(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
