//! Response interpreter: classify a raw reply by operation and structure, first match wins.
//!
//! Order: error envelope, no-data marker, field catalog, users, modules, deleted ids, record list,
//! legacy single post result, multi-row post result, bare success, status replies. Several shapes
//! share node names (`result`, `row`, `success`), so the order is significant.

use crate::config::{resolve_sections, FieldSection, ModuleDescriptor, RawSection, NO_CONTENT_CODE};
use crate::error::CrmError;
use crate::wire::{many, record::row_number, text_of, Operation, Record};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of one row of a bulk insert/update, keyed by the row number the remote echoed.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchItemResult {
    pub row: u32,
    pub success: bool,
    pub assigned_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    /// Metadata the remote returned for a successful row (id, timestamps, creator/modifier).
    pub details: Record,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Zero matching records. Never an error.
    NoContent { code: String, message: String },
    FieldCatalog(Vec<FieldSection>),
    /// User id -> attributes (`name` included).
    Users(BTreeMap<String, BTreeMap<String, String>>),
    Modules(Vec<ModuleDescriptor>),
    DeletedIds(Vec<String>),
    Records(Vec<Record>),
    /// Single result of the older insert/update variant.
    PostResult { record: Record, message: String },
    /// Per-row results, sorted by row number.
    BatchResult(Vec<BatchItemResult>),
    Success(BTreeMap<String, String>),
    Status { code: String, message: String },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::NoContent { .. } => "no_content",
            Response::FieldCatalog(_) => "field_catalog",
            Response::Users(_) => "users",
            Response::Modules(_) => "modules",
            Response::DeletedIds(_) => "deleted_ids",
            Response::Records(_) => "records",
            Response::PostResult { .. } => "post_result",
            Response::BatchResult(_) => "batch_result",
            Response::Success(_) => "success",
            Response::Status { .. } => "status",
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, Response::NoContent { .. })
    }

    /// Records of a read; no content is an empty list.
    pub fn into_records(self, module: &str, operation: Operation) -> Result<Vec<Record>, CrmError> {
        match self {
            Response::Records(records) => Ok(records),
            Response::NoContent { .. } => Ok(Vec::new()),
            Response::PostResult { record, .. } => Ok(vec![record]),
            other => Err(unexpected(module, operation, &other)),
        }
    }

    /// Per-row results of a write. A legacy single result counts as row 1.
    pub fn into_batch(self, module: &str, operation: Operation) -> Result<Vec<BatchItemResult>, CrmError> {
        match self {
            Response::BatchResult(items) => Ok(items),
            Response::NoContent { .. } => Ok(Vec::new()),
            Response::PostResult { record, .. } => Ok(vec![BatchItemResult {
                row: 1,
                success: true,
                assigned_id: Some(record.id.clone()).filter(|id| !id.is_empty()),
                error_code: None,
                error_message: None,
                details: record,
            }]),
            other => Err(unexpected(module, operation, &other)),
        }
    }
}

fn unexpected(module: &str, operation: Operation, response: &Response) -> CrmError {
    tracing::warn!(module = %module, operation = %operation, kind = response.kind(), "unexpected response kind");
    CrmError::UnknownResponseShape {
        module: module.to_string(),
        operation: operation.as_str().to_string(),
    }
}

/// Classify and decode a raw reply to `operation` on `module`.
pub fn interpret(bytes: &[u8], module: &str, operation: Operation) -> Result<Response, CrmError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let response = classify(&root, module, operation)?;
    tracing::debug!(module = %module, operation = %operation, kind = response.kind(), "response");
    Ok(response)
}

fn unknown(module: &str, operation: Operation) -> CrmError {
    CrmError::UnknownResponseShape {
        module: module.to_string(),
        operation: operation.as_str().to_string(),
    }
}

fn code_and_message(node: &Value) -> (String, String) {
    let code = node.get("code").and_then(text_of).unwrap_or_default();
    let message = node
        .get("message")
        .or_else(|| node.get("details"))
        .and_then(text_of)
        .unwrap_or_default();
    (code, message)
}

fn classify(root: &Value, module: &str, operation: Operation) -> Result<Response, CrmError> {
    let body = root.get("response").unwrap_or(root);
    let result = body.get("result");

    if let Some(error) = body.get("error").or_else(|| root.get("error")) {
        let (code, message) = code_and_message(error);
        if code == NO_CONTENT_CODE {
            return Ok(Response::NoContent { code, message });
        }
        return Err(CrmError::Remote { code, message });
    }

    if let Some(nodata) = body.get("nodata") {
        let (code, message) = code_and_message(nodata);
        return Ok(Response::NoContent { code, message });
    }

    match operation {
        Operation::GetFields => return field_catalog(body, module, operation),
        Operation::GetUsers => return users(body, module, operation),
        Operation::GetModules => return modules(result, module, operation),
        Operation::GetDeletedRecordIds => return deleted_ids(result, module, operation),
        _ => {}
    }

    let Some(result) = result else {
        return match body.get("success") {
            Some(success) if success.is_object() => Ok(Response::Success(flatten(success))),
            _ => Err(unknown(module, operation)),
        };
    };

    if let Some(rows) = result.get(module) {
        return records(rows.get("row").unwrap_or(&Value::Null), module).map(Response::Records);
    }

    let multi_row = many(result.get("row").unwrap_or(&Value::Null))
        .iter()
        .any(|r| r.get("success").is_some() || r.get("error").is_some());

    if !multi_row {
        if let (Some(message), Some(detail)) = (result.get("message"), result.get("recorddetail")) {
            let first = many(detail).into_iter().next().unwrap_or(&Value::Null);
            let record = Record::from_fl(module, first.get("FL").unwrap_or(&Value::Null))?;
            return Ok(Response::PostResult {
                record,
                message: text_of(message).unwrap_or_default(),
            });
        }
    } else {
        return batch(result, module).map(Response::BatchResult);
    }

    if let (Some(code), Some(message)) = (result.get("code"), result.get("message")) {
        return Ok(Response::Status {
            code: text_of(code).unwrap_or_default(),
            message: text_of(message).unwrap_or_default(),
        });
    }

    if let Some(code) = result.get("success").and_then(|s| s.get("code")).and_then(text_of) {
        return Ok(Response::Status {
            code,
            message: "success".into(),
        });
    }

    Err(unknown(module, operation))
}

fn field_catalog(body: &Value, module: &str, operation: Operation) -> Result<Response, CrmError> {
    let node = body.get(module).unwrap_or(body);
    let Some(sections) = node.get("section") else {
        if body.get(module).is_some() {
            return Ok(Response::FieldCatalog(Vec::new()));
        }
        return Err(unknown(module, operation));
    };
    let raw: Vec<RawSection> = many(sections)
        .into_iter()
        .map(|s| serde_json::from_value(s.clone()))
        .collect::<Result<_, _>>()?;
    Ok(Response::FieldCatalog(resolve_sections(module, raw)?))
}

fn users(body: &Value, module: &str, operation: Operation) -> Result<Response, CrmError> {
    let list = body
        .get("users")
        .and_then(|u| u.get("user"))
        .ok_or_else(|| unknown(module, operation))?;
    let mut out = BTreeMap::new();
    for user in many(list) {
        let obj = user
            .as_object()
            .ok_or_else(|| CrmError::Malformed(format!("user entry must be an object, got {}", user)))?;
        let id = obj
            .get("id")
            .and_then(text_of)
            .ok_or_else(|| CrmError::Malformed("user entry without id".into()))?;
        let mut attrs = BTreeMap::new();
        for (k, v) in obj {
            if k == "content" {
                continue;
            }
            if let Some(text) = text_of(v) {
                attrs.insert(k.clone(), text);
            }
        }
        attrs.insert("name".into(), obj.get("content").and_then(text_of).unwrap_or_default());
        out.insert(id, attrs);
    }
    Ok(Response::Users(out))
}

fn modules(result: Option<&Value>, module: &str, operation: Operation) -> Result<Response, CrmError> {
    let rows = result
        .and_then(|r| r.get("row"))
        .ok_or_else(|| unknown(module, operation))?;
    let mut numbered = BTreeMap::new();
    for row in many(rows) {
        let no = row_number(row)?;
        let key = row.get("content").and_then(text_of).unwrap_or_default();
        let descriptor = ModuleDescriptor {
            singular_label: row.get("sl").and_then(text_of).unwrap_or_else(|| key.clone()),
            plural_label: row.get("pl").and_then(text_of).unwrap_or_else(|| key.clone()),
            key,
        };
        numbered.insert(no, descriptor);
    }
    Ok(Response::Modules(numbered.into_values().collect()))
}

fn deleted_ids(result: Option<&Value>, module: &str, operation: Operation) -> Result<Response, CrmError> {
    let node = result
        .and_then(|r| r.get("DeletedIDs"))
        .ok_or_else(|| unknown(module, operation))?;
    let ids = match node {
        Value::Array(items) => items.iter().filter_map(text_of).collect(),
        other => text_of(other)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    };
    Ok(Response::DeletedIds(ids))
}

/// Rows keyed by their `no`, so arrival order does not matter.
fn records(rows: &Value, module: &str) -> Result<Vec<Record>, CrmError> {
    let mut numbered = BTreeMap::new();
    for row in many(rows) {
        let no = row_number(row)?;
        let record = Record::from_fl(module, row.get("FL").unwrap_or(&Value::Null))?;
        if numbered.insert(no, record).is_some() {
            return Err(CrmError::Malformed(format!("duplicate row number {} for {}", no, module)));
        }
    }
    Ok(numbered.into_values().collect())
}

fn batch(result: &Value, module: &str) -> Result<Vec<BatchItemResult>, CrmError> {
    let mut numbered = BTreeMap::new();
    for row in many(result.get("row").unwrap_or(&Value::Null)) {
        let no = row_number(row)?;
        let item = if let Some(success) = row.get("success") {
            let details = match success.get("details") {
                Some(d) => Record::from_fl(module, d.get("FL").unwrap_or(&Value::Null))?,
                None => Record::new(),
            };
            BatchItemResult {
                row: no,
                success: true,
                assigned_id: Some(details.id.clone()).filter(|id| !id.is_empty()),
                error_code: success.get("code").and_then(text_of),
                error_message: None,
                details,
            }
        } else {
            let (code, message) = code_and_message(row.get("error").unwrap_or(&Value::Null));
            BatchItemResult {
                row: no,
                success: false,
                assigned_id: None,
                error_code: Some(code),
                error_message: Some(message),
                details: Record::new(),
            }
        };
        if numbered.insert(no, item).is_some() {
            return Err(CrmError::Malformed(format!("duplicate row number {} for {}", no, module)));
        }
    }
    Ok(numbered.into_values().collect())
}

fn flatten(node: &Value) -> BTreeMap<String, String> {
    node.as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| text_of(v).map(|t| (k.clone(), t)))
                .collect()
        })
        .unwrap_or_default()
}
