//! Builds the request for each remote operation: module, operation name, query parameters, body.

use crate::wire::record::Record;
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use std::fmt;

/// Query-parameter timestamp format.
const PARAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFields,
    GetModules,
    GetUsers,
    GetRecords,
    GetRecordById,
    SearchRecords,
    GetRelatedRecords,
    GetDeletedRecordIds,
    InsertRecords,
    UpdateRecords,
    DeleteRecords,
    UpdateRelatedRecords,
    ConvertLead,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GetFields => "getFields",
            Operation::GetModules => "getModules",
            Operation::GetUsers => "getUsers",
            Operation::GetRecords => "getRecords",
            Operation::GetRecordById => "getRecordById",
            Operation::SearchRecords => "searchRecords",
            Operation::GetRelatedRecords => "getRelatedRecords",
            Operation::GetDeletedRecordIds => "getDeletedRecordIds",
            Operation::InsertRecords => "insertRecords",
            Operation::UpdateRecords => "updateRecords",
            Operation::DeleteRecords => "deleteRecords",
            Operation::UpdateRelatedRecords => "updateRelatedRecords",
            Operation::ConvertLead => "convertLead",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the transport needs for one remote call.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub module: String,
    pub operation: Operation,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(module: impl Into<String>, operation: Operation) -> Self {
        Request {
            module: module.into(),
            operation,
            params: Vec::new(),
            body: None,
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Optional filters of listing and search calls.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub sort_column: Option<String>,
    pub sort_order: Option<SortOrder>,
    /// Only records modified at or after this account-local time.
    pub modified_since: Option<NaiveDateTime>,
    /// Wire names to return; empty means all columns.
    pub select_columns: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// Reject rows that duplicate an existing record.
    Reject,
    /// Update the existing record instead.
    Update,
}

#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub trigger_workflow: bool,
    pub duplicate_check: Option<DuplicateCheck>,
    pub approval: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserKind {
    #[default]
    AllUsers,
    ActiveUsers,
    DeactiveUsers,
    AdminUsers,
    ActiveConfirmedAdmins,
}

impl UserKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UserKind::AllUsers => "AllUsers",
            UserKind::ActiveUsers => "ActiveUsers",
            UserKind::DeactiveUsers => "DeactiveUsers",
            UserKind::AdminUsers => "AdminUsers",
            UserKind::ActiveConfirmedAdmins => "ActiveConfirmedAdmins",
        }
    }
}

/// 1-based inclusive index window of a paged call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub from_index: usize,
    pub to_index: usize,
}

impl Page {
    /// Window of `size` rows after skipping `offset` rows.
    pub fn new(offset: usize, size: usize) -> Page {
        Page {
            from_index: offset + 1,
            to_index: offset + size,
        }
    }

    pub fn size(&self) -> usize {
        self.to_index + 1 - self.from_index
    }
}

fn paged(request: Request, page: Option<Page>) -> Request {
    match page {
        Some(p) => request
            .param("fromIndex", p.from_index.to_string())
            .param("toIndex", p.to_index.to_string()),
        None => request,
    }
}

fn select_columns(module: &str, columns: &[String]) -> Option<String> {
    if columns.is_empty() {
        None
    } else {
        Some(format!("{}({})", module, columns.join(",")))
    }
}

fn with_list_options(mut request: Request, options: &ListOptions) -> Request {
    if let Some(cols) = select_columns(&request.module, &options.select_columns) {
        request = request.param("selectColumns", cols);
    }
    if let Some(col) = &options.sort_column {
        request = request.param("sortColumnString", col.clone());
    }
    if let Some(order) = options.sort_order {
        request = request.param("sortOrderString", order.as_str());
    }
    if let Some(since) = options.modified_since {
        request = request.param("lastModifiedTime", since.format(PARAM_TIME_FORMAT).to_string());
    }
    request
}

fn with_write_options(mut request: Request, options: &WriteOptions) -> Request {
    if options.trigger_workflow {
        request = request.param("wfTrigger", "true");
    }
    match options.duplicate_check {
        Some(DuplicateCheck::Reject) => request = request.param("duplicateCheck", "1"),
        Some(DuplicateCheck::Update) => request = request.param("duplicateCheck", "2"),
        None => {}
    }
    if options.approval {
        request = request.param("isApproval", "true");
    }
    request
}

/// `{"<Module>":{"row":[{"no":"1","FL":[...]}, ...]}}`, rows numbered from 1 in slice order.
pub fn records_to_payload(module: &str, records: &[Record]) -> Value {
    let rows: Vec<Value> = records
        .iter()
        .enumerate()
        .map(|(i, r)| json!({"no": (i + 1).to_string(), "FL": r.to_fl()}))
        .collect();
    let mut root = serde_json::Map::new();
    root.insert(module.to_string(), json!({ "row": rows }));
    Value::Object(root)
}

pub fn get_fields(module: &str) -> Request {
    Request::new(module, Operation::GetFields).param("newFormat", "1")
}

pub fn get_modules() -> Request {
    Request::new("Info", Operation::GetModules).param("type", "api")
}

pub fn get_users(kind: UserKind) -> Request {
    Request::new("Users", Operation::GetUsers)
        .param("type", kind.as_str())
        .param("newFormat", "1")
}

pub fn get_records(module: &str, options: &ListOptions, page: Option<Page>) -> Request {
    let request = Request::new(module, Operation::GetRecords)
        .param("newFormat", "1")
        .param("version", "1");
    paged(with_list_options(request, options), page)
}

/// One id goes as `id`, several as a `;`-separated `idlist`.
pub fn get_record_by_ids(module: &str, ids: &[String]) -> Request {
    let request = Request::new(module, Operation::GetRecordById);
    let request = match ids {
        [single] => request.param("id", single.clone()),
        _ => request.param("idlist", ids.join(";")),
    };
    request.param("newFormat", "1")
}

/// Missing criteria means "everything": `()`.
pub fn search_records(module: &str, criteria: Option<&str>, options: &ListOptions, page: Option<Page>) -> Request {
    let criteria = criteria.filter(|c| !c.trim().is_empty()).unwrap_or("()");
    let request = Request::new(module, Operation::SearchRecords).param("criteria", criteria);
    paged(with_list_options(request, options), page).param("newFormat", "1")
}

pub fn get_related_records(module: &str, id: &str, parent_module: &str, page: Option<Page>) -> Request {
    let request = Request::new(module, Operation::GetRelatedRecords)
        .param("id", id)
        .param("parentModule", parent_module)
        .param("newFormat", "1");
    paged(request, page)
}

pub fn get_deleted_record_ids(module: &str, since: Option<NaiveDateTime>, page: Option<Page>) -> Request {
    let mut request = paged(Request::new(module, Operation::GetDeletedRecordIds), page);
    if let Some(since) = since {
        request = request.param("lastModifiedTime", since.format(PARAM_TIME_FORMAT).to_string());
    }
    request
}

pub fn insert_records(module: &str, records: &[Record], options: &WriteOptions) -> Request {
    let request = Request::new(module, Operation::InsertRecords);
    with_write_options(request, options)
        .param("newFormat", "2")
        .param("version", "4")
        .with_body(records_to_payload(module, records))
}

pub fn update_records(module: &str, records: &[Record], options: &WriteOptions) -> Request {
    let request = Request::new(module, Operation::UpdateRecords)
        .param("newFormat", "2")
        .param("version", "4");
    let request = if options.trigger_workflow {
        request.param("wfTrigger", "true")
    } else {
        request
    };
    request.with_body(records_to_payload(module, records))
}

pub fn delete_records(module: &str, id: &str) -> Request {
    Request::new(module, Operation::DeleteRecords)
        .param("id", id)
        .param("newFormat", "1")
}

pub fn update_related_records(module: &str, id: &str, related_module: &str, records: &[Record]) -> Request {
    Request::new(module, Operation::UpdateRelatedRecords)
        .param("newFormat", "2")
        .param("version", "4")
        .param("relatedModule", related_module)
        .param("id", id)
        .with_body(records_to_payload(related_module, records))
}

/// `body` carries the conversion options (`{"Potentials": {...}}`-style row).
pub fn convert_lead(lead_id: &str, body: Value) -> Request {
    Request::new("Leads", Operation::ConvertLead)
        .param("leadId", lead_id)
        .param("newFormat", "1")
        .with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireValue;
    use chrono::NaiveDate;

    #[test]
    fn listing_carries_window_and_filters() {
        let since = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let options = ListOptions {
            sort_column: Some("Modified_Time".into()),
            sort_order: Some(SortOrder::Desc),
            modified_since: Some(since),
            select_columns: vec!["First Name".into(), "Last Name".into()],
        };
        let r = get_records("Contacts", &options, Some(Page::new(200, 200)));
        assert_eq!(r.operation.as_str(), "getRecords");
        assert_eq!(r.param_value("fromIndex"), Some("201"));
        assert_eq!(r.param_value("toIndex"), Some("400"));
        assert_eq!(r.param_value("sortOrderString"), Some("desc"));
        assert_eq!(r.param_value("lastModifiedTime"), Some("2024-05-01 08:30:00"));
        assert_eq!(r.param_value("selectColumns"), Some("Contacts(First Name,Last Name)"));
    }

    #[test]
    fn search_defaults_to_empty_criteria() {
        let r = search_records("Leads", None, &ListOptions::default(), None);
        assert_eq!(r.param_value("criteria"), Some("()"));
        assert_eq!(r.param_value("fromIndex"), None);
    }

    #[test]
    fn ids_use_id_or_idlist() {
        assert_eq!(get_record_by_ids("Leads", &["1".into()]).param_value("id"), Some("1"));
        let many = get_record_by_ids("Leads", &["1".into(), "2".into()]);
        assert_eq!(many.param_value("idlist"), Some("1;2"));
        assert_eq!(many.param_value("id"), None);
    }

    #[test]
    fn insert_body_numbers_rows_from_one() {
        let mut a = Record::new();
        a.set("Last_Name", WireValue::Text("Doe".into()));
        let b = Record::new();
        let options = WriteOptions {
            trigger_workflow: true,
            duplicate_check: Some(DuplicateCheck::Update),
            approval: false,
        };
        let r = insert_records("Contacts", &[a, b], &options);
        assert_eq!(r.param_value("version"), Some("4"));
        assert_eq!(r.param_value("wfTrigger"), Some("true"));
        assert_eq!(r.param_value("duplicateCheck"), Some("2"));
        let body = r.body.unwrap();
        let rows = body["Contacts"]["row"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["no"], "1");
        assert_eq!(rows[1]["no"], "2");
        assert_eq!(rows[0]["FL"][0]["val"], "Last_Name");
    }

    #[test]
    fn modules_and_users_use_fixed_targets() {
        let m = get_modules();
        assert_eq!(m.module, "Info");
        assert_eq!(m.param_value("type"), Some("api"));
        assert_eq!(get_users(UserKind::AdminUsers).param_value("type"), Some("AdminUsers"));
        assert_eq!(Page::new(0, 50).size(), 50);
    }
}
