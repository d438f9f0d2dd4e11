#![allow(dead_code)]

use async_trait::async_trait;
use crm_bridge::config::{FieldDescriptor, FieldSection, ModuleDescriptor, TypeTag};
use crm_bridge::error::TransportError;
use crm_bridge::wire::{Operation, Request};
use crm_bridge::{ClientSettings, CrmClient, Transport};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&Request) -> Result<Value, TransportError> + Send + Sync>;

/// In-memory transport: answers with a closure and records every request.
pub struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Request) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Arc::new(MockTransport {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, request: &Request) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = (self.responder)(request)?;
        Ok(serde_json::to_vec(&reply).unwrap())
    }
}

pub fn client(transport: Arc<MockTransport>) -> CrmClient {
    CrmClient::new(transport, ClientSettings::default())
}

/// FL rows of a write request body, in submission order.
pub fn submitted_rows(request: &Request) -> Vec<Value> {
    let body = request.body.as_ref().expect("write request without body");
    let module_node = body.get(&request.module).expect("body not keyed by module");
    module_node["row"].as_array().cloned().unwrap_or_default()
}

/// Content of `key` in one submitted FL row.
pub fn fl_value(row: &Value, key: &str) -> Option<String> {
    row["FL"]
        .as_array()?
        .iter()
        .find(|e| e["val"] == key)
        .and_then(|e| e["content"].as_str().map(str::to_string))
}

pub fn success_row(no: usize, id: &str) -> Value {
    json!({
        "no": no.to_string(),
        "success": {
            "code": "2000",
            "details": {"FL": [
                {"val": "Id", "content": id},
                {"val": "Modified Time", "content": "2024-05-01 10:00:00"}
            ]}
        }
    })
}

pub fn error_row(no: usize, code: &str, message: &str) -> Value {
    json!({"no": no.to_string(), "error": {"code": code, "details": message}})
}

pub fn batch_reply(rows: Vec<Value>) -> Value {
    json!({"response": {"result": {"row": rows}}})
}

pub fn records_reply(module: &str, rows: Vec<Vec<Value>>) -> Value {
    let rows: Vec<Value> = rows
        .into_iter()
        .enumerate()
        .map(|(i, fl)| json!({"no": (i + 1).to_string(), "FL": fl}))
        .collect();
    let mut result = serde_json::Map::new();
    result.insert(module.to_string(), json!({ "row": rows }));
    json!({"response": {"result": result}})
}

pub fn no_content() -> Value {
    json!({"response": {"nodata": {"code": "4422", "message": "There is no data to show"}}})
}

pub fn contact_row(id: &str, last_name: &str) -> Vec<Value> {
    vec![
        json!({"val": "CONTACTID", "content": id}),
        json!({"val": "Last_Name", "content": last_name}),
        json!({"val": "Account_Name", "id": "900", "content": "Acme"}),
        json!({"val": "Date_of_Birth", "content": "1990-07-04"}),
        json!({"val": "Email_Opt_Out", "content": "false"}),
    ]
}

pub fn is_write(request: &Request) -> bool {
    matches!(request.operation, Operation::InsertRecords | Operation::UpdateRecords)
}

#[path = "../fixtures/contact.rs"]
mod contact;

pub use contact::{Contact, ContactAccess};

/// Schema the `Contact` fixture was rendered from.
pub fn contact_schema() -> (ModuleDescriptor, Vec<FieldSection>) {
    let mut id = FieldDescriptor::new("id", "Id", TypeTag::Text);
    id.is_system = true;
    let mut last = FieldDescriptor::new("lastName", "Last_Name", TypeTag::Text);
    last.label = "Last Name".into();
    last.required = true;
    last.max_length = 80;
    let mut email = FieldDescriptor::new("email", "Email", TypeTag::Text);
    email.remote_type = "email".into();
    let mut account = FieldDescriptor::new("accountNameID", "Account_Name", TypeTag::Lookup);
    account.label = "Account Name".into();
    account.lookup_module = Some("Accounts".into());
    let mut birthday = FieldDescriptor::new("dateOfBirth", "Date_of_Birth", TypeTag::Date);
    birthday.label = "Date of Birth".into();
    let mut opt_out = FieldDescriptor::new("emailOptOut", "Email_Opt_Out", TypeTag::Boolean);
    opt_out.label = "Email Opt Out".into();
    let tags = FieldDescriptor::new("tags", "Tags", TypeTag::MultiPicklist);
    let module = ModuleDescriptor {
        key: "Contacts".into(),
        singular_label: "Contact".into(),
        plural_label: "Contacts".into(),
    };
    let sections = vec![FieldSection {
        name: "Contact Information".into(),
        fields: vec![id, last, email, account, birthday, opt_out, tags],
    }];
    (module, sections)
}

pub fn new_contact(last_name: &str) -> Contact {
    let mut c = Contact::new();
    c.set_last_name(Some(last_name.to_string()));
    c
}
