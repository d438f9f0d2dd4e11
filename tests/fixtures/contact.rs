// Generated by crm-codegen from the `Contacts` field catalog. Do not edit.

use crm_bridge::bean::{convert, DataObject, FieldSlot, FieldTable, FieldType, FieldValue, SystemFields};
use crm_bridge::config::FieldCatalog;
use crm_bridge::error::{ConfigError, CrmError};
use crm_bridge::service::DataAccess;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Record of the `Contacts` module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contact {
    system: SystemFields,
    /// Last Name (`Last_Name`)
    last_name: Option<String>,
    dirty_last_name: bool,
    /// Email (`Email`)
    email: Option<String>,
    dirty_email: bool,
    /// Account Name (`Account_Name`)
    account_name_id: Option<String>,
    dirty_account_name_id: bool,
    /// Date of Birth (`Date_of_Birth`)
    date_of_birth: Option<NaiveDate>,
    dirty_date_of_birth: bool,
    /// Email Opt Out (`Email_Opt_Out`)
    email_opt_out: bool,
    dirty_email_opt_out: bool,
    /// Tags (`Tags`)
    tags: Vec<String>,
    dirty_tags: bool,
}

impl Contact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_time(&self) -> Option<DateTime<FixedOffset>> {
        self.system.created_time
    }

    pub fn modified_time(&self) -> Option<DateTime<FixedOffset>> {
        self.system.modified_time
    }

    pub fn last_activity_time(&self) -> Option<DateTime<FixedOffset>> {
        self.system.last_activity_time
    }

    pub fn created_by_id(&self) -> Option<&str> {
        self.system.created_by_id.as_deref()
    }

    pub fn created_by_name(&self) -> Option<&str> {
        self.system.created_by_name.as_deref()
    }

    pub fn modified_by_id(&self) -> Option<&str> {
        self.system.modified_by_id.as_deref()
    }

    pub fn modified_by_name(&self) -> Option<&str> {
        self.system.modified_by_name.as_deref()
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.system.owner_id.as_deref()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.system.owner_name.as_deref()
    }

    /// Last Name (`Last_Name`), required
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn set_last_name(&mut self, value: Option<String>) {
        self.last_name = value;
        self.dirty_last_name = true;
    }

    /// Email (`Email`)
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, value: Option<String>) {
        self.email = value;
        self.dirty_email = true;
    }

    /// Account Name (`Account_Name`)
    pub fn account_name_id(&self) -> Option<&str> {
        self.account_name_id.as_deref()
    }

    pub fn set_account_name_id(&mut self, value: Option<String>) {
        self.account_name_id = value;
        self.dirty_account_name_id = true;
    }

    /// Date of Birth (`Date_of_Birth`)
    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn set_date_of_birth(&mut self, value: Option<NaiveDate>) {
        self.date_of_birth = value;
        self.dirty_date_of_birth = true;
    }

    /// Email Opt Out (`Email_Opt_Out`)
    pub fn email_opt_out(&self) -> bool {
        self.email_opt_out
    }

    pub fn set_email_opt_out(&mut self, value: bool) {
        self.email_opt_out = value;
        self.dirty_email_opt_out = true;
    }

    /// Tags (`Tags`)
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags(&mut self, value: Vec<String>) {
        self.tags = value;
        self.dirty_tags = true;
    }

}

static FIELDS: FieldTable<Contact> = FieldTable::new(&[
    FieldSlot {
        name: "accountNameID",
        get: |o| o.account_name_id.clone().into_value(),
        set: |o, v| {
            o.account_name_id = convert("accountNameID", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_account_name_id,
        mark: |o, d| o.dirty_account_name_id = d,
    },
    FieldSlot {
        name: "dateOfBirth",
        get: |o| o.date_of_birth.into_value(),
        set: |o, v| {
            o.date_of_birth = convert("dateOfBirth", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_date_of_birth,
        mark: |o, d| o.dirty_date_of_birth = d,
    },
    FieldSlot {
        name: "email",
        get: |o| o.email.clone().into_value(),
        set: |o, v| {
            o.email = convert("email", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_email,
        mark: |o, d| o.dirty_email = d,
    },
    FieldSlot {
        name: "emailOptOut",
        get: |o| o.email_opt_out.into_value(),
        set: |o, v| {
            o.email_opt_out = convert("emailOptOut", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_email_opt_out,
        mark: |o, d| o.dirty_email_opt_out = d,
    },
    FieldSlot {
        name: "lastName",
        get: |o| o.last_name.clone().into_value(),
        set: |o, v| {
            o.last_name = convert("lastName", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_last_name,
        mark: |o, d| o.dirty_last_name = d,
    },
    FieldSlot {
        name: "tags",
        get: |o| o.tags.clone().into_value(),
        set: |o, v| {
            o.tags = convert("tags", v)?;
            Ok(())
        },
        dirty: |o| o.dirty_tags,
        mark: |o, d| o.dirty_tags = d,
    },
]);

impl DataObject for Contact {
    fn system(&self) -> &SystemFields {
        &self.system
    }

    fn system_mut(&mut self) -> &mut SystemFields {
        &mut self.system
    }

    fn field(&self, name: &str) -> Result<FieldValue, CrmError> {
        FIELDS.get(self, name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CrmError> {
        FIELDS.set(self, name, value)
    }

    fn is_dirty(&self, name: &str) -> bool {
        FIELDS.is_dirty(self, name)
    }

    fn set_dirty(&mut self, name: &str, dirty: bool) -> Result<(), CrmError> {
        FIELDS.set_dirty(self, name, dirty)
    }
}

const CATALOG: &str = r#"{
  "module": "Contacts",
  "fields": [
    {
      "name": "id",
      "wire_name": "Id",
      "label": "Id",
      "type_tag": "text",
      "remote_type": "",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": true
    },
    {
      "name": "lastName",
      "wire_name": "Last_Name",
      "label": "Last Name",
      "type_tag": "text",
      "remote_type": "",
      "required": true,
      "read_only": false,
      "max_length": 80,
      "is_custom": false,
      "is_system": false
    },
    {
      "name": "email",
      "wire_name": "Email",
      "label": "Email",
      "type_tag": "text",
      "remote_type": "email",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": false
    },
    {
      "name": "accountNameID",
      "wire_name": "Account_Name",
      "label": "Account Name",
      "type_tag": "lookup",
      "remote_type": "",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": false,
      "lookup_module": "Accounts"
    },
    {
      "name": "dateOfBirth",
      "wire_name": "Date_of_Birth",
      "label": "Date of Birth",
      "type_tag": "date",
      "remote_type": "",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": false
    },
    {
      "name": "emailOptOut",
      "wire_name": "Email_Opt_Out",
      "label": "Email Opt Out",
      "type_tag": "boolean",
      "remote_type": "",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": false
    },
    {
      "name": "tags",
      "wire_name": "Tags",
      "label": "Tags",
      "type_tag": "multi_picklist",
      "remote_type": "",
      "required": false,
      "read_only": false,
      "max_length": 0,
      "is_custom": false,
      "is_system": false
    }
  ]
}"#;

/// Data access for the `Contacts` module.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContactAccess;

impl DataAccess for ContactAccess {
    type Object = Contact;

    fn module(&self) -> &str {
        "Contacts"
    }

    fn singular_name(&self) -> &str {
        "Contact"
    }

    fn plural_name(&self) -> &str {
        "Contacts"
    }

    fn catalog(&self) -> Result<FieldCatalog, ConfigError> {
        FieldCatalog::from_snapshot(CATALOG)
    }

    fn create(&self, _catalog: &FieldCatalog) -> Contact {
        Contact::default()
    }
}
