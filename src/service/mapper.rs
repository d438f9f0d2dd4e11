//! Object <-> record mapping. Encoding sends only changed fields; decoding reads every field and
//! leaves the object clean.

use crate::bean::{DataObject, FieldValue, SystemFields};
use crate::config::{FieldCatalog, FieldDescriptor, TypeTag, ValueType};
use crate::error::CrmError;
use crate::wire::{Record, UserRef, WireValue};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
/// Accepted date formats, tried in order before ISO-8601.
const DATE_INPUT_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];
/// Zone-less datetime formats, read in the account time zone.
const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Record holding the id, the owner when known, and every changed non-system field.
pub fn to_record<O>(obj: &O, catalog: &FieldCatalog, tz: FixedOffset) -> Result<Record, CrmError>
where
    O: DataObject + ?Sized,
{
    let mut record = Record::with_id(obj.id());
    let system = obj.system();
    if let Some(owner_id) = system.owner_id.as_ref().filter(|id| !id.is_empty()) {
        record.owner = Some(UserRef {
            id: owner_id.clone(),
            name: system.owner_name.clone().unwrap_or_default(),
        });
    }
    for field in catalog.tracked() {
        if !obj.is_dirty(&field.name) {
            continue;
        }
        let value = obj.field(&field.name)?;
        record.set(field.wire_name.clone(), encode(field, value, tz));
    }
    Ok(record)
}

fn encode(field: &FieldDescriptor, value: FieldValue, tz: FixedOffset) -> WireValue {
    match value {
        FieldValue::Null => WireValue::Null,
        FieldValue::Text(s) if matches!(field.type_tag, TypeTag::Lookup | TypeTag::OwnerLookup) => {
            if s.trim().is_empty() {
                WireValue::Null
            } else {
                WireValue::Reference { id: s, name: None }
            }
        }
        FieldValue::Text(s) => WireValue::Text(s),
        FieldValue::Integer(n) => WireValue::Text(n.to_string()),
        FieldValue::Decimal(n) => WireValue::Text(n.to_string()),
        FieldValue::Boolean(b) => WireValue::Text(if b { "true" } else { "false" }.to_string()),
        FieldValue::Date(d) => WireValue::Text(d.format(DATE_FORMAT).to_string()),
        FieldValue::DateTime(dt) => WireValue::Text(dt.with_timezone(&tz).format(DATETIME_FORMAT).to_string()),
        FieldValue::List(items) if items.is_empty() => WireValue::Null,
        FieldValue::List(items) => WireValue::List(items),
    }
}

/// Populate `obj` from `record`: system fields are replaced, every catalog field present in the
/// record is decoded, then all change flags are cleared and the record is kept on the object.
pub fn from_record<O>(obj: &mut O, record: &Record, catalog: &FieldCatalog, tz: FixedOffset) -> Result<(), CrmError>
where
    O: DataObject + ?Sized,
{
    let system = decode_system(record, tz)?;
    *obj.system_mut() = system;
    decode_fields(obj, record, catalog, tz)?;
    clear_dirty(obj, catalog)?;
    obj.system_mut().last_record = Some(record.clone());
    Ok(())
}

/// Apply a write result: system values the remote echoed overwrite the object's, decoded fields
/// are stored, and all change flags are cleared.
pub fn merge_record<O>(obj: &mut O, record: &Record, catalog: &FieldCatalog, tz: FixedOffset) -> Result<(), CrmError>
where
    O: DataObject + ?Sized,
{
    let echoed = decode_system(record, tz)?;
    let system = obj.system_mut();
    if !echoed.id.is_empty() {
        system.id = echoed.id;
    }
    overwrite(&mut system.created_time, echoed.created_time);
    overwrite(&mut system.modified_time, echoed.modified_time);
    overwrite(&mut system.last_activity_time, echoed.last_activity_time);
    overwrite(&mut system.created_by_id, echoed.created_by_id);
    overwrite(&mut system.created_by_name, echoed.created_by_name);
    overwrite(&mut system.modified_by_id, echoed.modified_by_id);
    overwrite(&mut system.modified_by_name, echoed.modified_by_name);
    overwrite(&mut system.owner_id, echoed.owner_id);
    overwrite(&mut system.owner_name, echoed.owner_name);
    decode_fields(obj, record, catalog, tz)?;
    clear_dirty(obj, catalog)
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

pub fn clear_dirty<O>(obj: &mut O, catalog: &FieldCatalog) -> Result<(), CrmError>
where
    O: DataObject + ?Sized,
{
    for field in catalog.tracked() {
        obj.set_dirty(&field.name, false)?;
    }
    Ok(())
}

fn decode_system(record: &Record, tz: FixedOffset) -> Result<SystemFields, CrmError> {
    let time = |name: &str, value: &Option<String>| -> Result<Option<DateTime<FixedOffset>>, CrmError> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => parse_datetime(name, v, &record.id, tz).map(Some),
        }
    };
    let (created_by_id, created_by_name) = split_user(&record.created_by);
    let (modified_by_id, modified_by_name) = split_user(&record.modified_by);
    let (owner_id, owner_name) = split_user(&record.owner);
    Ok(SystemFields {
        id: record.id.clone(),
        created_time: time("createdTime", &record.created_time)?,
        modified_time: time("modifiedTime", &record.modified_time)?,
        last_activity_time: time("lastActivityTime", &record.last_activity_time)?,
        created_by_id,
        created_by_name,
        modified_by_id,
        modified_by_name,
        owner_id,
        owner_name,
        last_record: None,
    })
}

fn split_user(user: &Option<UserRef>) -> (Option<String>, Option<String>) {
    let non_empty = |s: &String| if s.is_empty() { None } else { Some(s.clone()) };
    match user {
        Some(u) => (non_empty(&u.id), non_empty(&u.name)),
        None => (None, None),
    }
}

fn decode_fields<O>(obj: &mut O, record: &Record, catalog: &FieldCatalog, tz: FixedOffset) -> Result<(), CrmError>
where
    O: DataObject + ?Sized,
{
    for (wire, value) in record.fields() {
        let Some(field) = catalog.by_wire_name(wire).filter(|f| f.is_tracked()) else {
            continue;
        };
        if let Some(decoded) = decode(field, value, &record.id, tz)? {
            obj.set_field(&field.name, decoded)?;
        }
    }
    Ok(())
}

/// `None` for values with no property form (line items).
fn decode(field: &FieldDescriptor, value: &WireValue, record_id: &str, tz: FixedOffset) -> Result<Option<FieldValue>, CrmError> {
    let value_type = field.value_type();
    let text = match value {
        WireValue::Null => return Ok(Some(FieldValue::empty(value_type))),
        WireValue::Items { .. } => return Ok(None),
        WireValue::List(items) if value_type == ValueType::TextList => {
            return Ok(Some(FieldValue::List(items.clone())));
        }
        WireValue::Reference { id, .. } if value_type == ValueType::TextList => {
            return Ok(Some(FieldValue::List(vec![id.clone()])));
        }
        other => other.as_text().unwrap_or_default(),
    };
    if text.trim().is_empty() && value_type != ValueType::Text {
        return Ok(Some(FieldValue::empty(value_type)));
    }
    let mismatch = || CrmError::TypeMismatch {
        field: field.name.clone(),
        expected: value_type.name(),
        found: format!("{:?}", text),
    };
    let decoded = match value_type {
        ValueType::Text => FieldValue::Text(text.clone()),
        ValueType::Integer => FieldValue::Integer(text.trim().parse().map_err(|_| mismatch())?),
        ValueType::Decimal => FieldValue::Decimal(text.trim().parse().map_err(|_| mismatch())?),
        ValueType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => FieldValue::Boolean(true),
            "false" | "0" => FieldValue::Boolean(false),
            _ => return Err(mismatch()),
        },
        ValueType::Date => FieldValue::Date(parse_date(&field.name, text.trim(), record_id)?),
        ValueType::DateTime => FieldValue::DateTime(parse_datetime(&field.name, text.trim(), record_id, tz)?),
        ValueType::TextList => FieldValue::List(
            text.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    };
    Ok(Some(decoded))
}

fn temporal_error(field: &str, value: &str, record_id: &str) -> CrmError {
    CrmError::TemporalParse {
        field: field.to_string(),
        value: value.to_string(),
        record_id: record_id.to_string(),
    }
}

/// `M/d/Y`, then `Y-m-d`, then ISO-8601.
pub fn parse_date(field: &str, value: &str, record_id: &str) -> Result<NaiveDate, CrmError> {
    for format in DATE_INPUT_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Ok(d);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .map_err(|_| temporal_error(field, value, record_id))
}

/// ISO-8601 with offset, else a zone-less timestamp in the account time zone.
pub fn parse_datetime(field: &str, value: &str, record_id: &str, tz: FixedOffset) -> Result<DateTime<FixedOffset>, CrmError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            if let Some(dt) = tz.from_local_datetime(&naive).single() {
                return Ok(dt);
            }
        }
    }
    Err(temporal_error(field, value, record_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::DynamicBean;
    use crate::config::FieldDescriptor;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn catalog() -> FieldCatalog {
        let mut employees = FieldDescriptor::new("employees", "Employees", TypeTag::Number);
        employees.remote_type = "integer".into();
        let mut revenue = FieldDescriptor::new("revenue", "Annual_Revenue", TypeTag::Number);
        revenue.remote_type = "currency".into();
        let mut account = FieldDescriptor::new("accountNameID", "Account_Name", TypeTag::Lookup);
        account.lookup_module = Some("Accounts".into());
        let mut created = FieldDescriptor::new("createdTime", "Created_Time", TypeTag::DateTime);
        created.is_system = true;
        FieldCatalog::new(
            "Contacts",
            vec![
                FieldDescriptor::new("lastName", "Last_Name", TypeTag::Text),
                employees,
                revenue,
                FieldDescriptor::new("emailOptOut", "Email_Opt_Out", TypeTag::Boolean),
                FieldDescriptor::new("birthday", "Date_of_Birth", TypeTag::Date),
                FieldDescriptor::new("callTime", "Call_Time", TypeTag::DateTime),
                FieldDescriptor::new("hobbies", "Hobbies", TypeTag::MultiPicklist),
                account,
                FieldDescriptor::new("photo", "Photo", TypeTag::FileUpload),
                created,
            ],
        )
        .unwrap()
    }

    #[test]
    fn only_changed_fields_are_encoded() {
        let catalog = catalog();
        let mut bean = DynamicBean::new(&catalog);
        bean.system_mut().id = "42".into();
        bean.set_field("lastName", FieldValue::Text("Doe".into())).unwrap();
        bean.set_field("hobbies", FieldValue::List(vec![])).unwrap();
        bean.set_field("accountNameID", FieldValue::Text("900".into())).unwrap();
        bean.set_field("emailOptOut", FieldValue::Boolean(true)).unwrap();
        bean.set_dirty("emailOptOut", false).unwrap();

        let record = to_record(&bean, &catalog, tz()).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("Last_Name"), Some(&WireValue::Text("Doe".into())));
        assert_eq!(record.get("Hobbies"), Some(&WireValue::Null));
        assert_eq!(
            record.get("Account_Name"),
            Some(&WireValue::Reference { id: "900".into(), name: None })
        );
        assert!(record.get("Email_Opt_Out").is_none());
    }

    #[test]
    fn cleared_lookups_are_sent_as_null() {
        let catalog = catalog();
        for cleared in ["", "  "] {
            let mut bean = DynamicBean::new(&catalog);
            bean.set_field("accountNameID", FieldValue::Text(cleared.into())).unwrap();
            let record = to_record(&bean, &catalog, tz()).unwrap();
            assert_eq!(record.get("Account_Name"), Some(&WireValue::Null));
        }
    }

    #[test]
    fn temporal_values_use_wire_formats() {
        let catalog = catalog();
        let mut bean = DynamicBean::new(&catalog);
        let birthday = NaiveDate::from_ymd_opt(1990, 7, 4).unwrap();
        let call = DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z").unwrap();
        bean.set_field("birthday", FieldValue::Date(birthday)).unwrap();
        bean.set_field("callTime", FieldValue::DateTime(call)).unwrap();
        let record = to_record(&bean, &catalog, tz()).unwrap();
        assert_eq!(record.get("Date_of_Birth"), Some(&WireValue::Text("1990-07-04".into())));
        assert_eq!(record.get("Call_Time"), Some(&WireValue::Text("2024-03-01T10:00:00+02:00".into())));
        assert!(record.owner.is_none());
    }

    #[test]
    fn decoding_reads_every_field_and_leaves_the_object_clean() {
        let catalog = catalog();
        let mut record = Record::with_id("7");
        record.created_time = Some("2024-01-02 03:04:05".into());
        record.owner = Some(UserRef { id: "u1".into(), name: "Ann".into() });
        record.set("Last_Name", WireValue::Text("Doe".into()));
        record.set("Employees", WireValue::Text("12".into()));
        record.set("Annual_Revenue", WireValue::Text("1500.5".into()));
        record.set("Email_Opt_Out", WireValue::Text("true".into()));
        record.set("Date_of_Birth", WireValue::Text("07/04/1990".into()));
        record.set("Hobbies", WireValue::Text("golf;chess".into()));
        record.set("Account_Name", WireValue::Reference { id: "900".into(), name: Some("Acme".into()) });
        record.set("Photo", WireValue::Text("blob".into()));
        record.set("Unknown_Field", WireValue::Text("x".into()));

        let mut bean = DynamicBean::new(&catalog);
        bean.set_field("lastName", FieldValue::Text("stale".into())).unwrap();
        from_record(&mut bean, &record, &catalog, tz()).unwrap();

        assert_eq!(bean.id(), "7");
        assert_eq!(bean.system().owner_name.as_deref(), Some("Ann"));
        assert_eq!(
            bean.system().created_time,
            Some(DateTime::parse_from_rfc3339("2024-01-02T03:04:05+02:00").unwrap())
        );
        assert_eq!(bean.field("lastName").unwrap(), FieldValue::Text("Doe".into()));
        assert_eq!(bean.field("employees").unwrap(), FieldValue::Integer(12));
        assert_eq!(bean.field("revenue").unwrap(), FieldValue::Decimal(1500.5));
        assert_eq!(bean.field("emailOptOut").unwrap(), FieldValue::Boolean(true));
        assert_eq!(
            bean.field("birthday").unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 7, 4).unwrap())
        );
        assert_eq!(
            bean.field("hobbies").unwrap(),
            FieldValue::List(vec!["golf".into(), "chess".into()])
        );
        assert_eq!(bean.field("accountNameID").unwrap(), FieldValue::Text("900".into()));
        for f in catalog.tracked() {
            assert!(!bean.is_dirty(&f.name), "{} still dirty", f.name);
        }
        assert!(bean.system().last_record.is_some());
    }

    #[test]
    fn unparseable_dates_fail_the_decode() {
        let catalog = catalog();
        let mut record = Record::with_id("7");
        record.set("Date_of_Birth", WireValue::Text("4th of July".into()));
        let mut bean = DynamicBean::new(&catalog);
        match from_record(&mut bean, &record, &catalog, tz()) {
            Err(CrmError::TemporalParse { field, record_id, .. }) => {
                assert_eq!(field, "birthday");
                assert_eq!(record_id, "7");
            }
            other => panic!("expected temporal error, got {:?}", other),
        }
    }

    #[test]
    fn date_formats_are_tried_in_order() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(parse_date("d", "12/31/2023", "").unwrap(), expected);
        assert_eq!(parse_date("d", "2023-12-31", "").unwrap(), expected);
        assert_eq!(parse_date("d", "2023-12-31T22:00:00-05:00", "").unwrap(), expected);
    }

    #[test]
    fn merging_a_write_result_keeps_unechoed_system_values() {
        let catalog = catalog();
        let mut bean = DynamicBean::new(&catalog);
        bean.system_mut().owner_id = Some("u1".into());
        bean.set_field("lastName", FieldValue::Text("Doe".into())).unwrap();
        let mut result = Record::with_id("55");
        result.modified_time = Some("2024-02-02T10:00:00+00:00".into());
        merge_record(&mut bean, &result, &catalog, tz()).unwrap();
        assert_eq!(bean.id(), "55");
        assert_eq!(bean.system().owner_id.as_deref(), Some("u1"));
        assert!(bean.system().modified_time.is_some());
        assert_eq!(bean.field("lastName").unwrap(), FieldValue::Text("Doe".into()));
        assert!(!bean.is_dirty("lastName"));
    }
}
