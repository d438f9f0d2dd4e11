//! Rendering stage: type specifications -> source files.

use crate::case::{is_rust_keyword, to_snake_case};
use crate::codegen::spec::{DataAccessSpec, DataObjectSpec, GeneratedModule, PropertySpec};
use crate::config::ValueType;
use crate::error::ConfigError;
use std::fmt::Write as _;

/// One output file, relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Target-language backend of the generator.
pub trait Renderer {
    fn language(&self) -> &str;

    fn render(&self, module: &GeneratedModule) -> Result<Vec<GeneratedFile>, ConfigError>;

    /// Optional file tying the rendered modules together.
    fn render_index(&self, _modules: &[GeneratedModule]) -> Option<GeneratedFile> {
        None
    }
}

/// Emits one Rust file per module plus a `mod.rs`. Generated code refers to the runtime through
/// `crate_path` (default `crm_bridge`).
#[derive(Clone, Debug)]
pub struct RustRenderer {
    pub crate_path: String,
}

impl Default for RustRenderer {
    fn default() -> Self {
        RustRenderer {
            crate_path: "crm_bridge".into(),
        }
    }
}

impl Renderer for RustRenderer {
    fn language(&self) -> &str {
        "rust"
    }

    fn render(&self, module: &GeneratedModule) -> Result<Vec<GeneratedFile>, ConfigError> {
        let content = self
            .module_source(module)
            .map_err(|e| ConfigError::Validation(format!("render {}: {}", module.object.module, e)))?;
        Ok(vec![GeneratedFile {
            path: format!("{}.rs", file_stem(&module.object.type_name)),
            content,
        }])
    }

    fn render_index(&self, modules: &[GeneratedModule]) -> Option<GeneratedFile> {
        if modules.is_empty() {
            return None;
        }
        let mut content = String::from("// Generated by crm-codegen. Do not edit.\n\n");
        for m in modules {
            content.push_str(&format!("mod {};\n", file_stem(&m.object.type_name)));
        }
        content.push('\n');
        for m in modules {
            content.push_str(&format!(
                "pub use {}::{{{}, {}}};\n",
                file_stem(&m.object.type_name),
                m.object.type_name,
                m.access.type_name
            ));
        }
        Some(GeneratedFile {
            path: "mod.rs".into(),
            content,
        })
    }
}

fn file_stem(type_name: &str) -> String {
    let stem = to_snake_case(type_name);
    if is_rust_keyword(&stem) {
        format!("{}_module", stem)
    } else {
        stem
    }
}

/// Member as written in source: keywords become raw identifiers.
fn ident(member: &str) -> String {
    if is_rust_keyword(member) {
        format!("r#{}", member)
    } else {
        member.to_string()
    }
}

/// Raw string literal that can hold `content`.
fn raw_literal(content: &str) -> String {
    let mut hashes = 1;
    while content.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{}\"{}\"{}", fence, content, fence)
}

impl RustRenderer {
    fn module_source(&self, module: &GeneratedModule) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        self.header(&mut out, &module.object)?;
        object_struct(&mut out, &module.object)?;
        accessors(&mut out, &module.object)?;
        field_table(&mut out, &module.object)?;
        data_object_impl(&mut out, &module.object)?;
        access_impl(&mut out, &module.access)?;
        Ok(out)
    }

    fn header(&self, out: &mut String, object: &DataObjectSpec) -> std::fmt::Result {
        let krate = &self.crate_path;
        let uses_date = object.properties.iter().any(|p| p.value_type == ValueType::Date);
        writeln!(out, "// Generated by crm-codegen from the `{}` field catalog. Do not edit.", object.module)?;
        writeln!(out)?;
        writeln!(out, "use {}::bean::{{convert, DataObject, FieldSlot, FieldTable, FieldType, FieldValue, SystemFields}};", krate)?;
        writeln!(out, "use {}::config::FieldCatalog;", krate)?;
        writeln!(out, "use {}::error::{{ConfigError, CrmError}};", krate)?;
        writeln!(out, "use {}::service::DataAccess;", krate)?;
        if uses_date {
            writeln!(out, "use chrono::{{DateTime, FixedOffset, NaiveDate}};")?;
        } else {
            writeln!(out, "use chrono::{{DateTime, FixedOffset}};")?;
        }
        writeln!(out)
    }
}

fn object_struct(out: &mut String, object: &DataObjectSpec) -> std::fmt::Result {
    writeln!(out, "/// Record of the `{}` module.", object.module)?;
    writeln!(out, "#[derive(Clone, Debug, Default, PartialEq)]")?;
    writeln!(out, "pub struct {} {{", object.type_name)?;
    writeln!(out, "    system: SystemFields,")?;
    for p in &object.properties {
        writeln!(out, "    /// {} (`{}`)", p.label, p.wire_name)?;
        writeln!(out, "    {}: {},", ident(&p.member), p.value_type.rust_type())?;
        writeln!(out, "    dirty_{}: bool,", p.member)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

fn getter(out: &mut String, p: &PropertySpec) -> std::fmt::Result {
    let name = ident(&p.member);
    let (ret, body) = match p.value_type {
        ValueType::Text => ("Option<&str>".to_string(), format!("self.{}.as_deref()", name)),
        ValueType::TextList => ("&[String]".to_string(), format!("&self.{}", name)),
        other => (other.rust_type().to_string(), format!("self.{}", name)),
    };
    let mut doc = format!("{} (`{}`)", p.label, p.wire_name);
    if p.required {
        doc.push_str(", required");
    }
    if p.read_only {
        doc.push_str(", read-only");
    }
    writeln!(out, "    /// {}", doc)?;
    writeln!(out, "    pub fn {}(&self) -> {} {{", name, ret)?;
    writeln!(out, "        {}", body)?;
    writeln!(out, "    }}")?;
    writeln!(out)
}

fn setter(out: &mut String, p: &PropertySpec) -> std::fmt::Result {
    writeln!(out, "    pub fn set_{}(&mut self, value: {}) {{", p.member, p.value_type.rust_type())?;
    writeln!(out, "        self.{} = value;", ident(&p.member))?;
    writeln!(out, "        self.dirty_{} = true;", p.member)?;
    writeln!(out, "    }}")?;
    writeln!(out)
}

const SYSTEM_GETTERS: &[(&str, &str)] = &[
    ("created_time", "Option<DateTime<FixedOffset>>"),
    ("modified_time", "Option<DateTime<FixedOffset>>"),
    ("last_activity_time", "Option<DateTime<FixedOffset>>"),
    ("created_by_id", "Option<&str>"),
    ("created_by_name", "Option<&str>"),
    ("modified_by_id", "Option<&str>"),
    ("modified_by_name", "Option<&str>"),
    ("owner_id", "Option<&str>"),
    ("owner_name", "Option<&str>"),
];

fn accessors(out: &mut String, object: &DataObjectSpec) -> std::fmt::Result {
    writeln!(out, "impl {} {{", object.type_name)?;
    writeln!(out, "    pub fn new() -> Self {{")?;
    writeln!(out, "        Self::default()")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    for (member, ty) in SYSTEM_GETTERS {
        let body = if ty.starts_with("Option<&") {
            format!("self.system.{}.as_deref()", member)
        } else {
            format!("self.system.{}", member)
        };
        writeln!(out, "    pub fn {}(&self) -> {} {{", member, ty)?;
        writeln!(out, "        {}", body)?;
        writeln!(out, "    }}")?;
        writeln!(out)?;
    }
    for p in &object.properties {
        getter(out, p)?;
        setter(out, p)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

/// Dispatch table, slots sorted by field name.
fn field_table(out: &mut String, object: &DataObjectSpec) -> std::fmt::Result {
    let mut sorted: Vec<&PropertySpec> = object.properties.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let ty = &object.type_name;
    writeln!(out, "static FIELDS: FieldTable<{}> = FieldTable::new(&[", ty)?;
    for p in sorted {
        let member = ident(&p.member);
        let read = match p.value_type {
            ValueType::Text | ValueType::TextList => format!("o.{}.clone().into_value()", member),
            _ => format!("o.{}.into_value()", member),
        };
        writeln!(out, "    FieldSlot {{")?;
        writeln!(out, "        name: {:?},", p.name)?;
        writeln!(out, "        get: |o| {},", read)?;
        writeln!(out, "        set: |o, v| {{")?;
        writeln!(out, "            o.{} = convert({:?}, v)?;", member, p.name)?;
        writeln!(out, "            Ok(())")?;
        writeln!(out, "        }},")?;
        writeln!(out, "        dirty: |o| o.dirty_{},", p.member)?;
        writeln!(out, "        mark: |o, d| o.dirty_{} = d,", p.member)?;
        writeln!(out, "    }},")?;
    }
    writeln!(out, "]);")?;
    writeln!(out)
}

fn data_object_impl(out: &mut String, object: &DataObjectSpec) -> std::fmt::Result {
    writeln!(out, "impl DataObject for {} {{", object.type_name)?;
    writeln!(out, "    fn system(&self) -> &SystemFields {{")?;
    writeln!(out, "        &self.system")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn system_mut(&mut self) -> &mut SystemFields {{")?;
    writeln!(out, "        &mut self.system")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn field(&self, name: &str) -> Result<FieldValue, CrmError> {{")?;
    writeln!(out, "        FIELDS.get(self, name)")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CrmError> {{")?;
    writeln!(out, "        FIELDS.set(self, name, value)")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn is_dirty(&self, name: &str) -> bool {{")?;
    writeln!(out, "        FIELDS.is_dirty(self, name)")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn set_dirty(&mut self, name: &str, dirty: bool) -> Result<(), CrmError> {{")?;
    writeln!(out, "        FIELDS.set_dirty(self, name, dirty)")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)
}

fn access_impl(out: &mut String, access: &DataAccessSpec) -> std::fmt::Result {
    writeln!(out, "const CATALOG: &str = {};", raw_literal(&access.catalog))?;
    writeln!(out)?;
    writeln!(out, "/// Data access for the `{}` module.", access.module)?;
    writeln!(out, "#[derive(Clone, Copy, Debug, Default)]")?;
    writeln!(out, "pub struct {};", access.type_name)?;
    writeln!(out)?;
    writeln!(out, "impl DataAccess for {} {{", access.type_name)?;
    writeln!(out, "    type Object = {};", access.object_type)?;
    writeln!(out)?;
    writeln!(out, "    fn module(&self) -> &str {{")?;
    writeln!(out, "        {:?}", access.module)?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn singular_name(&self) -> &str {{")?;
    writeln!(out, "        {:?}", access.singular_name)?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn plural_name(&self) -> &str {{")?;
    writeln!(out, "        {:?}", access.plural_name)?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn catalog(&self) -> Result<FieldCatalog, ConfigError> {{")?;
    writeln!(out, "        FieldCatalog::from_snapshot(CATALOG)")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    fn create(&self, _catalog: &FieldCatalog) -> {} {{", access.object_type)?;
    writeln!(out, "        {}::default()", access.object_type)?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")
}
