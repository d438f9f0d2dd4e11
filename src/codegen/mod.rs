//! Code generation in two stages: schema -> type specifications (pure), then specifications ->
//! source files through a [`Renderer`].

mod emit;
mod render;
mod spec;

pub use emit::write_files;
pub use render::{GeneratedFile, Renderer, RustRenderer};
pub use spec::{access_type_name, DataAccessSpec, DataObjectSpec, GeneratedModule, PropertySpec};

use crate::case::{to_snake_case, to_type_name};
use crate::client::CrmClient;
use crate::config::{FieldCatalog, FieldSection, ModuleDescriptor};
use crate::error::{ConfigError, CrmError};
use std::collections::HashSet;
use std::path::Path;

/// Member names that cannot be written even as raw identifiers.
const UNRAWABLE: &[&str] = &["self", "super", "crate"];

/// A module and the field catalog discovered for it.
#[derive(Clone, Debug)]
pub struct Discovered {
    pub module: ModuleDescriptor,
    pub sections: Vec<FieldSection>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub generated: Vec<GeneratedModule>,
    /// One `GenerationSkipped` per module left out.
    pub skipped: Vec<ConfigError>,
}

/// Specifications of the object and access types of one module. Fields are processed in
/// discovery order, so regenerating from the same schema yields the same names.
pub fn generate_module(module: &ModuleDescriptor, sections: &[FieldSection]) -> Result<GeneratedModule, ConfigError> {
    let catalog = FieldCatalog::from_sections(&module.key, sections)?;
    if catalog.is_empty() {
        return Err(ConfigError::GenerationSkipped {
            module: module.key.clone(),
            reason: "no fields returned by schema discovery".into(),
        });
    }

    let mut properties = Vec::new();
    let mut excluded = Vec::new();
    for field in catalog.iter() {
        if field.is_system {
            continue;
        }
        if !field.type_tag.is_generated() {
            tracing::warn!(
                module = %module.key,
                field = %field.wire_name,
                remote_type = %field.remote_type,
                "field type not supported, excluded"
            );
            excluded.push(field.wire_name.clone());
            continue;
        }
        let mut member = to_snake_case(&field.name);
        if UNRAWABLE.contains(&member.as_str()) {
            member.push('_');
        }
        properties.push(PropertySpec {
            name: field.name.clone(),
            member,
            wire_name: field.wire_name.clone(),
            label: field.label.clone(),
            type_tag: field.type_tag,
            value_type: field.value_type(),
            required: field.required,
            read_only: field.read_only,
        });
    }

    let type_name = to_type_name(&module.singular_label);
    Ok(GeneratedModule {
        object: DataObjectSpec {
            type_name: type_name.clone(),
            module: module.key.clone(),
            properties,
        },
        access: DataAccessSpec {
            type_name: access_type_name(&type_name),
            object_type: type_name,
            module: module.key.clone(),
            singular_name: module.singular_label.clone(),
            plural_name: module.plural_label.clone(),
            catalog: catalog.to_snapshot()?,
        },
        excluded,
    })
}

/// Generate every module. A module that fails is logged and reported as skipped; the rest
/// proceed. Type names colliding within the batch get `_2`, `_3`, ... suffixes.
pub fn generate_all(discovered: &[Discovered]) -> GenerationReport {
    let mut report = GenerationReport::default();
    let mut taken: HashSet<String> = HashSet::new();
    for entry in discovered {
        let mut generated = match generate_module(&entry.module, &entry.sections) {
            Ok(g) => g,
            Err(e) => {
                let skipped = match e {
                    ConfigError::GenerationSkipped { .. } => e,
                    other => ConfigError::GenerationSkipped {
                        module: entry.module.key.clone(),
                        reason: other.to_string(),
                    },
                };
                tracing::warn!(module = %entry.module.key, error = %skipped, "module skipped");
                report.skipped.push(skipped);
                continue;
            }
        };

        let base = generated.object.type_name.clone();
        let mut candidate = base.clone();
        let mut n = 2u32;
        while taken.contains(&candidate) || taken.contains(&access_type_name(&candidate)) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        if candidate != base {
            generated.rename(candidate.clone());
        }
        taken.insert(access_type_name(&candidate));
        taken.insert(candidate);

        tracing::info!(
            module = %entry.module.key,
            type_name = %generated.object.type_name,
            properties = generated.object.properties.len(),
            excluded = generated.excluded.len(),
            "module generated"
        );
        report.generated.push(generated);
    }
    report
}

/// Fetch the module list and each module's field catalog. A module whose schema the remote
/// refuses is kept with no sections (and later skipped); transport failures abort.
pub async fn discover(client: &CrmClient) -> Result<Vec<Discovered>, CrmError> {
    let modules = client.get_modules().await?;
    let mut out = Vec::with_capacity(modules.len());
    for module in modules {
        let sections = match client.get_fields(&module.key).await {
            Ok(sections) => sections,
            Err(CrmError::Remote { code, message }) => {
                tracing::warn!(module = %module.key, code = %code, message = %message, "schema not available");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        out.push(Discovered { module, sections });
    }
    Ok(out)
}

/// Full pipeline: discover, generate, render and write into `out_dir`.
pub async fn run<R>(client: &CrmClient, renderer: &R, out_dir: &Path) -> Result<GenerationReport, CrmError>
where
    R: Renderer + ?Sized,
{
    let discovered = discover(client).await?;
    let report = generate_all(&discovered);
    let mut files = Vec::new();
    for module in &report.generated {
        files.extend(renderer.render(module)?);
    }
    files.extend(renderer.render_index(&report.generated));
    let written = write_files(out_dir, &files).await?;
    tracing::info!(
        language = renderer.language(),
        generated = report.generated.len(),
        skipped = report.skipped.len(),
        files = written,
        "generation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDescriptor, TypeTag, ValueType};

    fn module(key: &str, singular: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            key: key.into(),
            singular_label: singular.into(),
            plural_label: key.into(),
        }
    }

    fn sections() -> Vec<FieldSection> {
        let mut id = FieldDescriptor::new("id", "Id", TypeTag::Text);
        id.is_system = true;
        let mut account = FieldDescriptor::new("accountNameID", "Account_Name", TypeTag::Lookup);
        account.label = "Account Name".into();
        vec![FieldSection {
            name: "Contact Information".into(),
            fields: vec![
                id,
                FieldDescriptor::new("lastName", "Last_Name", TypeTag::Text),
                account,
                FieldDescriptor::new("photo", "Photo", TypeTag::FileUpload),
                FieldDescriptor::new("type", "Type", TypeTag::Picklist),
                FieldDescriptor::new("tags", "Tags", TypeTag::MultiPicklist),
            ],
        }]
    }

    #[test]
    fn generation_maps_types_and_skips_system_and_unsupported_fields() {
        let generated = generate_module(&module("Contacts", "Contact"), &sections()).unwrap();
        let props: Vec<(&str, &str, ValueType)> = generated
            .object
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.member.as_str(), p.value_type))
            .collect();
        assert_eq!(
            props,
            vec![
                ("lastName", "last_name", ValueType::Text),
                ("accountNameID", "account_name_id", ValueType::Text),
                ("type", "type", ValueType::Text),
                ("tags", "tags", ValueType::TextList),
            ]
        );
        assert_eq!(generated.excluded, vec!["Photo".to_string()]);
        assert_eq!(generated.access.type_name, "ContactAccess");
        let catalog = FieldCatalog::from_snapshot(&generated.access.catalog).unwrap();
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn empty_schema_skips_the_module_but_not_the_batch() {
        let report = generate_all(&[
            Discovered {
                module: module("Invoices", "Invoice"),
                sections: Vec::new(),
            },
            Discovered {
                module: module("Contacts", "Contact"),
                sections: sections(),
            },
        ]);
        assert_eq!(report.generated.len(), 1);
        assert!(matches!(
            &report.skipped[..],
            [ConfigError::GenerationSkipped { module, .. }] if module == "Invoices"
        ));
    }

    #[test]
    fn colliding_type_names_get_suffixes() {
        let report = generate_all(&[
            Discovered {
                module: module("Contacts", "Contact"),
                sections: sections(),
            },
            Discovered {
                module: module("CustomContacts", "contact"),
                sections: sections(),
            },
        ]);
        let names: Vec<_> = report.generated.iter().map(|g| g.object.type_name.as_str()).collect();
        assert_eq!(names, vec!["Contact", "Contact_2"]);
        assert_eq!(report.generated[1].access.type_name, "Contact_2Access");
        assert_eq!(report.generated[1].access.object_type, "Contact_2");
    }
}
