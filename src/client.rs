//! Shared client: transport, settings and the response interpreter. Cheap to clone.

use crate::config::{ClientSettings, FieldCatalog, FieldSection, ModuleDescriptor};
use crate::error::CrmError;
use crate::response::{interpret, Response};
use crate::transport::Transport;
use crate::wire::{self, Record, Request, UserKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrmClient {
    transport: Arc<dyn Transport>,
    settings: Arc<ClientSettings>,
}

impl CrmClient {
    pub fn new(transport: Arc<dyn Transport>, settings: ClientSettings) -> Self {
        CrmClient {
            transport,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// One remote call: transport errors propagate unchanged, the reply goes through the interpreter.
    pub async fn execute(&self, request: &Request) -> Result<Response, CrmError> {
        tracing::debug!(
            module = %request.module,
            operation = %request.operation,
            params = request.params.len(),
            "remote call"
        );
        let bytes = self.transport.call(request).await?;
        interpret(&bytes, &request.module, request.operation)
    }

    /// Field catalog sections of `module`; empty when the module is not accessible.
    pub async fn get_fields(&self, module: &str) -> Result<Vec<FieldSection>, CrmError> {
        let request = wire::get_fields(module);
        match self.execute(&request).await? {
            Response::FieldCatalog(sections) => Ok(sections),
            Response::NoContent { .. } => Ok(Vec::new()),
            _ => Err(unexpected(&request)),
        }
    }

    pub async fn get_field_catalog(&self, module: &str) -> Result<FieldCatalog, CrmError> {
        let sections = self.get_fields(module).await?;
        Ok(FieldCatalog::from_sections(module, &sections)?)
    }

    pub async fn get_modules(&self) -> Result<Vec<ModuleDescriptor>, CrmError> {
        let request = wire::get_modules();
        match self.execute(&request).await? {
            Response::Modules(modules) => Ok(modules),
            Response::NoContent { .. } => Ok(Vec::new()),
            _ => Err(unexpected(&request)),
        }
    }

    pub async fn get_users(&self, kind: UserKind) -> Result<BTreeMap<String, BTreeMap<String, String>>, CrmError> {
        let request = wire::get_users(kind);
        match self.execute(&request).await? {
            Response::Users(users) => Ok(users),
            Response::NoContent { .. } => Ok(BTreeMap::new()),
            _ => Err(unexpected(&request)),
        }
    }

    /// Convert a lead; returns the ids of the created records keyed by module ("Contact", "Account", ...).
    pub async fn convert_lead(&self, lead_id: &str, options: Value) -> Result<BTreeMap<String, String>, CrmError> {
        let request = wire::convert_lead(lead_id, options);
        match self.execute(&request).await? {
            Response::Success(ids) => Ok(ids),
            _ => Err(unexpected(&request)),
        }
    }

    /// Returns the remote status code.
    pub async fn update_related_records(
        &self,
        module: &str,
        id: &str,
        related_module: &str,
        records: &[Record],
    ) -> Result<String, CrmError> {
        let request = wire::update_related_records(module, id, related_module, records);
        match self.execute(&request).await? {
            Response::Status { code, .. } => Ok(code),
            _ => Err(unexpected(&request)),
        }
    }
}

fn unexpected(request: &Request) -> CrmError {
    CrmError::UnknownResponseShape {
        module: request.module.clone(),
        operation: request.operation.as_str().to_string(),
    }
}

