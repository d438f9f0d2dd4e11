//! crm-codegen: generate typed data objects from saved schema discovery payloads.
//!
//! Run from repo root: `cargo run -p crm-codegen`
//! Reads `CRM_SCHEMA_DIR` (`modules.json` plus `fields/<Module>.json`, default `schema`) and
//! writes into `CRM_OUTPUT_DIR` (default `generated`).

use async_trait::async_trait;
use crm_bridge::codegen::{self, RustRenderer};
use crm_bridge::wire::{Operation, Request};
use crm_bridge::{ClientSettings, CrmClient, Transport, TransportError};
use std::path::PathBuf;
use std::sync::Arc;

/// Serves schema discovery calls from files saved from the remote service.
struct SnapshotTransport {
    root: PathBuf,
}

#[async_trait]
impl Transport for SnapshotTransport {
    async fn call(&self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let path = match request.operation {
            Operation::GetModules => self.root.join("modules.json"),
            Operation::GetFields => self.root.join("fields").join(format!("{}.json", request.module)),
            other => {
                return Err(TransportError::Connection(format!(
                    "{} is not available from a schema snapshot",
                    other
                )))
            }
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "no saved payload, treating module as inaccessible");
                Ok(br#"{"response":{"nodata":{"code":"4422","message":"no saved payload"}}}"#.to_vec())
            }
            Err(e) => Err(TransportError::Connection(format!("{}: {}", path.display(), e))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crm_bridge=info,crm_codegen=info")),
        )
        .init();

    let schema_dir = std::env::var("CRM_SCHEMA_DIR").unwrap_or_else(|_| "schema".into());
    let output_dir = std::env::var("CRM_OUTPUT_DIR").unwrap_or_else(|_| "generated".into());
    let renderer = match std::env::var("CRM_CRATE_PATH") {
        Ok(crate_path) => RustRenderer { crate_path },
        Err(_) => RustRenderer::default(),
    };

    let settings = ClientSettings::from_env()?;
    let transport = Arc::new(SnapshotTransport {
        root: PathBuf::from(&schema_dir),
    });
    let client = CrmClient::new(transport, settings);

    let report = codegen::run(&client, &renderer, PathBuf::from(&output_dir).as_path()).await?;
    for skipped in &report.skipped {
        tracing::warn!("{}", skipped);
    }
    tracing::info!(
        "generated {} modules into {} ({} skipped)",
        report.generated.len(),
        output_dir,
        report.skipped.len()
    );
    Ok(())
}
