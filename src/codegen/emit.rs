use crate::codegen::render::GeneratedFile;
use crate::error::{ConfigError, CrmError};
use std::path::{Component, Path};

/// Write `files` under `dir`, creating directories as needed. Paths must stay inside `dir`.
/// Returns the number of files written.
pub async fn write_files(dir: &Path, files: &[GeneratedFile]) -> Result<usize, CrmError> {
    for file in files {
        let relative = Path::new(&file.path);
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if file.path.is_empty() || !inside {
            return Err(ConfigError::Validation(format!("output path escapes target directory: {}", file.path)).into());
        }
    }
    tokio::fs::create_dir_all(dir).await?;
    for file in files {
        let target = dir.join(&file.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, file.content.as_bytes()).await?;
        tracing::debug!(path = %target.display(), bytes = file.content.len(), "generated file written");
    }
    Ok(files.len())
}
