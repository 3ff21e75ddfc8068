//! Tracing model files
//!
//! Saving writes the model exactly as it was loaded, so a saved file loads
//! back into an equal model.

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{ExportError, ModelError};
use crate::trace_model::TraceModel;

/// File name used when saving without an explicit path
pub const DEFAULT_MODEL_FILE_NAME: &str = "tracing_model.json";

/// Where `--save` writes: the given file, a directory joined with the
/// default name, or the default name in the working directory.
#[must_use]
pub fn save_path(requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(path) if path.is_dir() => path.join(DEFAULT_MODEL_FILE_NAME),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_MODEL_FILE_NAME),
    }
}

/// Write `model` verbatim to `path`.
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn save_model(model: &TraceModel, path: &Path) -> Result<(), ExportError> {
    let text = model.to_json_string()?;
    fs::write(path, text).map_err(|e| ExportError::WriteFailed(format!("{}: {e}", path.display())))?;
    info!("Saved tracing model to {}", path.display());
    Ok(())
}

/// Load a model file.
///
/// # Errors
/// See [`TraceModel::from_file`].
pub fn load_model(path: &Path) -> Result<TraceModel, ModelError> {
    TraceModel::from_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_path_defaults() {
        assert_eq!(save_path(None), PathBuf::from("tracing_model.json"));
        assert_eq!(save_path(Some(Path::new("out/model.json"))), PathBuf::from("out/model.json"));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(save_path(Some(dir.path())), dir.path().join(DEFAULT_MODEL_FILE_NAME));
    }

    #[test]
    fn test_save_then_load() {
        let model = TraceModel::from_json_str(r#"{"duration": 5, "chrome": {"buffers": [[[500, 1]]]}}"#).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MODEL_FILE_NAME);

        save_model(&model, &path).unwrap();
        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let model = TraceModel::from_json_str("{}").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = save_model(&model, &dir.path().join("missing/model.json")).unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed(_)));
    }
}
