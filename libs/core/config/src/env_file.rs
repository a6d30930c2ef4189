//! Dotenv file loading.
//!
//! Values already present in the process environment are never overwritten,
//! so an exported `SENDGRID_API_KEY` beats the one in `.env`.

use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Load variables from a dotenv file at `path`.
///
/// Returns the path that was loaded.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    Ok(path.to_path_buf())
}
