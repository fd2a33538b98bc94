use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::SuiteFile;

/// Loads a suite file, choosing the parser by extension
/// (`.yaml`/`.yml`, `.json`, `.toml`).
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or the
/// extension is not supported.
pub async fn load_suite_file(path: &Path) -> AppResult<SuiteFile> {
    let content = tokio::fs::read_to_string(path).await.map_err(|err| {
        AppError::config(ConfigError::ReadSuite {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    parse_suite(path, &content)
}

pub(crate) fn parse_suite(path: &Path, content: &str) -> AppResult<SuiteFile> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(content).map_err(|err| {
            AppError::config(ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("toml") => toml::from_str(content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
