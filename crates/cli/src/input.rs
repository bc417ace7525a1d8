#![forbid(unsafe_code)]

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tl_core::model::{GraphDataset, LayoutConfig};

/// A dataset file: the graph itself plus optional layout overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InputDocument {
    #[serde(flatten)]
    pub(crate) dataset: GraphDataset,
    #[serde(default)]
    pub(crate) layout_config: Option<LayoutConfig>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    pub(crate) fn detect(path: &Path, text: &str) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => InputFormat::Json,
            Some("yaml" | "yml") => InputFormat::Yaml,
            _ if text.trim_start().starts_with('{') => InputFormat::Json,
            _ => InputFormat::Yaml,
        }
    }
}

#[derive(Debug)]
pub(crate) enum InputError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
}

impl InputError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "INPUT_IO",
            Self::Json(_) => "INPUT_JSON",
            Self::Yaml(_) => "INPUT_YAML",
        }
    }
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Json(err) => write!(f, "invalid JSON dataset: {err}"),
            Self::Yaml(err) => write!(f, "invalid YAML dataset: {err}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Yaml(err) => Some(err),
        }
    }
}

pub(crate) fn parse(text: &str, format: InputFormat) -> Result<InputDocument, InputError> {
    match format {
        InputFormat::Json => serde_json::from_str(text).map_err(InputError::Json),
        InputFormat::Yaml => serde_yaml::from_str(text).map_err(InputError::Yaml),
    }
}

pub(crate) fn load(path: &Path) -> Result<InputDocument, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, InputFormat::detect(path, &text))
}
