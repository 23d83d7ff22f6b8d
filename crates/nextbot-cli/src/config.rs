//! Loading mesh descriptions and navigation settings from disk.

use std::path::Path;

use anyhow::{Context, Result};
use nextbot_nav::{NavMesh, NavSettings};
use serde::de::DeserializeOwned;

/// On-disk formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = match Format::from_path(path) {
        Format::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {}", path.display()))?,
        Format::Json => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?,
    };
    Ok(value)
}

/// Load and validate a mesh description.
pub fn load_mesh(path: &Path) -> Result<NavMesh> {
    let mesh: NavMesh = load(path)?;
    tracing::info!(
        path = %path.display(),
        areas = mesh.area_count(),
        ladders = mesh.ladders().len(),
        "Loaded navigation mesh"
    );
    Ok(mesh)
}

/// Load settings, or defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<NavSettings> {
    match path {
        Some(path) => {
            let settings = load(path)?;
            tracing::debug!(path = %path.display(), "Loaded navigation settings");
            Ok(settings)
        }
        None => Ok(NavSettings::default()),
    }
}
