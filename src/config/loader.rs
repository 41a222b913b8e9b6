// src/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::model::{MergedBuildFile, RawBuildFile};
use crate::config::validate::into_build_spec;
use crate::errors::{BuildError, Result};
use crate::job::BuildSpec;

/// File names looked up, in order, when no build file is given.
pub const DEFAULT_FILE_NAMES: &[&str] = &[
    "buildc.yaml",
    "buildc.yml",
    "buildc.json",
    "buildc.jsn",
    "buildc.toml",
];

/// Keys that only appear in the mapping form of a build file.
const DOCUMENT_KEYS: &[&str] = &["jobs", "stages", "strings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
    Toml,
}

impl SpecFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(SpecFormat::Yaml),
            Some("json" | "jsn") => Ok(SpecFormat::Json),
            Some("toml") => Ok(SpecFormat::Toml),
            _ => Err(BuildError::ConfigError(format!(
                "cannot tell the format of {}: expected a .yaml, .yml, .json, .jsn or .toml file",
                path.display()
            ))),
        }
    }
}

/// Parse the documents of one build file.
///
/// This only performs deserialization; it does **not** perform semantic
/// validation. Use [`load_spec`] for that.
pub fn parse_str(contents: &str, format: SpecFormat) -> Result<Vec<RawBuildFile>> {
    let values: Vec<Value> = match format {
        SpecFormat::Yaml => {
            let mut docs = Vec::new();
            for doc in serde_yaml::Deserializer::from_str(contents) {
                docs.push(Value::deserialize(doc)?);
            }
            docs
        }
        SpecFormat::Json => vec![serde_json::from_str(contents)?],
        SpecFormat::Toml => vec![toml::from_str(contents)?],
    };

    values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(classify)
        .collect()
}

/// Pick the document shape, so a malformed document reports errors against
/// the shape it was meant to have.
fn classify(value: Value) -> Result<RawBuildFile> {
    let is_document = value
        .as_object()
        .is_some_and(|map| map.is_empty() || map.keys().any(|k| DOCUMENT_KEYS.contains(&k.as_str())));

    if value.is_array() {
        Ok(RawBuildFile::Jobs(shaped(value)?))
    } else if is_document {
        Ok(RawBuildFile::Document(shaped(value)?))
    } else if value.is_object() {
        Ok(RawBuildFile::Job(Box::new(shaped(value)?)))
    } else {
        Err(BuildError::ConfigError(format!(
            "a build file document must be a mapping or a list of jobs, got {value}"
        )))
    }
}

fn shaped<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value).map_err(|e| BuildError::ConfigError(format!("invalid build file: {e}")))
}

/// Read and parse one build file from disk.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<RawBuildFile>> {
    let path = path.as_ref();
    let format = SpecFormat::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|e| {
        BuildError::ConfigError(format!("cannot read build file {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), ?format, "parsing build file");
    parse_str(&contents, format)
}

/// Load every build file, merge them in order and validate the result.
///
/// `defines` override the files' `strings` for `{key}` substitution.
pub fn load_spec(paths: &[PathBuf], defines: &BTreeMap<String, String>) -> Result<BuildSpec> {
    let mut merged = MergedBuildFile::default();
    for path in paths {
        for doc in load_from_path(path)? {
            merged.merge(doc);
        }
    }
    info!(files = paths.len(), jobs = merged.jobs.len(), "loaded build files");
    into_build_spec(merged, defines)
}

/// Parse and validate an in-memory build file.
pub fn load_spec_str(
    contents: &str,
    format: SpecFormat,
    defines: &BTreeMap<String, String>,
) -> Result<BuildSpec> {
    let mut merged = MergedBuildFile::default();
    for doc in parse_str(contents, format)? {
        merged.merge(doc);
    }
    into_build_spec(merged, defines)
}

/// First default build file that exists in `dir`.
pub fn default_spec_path(dir: &Path) -> Result<PathBuf> {
    DEFAULT_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            BuildError::ConfigError(format!(
                "no build file given and none of {} found in {}",
                DEFAULT_FILE_NAMES.join(", "),
                dir.display()
            ))
        })
}
