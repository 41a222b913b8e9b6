// src/config/strings.rs

//! `{key}` substitution in build file strings.

use std::collections::BTreeMap;

use regex::Regex;

use crate::errors::{BuildError, Result};

/// Replaces `{key}` placeholders with configured values.
///
/// Only identifier-like keys are placeholders; any other braces are left
/// alone.
#[derive(Debug, Clone)]
pub struct Substitution {
    values: BTreeMap<String, String>,
    placeholder: Regex,
}

impl Substitution {
    pub fn new(values: BTreeMap<String, String>) -> Result<Self> {
        let placeholder = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.-]*)\}")
            .map_err(|e| BuildError::Other(e.into()))?;
        Ok(Self {
            values,
            placeholder,
        })
    }

    pub fn apply(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for caps in self.placeholder.captures_iter(input) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = self.values.get(key.as_str()).ok_or_else(|| {
                BuildError::ConfigError(format!(
                    "unknown substitution key '{}' in \"{input}\"",
                    key.as_str()
                ))
            })?;
            out.push_str(&input[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }

        out.push_str(&input[last..]);
        Ok(out)
    }

    pub fn apply_all(&self, inputs: Vec<String>) -> Result<Vec<String>> {
        inputs.iter().map(|s| self.apply(s)).collect()
    }
}
