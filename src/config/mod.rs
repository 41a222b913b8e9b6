// src/config/mod.rs

//! Build file loading and validation for buildc.
//!
//! Responsibilities:
//! - Define the serde data model shared by YAML, JSON and TOML (`model.rs`).
//! - Load and merge build files from disk (`loader.rs`).
//! - Expand `{key}` placeholders (`strings.rs`).
//! - Validate descriptors and assemble a `BuildSpec` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod strings;
pub mod validate;

pub use loader::{SpecFormat, default_spec_path, load_spec, load_spec_str};
pub use model::{MergedBuildFile, RawBuildFile, RawJobSpec};
pub use strings::Substitution;
pub use validate::into_build_spec;
