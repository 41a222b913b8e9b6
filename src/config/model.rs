// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// One build file document, in any of the accepted shapes.
///
/// YAML:
///
/// ```yaml
/// stages: [setup, build]
/// strings:
///   out: build
/// jobs:
///   - job: mkdir
///     args: "{out}"
///     stage: setup
///   - cmd: cc -o {out}/app main.c
///     stage: build
/// ```
///
/// A bare list of jobs, or (in a YAML stream) a single job per document, is
/// also accepted. The loader picks the variant from the document's shape.
#[derive(Debug, Clone)]
pub enum RawBuildFile {
    Jobs(Vec<RawJobSpec>),
    Document(RawDocument),
    Job(Box<RawJobSpec>),
}

/// Mapping form of a build file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDocument {
    /// Explicit stage order.
    #[serde(default)]
    pub stages: Vec<String>,

    /// Values for `{key}` substitution.
    #[serde(default)]
    pub strings: BTreeMap<String, Scalar>,

    #[serde(default)]
    pub jobs: Vec<RawJobSpec>,
}

/// A job descriptor as written in a build file.
///
/// Exactly one of `job`, `cmd` or `tasks` must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawJobSpec {
    /// Name of a registered function.
    pub job: Option<String>,
    pub args: Option<ArgList>,
    /// Program and leading arguments.
    pub cmd: Option<ArgList>,
    /// Working directory, as a path or a list of path segments.
    pub dir: Option<OneOrMany<String>>,
    /// Jobs to run in order as one unit.
    pub tasks: Option<Vec<RawTaskSpec>>,

    pub stage: Option<String>,
    pub target: Option<String>,
    #[serde(alias = "dep", alias = "deps")]
    pub dependency: Option<OneOrMany<String>>,

    #[serde(default)]
    pub display_output: bool,
    #[serde(default)]
    pub ignore_failure: bool,
}

/// One member of a `tasks` sequence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTaskSpec {
    pub job: Option<String>,
    pub args: Option<ArgList>,
    pub cmd: Option<ArgList>,
    pub dir: Option<OneOrMany<String>>,
    #[serde(default)]
    pub display_output: bool,
    #[serde(default)]
    pub ignore_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// `args`/`cmd` value: a whitespace-separated line or a list of scalars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgList {
    Line(String),
    List(Vec<Scalar>),
}

impl ArgList {
    pub fn into_args(self) -> Vec<String> {
        match self {
            ArgList::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            ArgList::List(items) => items.into_iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Scalar value accepted where a string is expected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// All build files of one invocation, merged in command-line order.
#[derive(Debug, Clone, Default)]
pub struct MergedBuildFile {
    pub stages: Vec<String>,
    pub strings: BTreeMap<String, String>,
    pub jobs: Vec<RawJobSpec>,
}

impl MergedBuildFile {
    /// Append one document. Later `strings` win; stage names already
    /// declared keep their first position.
    pub fn merge(&mut self, file: RawBuildFile) {
        match file {
            RawBuildFile::Jobs(jobs) => self.jobs.extend(jobs),
            RawBuildFile::Job(job) => self.jobs.push(*job),
            RawBuildFile::Document(doc) => {
                for stage in doc.stages {
                    if !self.stages.contains(&stage) {
                        self.stages.push(stage);
                    }
                }
                self.strings
                    .extend(doc.strings.into_iter().map(|(k, v)| (k, v.to_string())));
                self.jobs.extend(doc.jobs);
            }
        }
    }
}
