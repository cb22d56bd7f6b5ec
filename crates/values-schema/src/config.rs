use std::fs;
use std::path::{Path, PathBuf};

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = "values-schema.toml";
pub const DEFAULT_INPUT: &str = "values.truth.yaml";
pub const DEFAULT_OUTPUT: &str = "values.schema.json";

/// Configuration file for the values schema generator.
///
/// Every setting can also be given on the command line, which takes
/// priority. Relative paths are resolved against the directory containing
/// `values-schema.toml`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "values-schema.toml")]
pub struct Config {
    /// Truth document to read. Defaults to `values.truth.yaml`.
    #[schemars(title = "Input")]
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Schema document to write. Defaults to `values.schema.json`.
    #[schemars(title = "Output")]
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Derive `required` for every nested object, not only the top level.
    ///
    /// By default only the top-level object gets a `required` list and
    /// `$optional` markers below it are written out unchanged.
    #[schemars(title = "Recursive Required")]
    #[serde(default, rename = "recursive-required")]
    pub recursive_required: Option<bool>,

    /// Indent the written schema.
    #[schemars(title = "Pretty")]
    #[serde(default)]
    pub pretty: Option<bool>,
}

impl Config {
    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.input, &mut self.output].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Generate the JSON Schema for `values-schema.toml`.
///
/// # Panics
///
/// Panics if the generated schema cannot be serialized, which cannot happen.
pub fn schema() -> Value {
    serde_json::to_value(schema_for!(Config)).expect("schema serialization cannot fail")
}

/// Parse configuration text.
///
/// # Errors
///
/// Returns [`Error::Config`] on invalid TOML or unknown keys.
pub fn parse(content: &str, path: &Path) -> Result<Config> {
    toml::from_str(content).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

/// Load configuration.
///
/// With an explicit `path` the file must exist. Without one, `values-schema.toml`
/// in `dir` is used if present, otherwise the defaults apply.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>, dir: &Path) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = dir.join(CONFIG_FILENAME);
            if !candidate.is_file() {
                return Ok(Config::default());
            }
            candidate
        }
    };
    let content = fs::read_to_string(&path).map_err(|e| Error::Config {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let mut config = parse(&content, &path)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
