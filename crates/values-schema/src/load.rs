use std::fs;
use std::path::Path;

use miette::NamedSource;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transform::kind;

/// Root key holding the truth tree.
pub const PROPERTIES_KEY: &str = "$properties";

/// Read and parse a truth document.
///
/// # Errors
///
/// [`Error::InputRead`] if the file cannot be read and [`Error::InputParse`]
/// if it is not valid YAML.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| Error::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path.display().to_string();
    parse_document(&content, &file_name)
}

/// Parse YAML text into a JSON value.
///
/// `<<` merge keys are resolved before conversion.
///
/// # Errors
///
/// Returns [`Error::InputParse`] with the parser's location when `content` is
/// not valid YAML.
pub fn parse_document(content: &str, file_name: &str) -> Result<Value> {
    // serde_yaml reads a BOM after the first line as a document separator.
    let clean: alloc::borrow::Cow<'_, str> = if content.contains('\u{FEFF}') {
        content.replace('\u{FEFF}', "").into()
    } else {
        content.into()
    };
    let parse_err = |offset: usize, message: String| Error::InputParse {
        src: NamedSource::new(file_name, content.to_string()),
        span: original_offset(content, offset).into(),
        message,
    };
    let yaml_err =
        |e: serde_yaml::Error| parse_err(e.location().map_or(0, |loc| loc.index()), e.to_string());

    let mut yaml: serde_yaml::Value = serde_yaml::from_str(&clean).map_err(yaml_err)?;
    yaml.apply_merge().map_err(yaml_err)?;
    serde_json::to_value(yaml).map_err(|e| parse_err(0, e.to_string()))
}

/// Map a byte offset in `content` with BOMs removed back onto `content`.
fn original_offset(content: &str, clean_offset: usize) -> usize {
    let mut clean = 0;
    for (i, ch) in content.char_indices() {
        if ch == '\u{FEFF}' {
            continue;
        }
        if clean >= clean_offset {
            return i;
        }
        clean += ch.len_utf8();
    }
    content.len()
}

/// Borrow the `$properties` mapping at the root of a truth document.
///
/// # Errors
///
/// Returns [`Error::InputShape`] when the root is not a mapping or has no
/// mapping under `$properties`.
pub fn root_properties(document: &Value) -> Result<&Map<String, Value>> {
    let Some(root) = document.as_object() else {
        return Err(Error::shape(
            "",
            format!("document root must be a mapping, found {}", kind(document)),
        ));
    };
    match root.get(PROPERTIES_KEY) {
        Some(Value::Object(properties)) => Ok(properties),
        Some(other) => Err(Error::shape(
            "",
            format!("`{PROPERTIES_KEY}` must be a mapping, found {}", kind(other)),
        )),
        None => Err(Error::shape(
            "",
            format!("document root has no `{PROPERTIES_KEY}` key"),
        )),
    }
}
