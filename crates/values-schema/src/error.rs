use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Everything that can abort a schema generation run.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read {}", .path.display())]
    #[diagnostic(code(values_schema::input_read))]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    #[diagnostic(
        code(values_schema::input_parse),
        help("the truth document must be valid YAML")
    )]
    InputParse {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
    },

    /// The document parsed but is not shaped like a truth document.
    ///
    /// `path` is a JSON pointer into the transformed tree (empty for the root).
    #[error("unexpected document shape at {}: {message}", location(.path))]
    #[diagnostic(
        code(values_schema::input_shape),
        help("fields and `_items` must hold mappings; use `{{}}` for an empty node")
    )]
    InputShape { path: String, message: String },

    #[error("cannot derive `required`: node is not an object (type: {})", .found.as_deref().unwrap_or("<none>"))]
    #[diagnostic(
        code(values_schema::missing_type),
        help("the root of `$properties` needs at least one field")
    )]
    MissingType { found: Option<String> },

    #[error("cannot derive `required`: object node has no properties")]
    #[diagnostic(
        code(values_schema::missing_properties),
        help("declare fields instead of a literal `_type: object`")
    )]
    MissingProperties,

    #[error("failed to serialize schema")]
    #[diagnostic(code(values_schema::serialize))]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write {}", .path.display())]
    #[diagnostic(code(values_schema::output_write))]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(values_schema::config))]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn shape(path: &str, message: impl Into<String>) -> Self {
        Self::InputShape {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

fn location(path: &str) -> &str {
    if path.is_empty() { "the document root" } else { path }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
