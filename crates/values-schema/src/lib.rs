#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

extern crate alloc;

pub mod config;
mod error;
pub mod load;
pub mod node;
mod required;
mod transform;
pub mod write;

use std::path::PathBuf;

use serde_json::Value;

pub use error::{Error, Result};
pub use node::{Attribute, LeafNode, ObjectNode, SchemaNode};
pub use required::{post_transform, post_transform_recursive};
pub use transform::transform_node;

/// Settings for one generation run, after merging CLI flags and config.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Derive `required` for nested objects too.
    pub recursive_required: bool,
    pub pretty: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input: PathBuf::from(config::DEFAULT_INPUT),
            output: PathBuf::from(config::DEFAULT_OUTPUT),
            recursive_required: false,
            pretty: false,
        }
    }
}

/// What [`run`] should do with the generated schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    Print,
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written(PathBuf),
    Printed(String),
    UpToDate,
    Stale,
}

/// Turn a parsed truth document into a schema document.
///
/// # Errors
///
/// Returns [`Error::InputShape`] for malformed documents and
/// [`Error::MissingType`] / [`Error::MissingProperties`] when `$properties`
/// does not describe an object.
pub fn build_schema(document: &Value, recursive_required: bool) -> Result<Value> {
    let properties = load::root_properties(document)?;
    let node = transform_node(properties)?;
    let node = if recursive_required {
        post_transform_recursive(node)?
    } else {
        post_transform(node)?
    };
    Ok(node.to_value())
}

/// Read the input document and build its schema, without writing anything.
///
/// # Errors
///
/// Any input error of [`Error`], plus those of [`build_schema`].
#[tracing::instrument(skip_all, fields(input = %options.input.display()))]
pub fn generate(options: &Options) -> Result<Value> {
    let document = load::read_document(&options.input)?;
    let schema = build_schema(&document, options.recursive_required)?;
    let fields = schema["properties"].as_object().map_or(0, serde_json::Map::len);
    tracing::debug!(fields, recursive = options.recursive_required, "built schema");
    Ok(schema)
}

/// Generate the schema and write, print, or check it.
///
/// # Errors
///
/// Any error of [`generate`], plus [`Error::Serialize`] and
/// [`Error::OutputWrite`]. Nothing is written when generation fails.
#[tracing::instrument(skip_all, name = "values_schema", fields(mode = ?mode))]
pub fn run(options: &Options, mode: Mode) -> Result<Outcome> {
    let schema = generate(options)?;
    match mode {
        Mode::Write => {
            let text = write::render(&schema, options.pretty)?;
            write::write_atomic(&options.output, &text)?;
            Ok(Outcome::Written(options.output.clone()))
        }
        Mode::Print => Ok(Outcome::Printed(write::render(&schema, options.pretty)?)),
        Mode::Check => {
            if write::is_up_to_date(&options.output, &schema)? {
                Ok(Outcome::UpToDate)
            } else {
                Ok(Outcome::Stale)
            }
        }
    }
}
