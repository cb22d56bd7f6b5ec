use std::fs;
use std::io::Write as _;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};

/// Serialize a schema document, with a trailing newline.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if the value cannot be serialized.
pub fn render(schema: &Value, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(schema)
    } else {
        serde_json::to_string(schema)
    }
    .map_err(Error::Serialize)?;
    Ok(format!("{json}\n"))
}

/// Write `contents` to `path` atomically.
///
/// The data goes to a temporary file next to `path` which is renamed over it
/// once fully written, so a failed run never leaves a partial file behind.
/// An existing file keeps its permissions; a new one gets the same mode a
/// plain create would.
///
/// # Errors
///
/// Returns [`Error::OutputWrite`] if the temporary file cannot be created or
/// written, or the rename fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source: std::io::Error| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());
    let mut tmp = new_temp_file(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    info!(path = %path.display(), bytes = contents.len(), "wrote schema");
    Ok(())
}

#[cfg(unix)]
fn new_temp_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt as _;
    // 0666 before the umask, as for any newly created file.
    tempfile::Builder::new()
        .prefix(".values-schema")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".values-schema")
        .tempfile_in(dir)
}

/// Whether the schema stored at `path` matches `schema`.
///
/// Compares parsed JSON values, so formatting differences do not count. A
/// missing or unparsable file is stale.
///
/// # Errors
///
/// Returns [`Error::OutputWrite`] for I/O failures other than a missing file.
pub fn is_up_to_date(path: &Path, schema: &Value) -> Result<bool> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(Error::OutputWrite {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(serde_json::from_str::<Value>(&content).is_ok_and(|existing| existing == *schema))
}
