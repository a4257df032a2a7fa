// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::IoError;

/// Pretty JSON, for stdout.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, IoError> {
    serde_json::to_string_pretty(value).map_err(|e| IoError::Json(e.to_string()))
}

/// Write `value` as pretty JSON to `path`.
pub fn export<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::Json(format!("{}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| IoError::Json(e.to_string()))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| IoError::Json(format!("{}: {e}", path.display())))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
