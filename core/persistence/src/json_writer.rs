//! FILENAME: core/persistence/src/json_writer.rs

use crate::PersistenceError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(
    mut writer: W,
    value: &T,
) -> Result<(), PersistenceError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), PersistenceError> {
    let file = File::create(path).map_err(|source| PersistenceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_json(BufWriter::new(file), value)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
