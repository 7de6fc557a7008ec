// JSON export

use serde::Serialize;

use crate::error::IoError;

/// Pretty-printed JSON for anything serializable (tables, full reports).
pub fn write_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, IoError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| IoError::Write(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}
