use std::io::Write;
use std::path::{Path, PathBuf};

use crate::LedgerError;

/// Sibling path the document is staged at before it replaces the original.
pub(crate) fn stage_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let stage = stage_path(path);
    let result = (|| {
        let mut file = std::fs::File::create(&stage).map_err(|_| LedgerError::Io)?;
        file.write_all(bytes).map_err(|_| LedgerError::Io)?;
        file.sync_all().map_err(|_| LedgerError::Io)?;
        drop(file);
        std::fs::rename(&stage, path).map_err(|_| LedgerError::Io)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&stage);
    }
    result
}
