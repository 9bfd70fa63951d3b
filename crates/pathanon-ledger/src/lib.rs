mod atomic;
pub mod csv_sheet;
mod error;
pub mod reader;
pub mod sheet;
pub mod writer;
pub mod xlsx_sheet;

use std::path::Path;

pub use csv_sheet::CsvSheet;
pub use error::LedgerError;
pub use sheet::{CellMark, MemorySheet, Sheet};
pub use writer::{Ledger, RowRange};
pub use xlsx_sheet::XlsxSheet;

/// Opens a ledger document, choosing the backend from the file extension.
pub fn open_document(path: &Path) -> Result<Box<dyn Sheet>, LedgerError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" => Ok(Box::new(XlsxSheet::open(path)?)),
        "csv" => Ok(Box::new(CsvSheet::open(path)?)),
        _ => Err(LedgerError::UnsupportedFormat),
    }
}
