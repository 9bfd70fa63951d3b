use std::path::{Path, PathBuf};

use pathanon_domain::CellRef;

use crate::atomic::write_bytes_atomic;
use crate::sheet::{CellMark, MemorySheet, Sheet};
use crate::LedgerError;

/// Plain-text ledger. CSV carries no formatting, so marks are only tracked in
/// memory and are lost on save.
#[derive(Debug)]
pub struct CsvSheet {
    path: PathBuf,
    grid: MemorySheet,
}

impl CsvSheet {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let bytes = std::fs::read(path).map_err(|_| LedgerError::Io)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|_| LedgerError::Parse)?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Ok(Self {
            path: path.to_path_buf(),
            grid: MemorySheet::from_rows(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &MemorySheet {
        &self.grid
    }
}

impl Sheet for CsvSheet {
    fn max_row(&self) -> u32 {
        self.grid.max_row()
    }

    fn max_column(&self) -> u32 {
        self.grid.max_column()
    }

    fn value(&self, cell: CellRef) -> String {
        self.grid.value(cell)
    }

    fn set_value(&mut self, cell: CellRef, value: &str) {
        self.grid.set_value(cell, value);
    }

    fn copy_cell(&mut self, from: CellRef, to: CellRef) {
        self.grid.copy_cell(from, to);
    }

    fn insert_rows(&mut self, before_row: u32, count: u32) {
        self.grid.insert_rows(before_row, count);
    }

    fn set_mark(&mut self, cell: CellRef, mark: CellMark) {
        self.grid.set_mark(cell, mark);
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for row in self.grid.padded_rows() {
            writer.write_record(&row).map_err(|_| LedgerError::Io)?;
        }
        let bytes = writer.into_inner().map_err(|_| LedgerError::Io)?;
        write_bytes_atomic(&self.path, &bytes)?;
        self.grid.record_save();
        Ok(())
    }
}
