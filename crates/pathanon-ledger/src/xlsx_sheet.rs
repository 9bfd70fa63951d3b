use std::io::Cursor;
use std::path::{Path, PathBuf};

use pathanon_domain::CellRef;
use umya_spreadsheet::{Spreadsheet, Style, Worksheet};

use crate::LedgerError;
use crate::atomic::write_bytes_atomic;
use crate::sheet::{CellMark, Sheet};

const LEDGER_SHEET_INDEX: usize = 0;
const IDENTIFYING_FILL_ARGB: &str = "FFFFC7CE";
const IDENTIFYING_FONT_ARGB: &str = "FFFF0000";

/// First worksheet of an .xlsx workbook. Everything else in the workbook is
/// carried through saves untouched.
pub struct XlsxSheet {
    path: PathBuf,
    book: Spreadsheet,
}

impl XlsxSheet {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if !path.is_file() {
            return Err(LedgerError::Io);
        }
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|_| LedgerError::Parse)?;
        if book.get_sheet(&LEDGER_SHEET_INDEX).is_none() {
            return Err(LedgerError::MissingWorksheet);
        }
        Ok(Self {
            path: path.to_path_buf(),
            book,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet(&self) -> Option<&Worksheet> {
        self.book.get_sheet(&LEDGER_SHEET_INDEX)
    }

    fn sheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.book.get_sheet_mut(&LEDGER_SHEET_INDEX)
    }
}

impl Sheet for XlsxSheet {
    fn max_row(&self) -> u32 {
        self.sheet().map_or(0, Worksheet::get_highest_row)
    }

    fn max_column(&self) -> u32 {
        self.sheet().map_or(0, Worksheet::get_highest_column)
    }

    fn value(&self, cell: CellRef) -> String {
        self.sheet()
            .map(|s| s.get_value((cell.column, cell.row)))
            .unwrap_or_default()
    }

    fn set_value(&mut self, cell: CellRef, value: &str) {
        if let Some(sheet) = self.sheet_mut() {
            sheet
                .get_cell_mut((cell.column, cell.row))
                .set_value_string(value);
        }
    }

    fn copy_cell(&mut self, from: CellRef, to: CellRef) {
        let Some(sheet) = self.sheet_mut() else {
            return;
        };
        let Some(source) = sheet.get_cell((from.column, from.row)) else {
            return;
        };
        let value = source.get_cell_value().clone();
        let style = source.get_style().clone();
        let target = sheet.get_cell_mut((to.column, to.row));
        target.set_cell_value(value);
        target.set_style(style);
    }

    fn insert_rows(&mut self, before_row: u32, count: u32) {
        if count == 0 {
            return;
        }
        if let Some(sheet) = self.sheet_mut() {
            sheet.insert_new_row(&before_row, &count);
        }
    }

    fn set_mark(&mut self, cell: CellRef, mark: CellMark) {
        let Some(sheet) = self.sheet_mut() else {
            return;
        };
        match mark {
            CellMark::Normal => {
                sheet
                    .get_cell_mut((cell.column, cell.row))
                    .set_style(Style::default());
            }
            CellMark::Identifying => {
                let style = sheet.get_style_mut((cell.column, cell.row));
                style.set_background_color(IDENTIFYING_FILL_ARGB);
                style
                    .get_font_mut()
                    .get_color_mut()
                    .set_argb(IDENTIFYING_FONT_ARGB);
            }
        }
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buffer)
            .map_err(|_| LedgerError::Io)?;
        write_bytes_atomic(&self.path, buffer.get_ref())
    }
}
