use std::collections::BTreeMap;

use pathanon_domain::CellRef;

use crate::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMark {
    #[default]
    Normal,
    /// The cell still holds a key that links an AnonID back to a person.
    Identifying,
}

/// A single worksheet of the ledger document. Rows and columns are one-based.
pub trait Sheet {
    fn max_row(&self) -> u32;

    fn max_column(&self) -> u32;

    fn value(&self, cell: CellRef) -> String;

    /// Stores `value` as text, never as a number or date.
    fn set_value(&mut self, cell: CellRef, value: &str);

    /// Copies the value of `from` into `to` unchanged, together with whatever
    /// formatting the backend keeps for it.
    fn copy_cell(&mut self, from: CellRef, to: CellRef) {
        let value = self.value(from);
        self.set_value(to, &value);
    }

    /// Inserts `count` blank rows so that the first new row has index `before_row`.
    fn insert_rows(&mut self, before_row: u32, count: u32);

    fn set_mark(&mut self, cell: CellRef, mark: CellMark);

    fn save(&mut self) -> Result<(), LedgerError>;
}

impl<S: Sheet + ?Sized> Sheet for Box<S> {
    fn max_row(&self) -> u32 {
        (**self).max_row()
    }

    fn max_column(&self) -> u32 {
        (**self).max_column()
    }

    fn value(&self, cell: CellRef) -> String {
        (**self).value(cell)
    }

    fn set_value(&mut self, cell: CellRef, value: &str) {
        (**self).set_value(cell, value)
    }

    fn copy_cell(&mut self, from: CellRef, to: CellRef) {
        (**self).copy_cell(from, to)
    }

    fn insert_rows(&mut self, before_row: u32, count: u32) {
        (**self).insert_rows(before_row, count)
    }

    fn set_mark(&mut self, cell: CellRef, mark: CellMark) {
        (**self).set_mark(cell, mark)
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        (**self).save()
    }
}

/// Grid held entirely in memory. Backs the CSV document and is used directly
/// wherever no file is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
    marks: BTreeMap<CellRef, CellMark>,
    saves: u32,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
            marks: BTreeMap::new(),
            saves: 0,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn mark(&self, cell: CellRef) -> CellMark {
        self.marks.get(&cell).copied().unwrap_or_default()
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }

    pub(crate) fn padded_rows(&self) -> Vec<Vec<String>> {
        let width = self.max_column().max(1) as usize;
        self.rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.resize(width, String::new());
                r
            })
            .collect()
    }

    pub(crate) fn record_save(&mut self) {
        self.saves = self.saves.saturating_add(1);
    }
}

impl Sheet for MemorySheet {
    fn max_row(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    fn max_column(&self) -> u32 {
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        u32::try_from(widest).unwrap_or(u32::MAX)
    }

    fn value(&self, cell: CellRef) -> String {
        if cell.row == 0 || cell.column == 0 {
            return String::new();
        }
        self.rows
            .get(cell.row as usize - 1)
            .and_then(|r| r.get(cell.column as usize - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn set_value(&mut self, cell: CellRef, value: &str) {
        if cell.row == 0 || cell.column == 0 {
            return;
        }
        let (r, c) = (cell.row as usize - 1, cell.column as usize - 1);
        if self.rows.len() <= r {
            self.rows.resize(r + 1, Vec::new());
        }
        let row = &mut self.rows[r];
        if row.len() <= c {
            row.resize(c + 1, String::new());
        }
        row[c] = value.to_string();
    }

    fn insert_rows(&mut self, before_row: u32, count: u32) {
        if before_row == 0 || count == 0 {
            return;
        }
        let at = (before_row as usize - 1).min(self.rows.len());
        self.rows
            .splice(at..at, (0..count).map(|_| Vec::<String>::new()));

        let shifted = std::mem::take(&mut self.marks)
            .into_iter()
            .map(|(cell, mark)| {
                if cell.row >= before_row {
                    (CellRef::new(cell.row + count, cell.column), mark)
                } else {
                    (cell, mark)
                }
            })
            .collect();
        self.marks = shifted;
    }

    fn set_mark(&mut self, cell: CellRef, mark: CellMark) {
        match mark {
            CellMark::Normal => {
                self.marks.remove(&cell);
            }
            CellMark::Identifying => {
                self.marks.insert(cell, mark);
            }
        }
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        self.record_save();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rows_shifts_values_and_marks() {
        let mut sheet = MemorySheet::from_rows([vec!["a"], vec!["b"], vec!["c"]]);
        sheet.set_mark(CellRef::new(3, 1), CellMark::Identifying);

        sheet.insert_rows(2, 2);

        assert_eq!(sheet.max_row(), 5);
        assert_eq!(sheet.value(CellRef::new(1, 1)), "a");
        assert_eq!(sheet.value(CellRef::new(2, 1)), "");
        assert_eq!(sheet.value(CellRef::new(3, 1)), "");
        assert_eq!(sheet.value(CellRef::new(4, 1)), "b");
        assert_eq!(sheet.mark(CellRef::new(3, 1)), CellMark::Normal);
        assert_eq!(sheet.mark(CellRef::new(5, 1)), CellMark::Identifying);
    }

    #[test]
    fn set_value_grows_grid() {
        let mut sheet = MemorySheet::new();
        sheet.set_value(CellRef::new(3, 4), "x");
        assert_eq!(sheet.max_row(), 3);
        assert_eq!(sheet.max_column(), 4);
        assert_eq!(sheet.value(CellRef::new(3, 4)), "x");
        assert_eq!(sheet.value(CellRef::new(9, 9)), "");
    }

    #[test]
    fn padded_rows_are_rectangular() {
        let sheet = MemorySheet::from_rows([vec!["a", "b", "c"], vec![]]);
        let padded = sheet.padded_rows();
        assert!(padded.iter().all(|r| r.len() == 3));
    }
}
