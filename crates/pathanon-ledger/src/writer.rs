use pathanon_domain::{
    AnonId, AnonIdFormat, CellRef, LedgerRow, LedgerRows, LedgerSchema, RowError, RowStatus,
    SlideRecord,
};

use crate::LedgerError;
use crate::reader;
use crate::sheet::{CellMark, Sheet};

/// Inclusive range of ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: u32,
    pub last: u32,
}

impl RowRange {
    pub const fn single(row: u32) -> Self {
        Self {
            first: row,
            last: row,
        }
    }

    pub const fn row_count(&self) -> u32 {
        self.last - self.first + 1
    }
}

/// The open ledger document together with its schema. Every mutation goes
/// through here; `persist` is the only place the document is written out.
pub struct Ledger<S: Sheet> {
    sheet: S,
    schema: LedgerSchema,
    checkpoints: Vec<RowRange>,
}

impl<S: Sheet> Ledger<S> {
    pub fn new(sheet: S, schema: LedgerSchema) -> Self {
        Self {
            sheet,
            schema,
            checkpoints: Vec::new(),
        }
    }

    pub fn schema(&self) -> &LedgerSchema {
        &self.schema
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn into_sheet(self) -> S {
        self.sheet
    }

    pub fn max_row(&self) -> u32 {
        self.sheet.max_row()
    }

    pub fn check_headers(&self) -> Result<(), RowError> {
        reader::check_headers(&self.sheet, &self.schema)
    }

    pub fn read_id_format(&self) -> Result<Option<AnonIdFormat>, RowError> {
        reader::read_id_format(&self.sheet, &self.schema)
    }

    pub fn read(&self) -> LedgerRows {
        reader::read_ledger(&self.sheet, &self.schema)
    }

    pub fn read_row(&self, row: u32) -> LedgerRow {
        reader::read_row(&self.sheet, &self.schema, row)
    }

    /// Case and OrigFile cells that still hold a value are flagged as
    /// identifying; cleared ones go back to the normal style.
    pub fn mark_row(&mut self, row: u32) {
        for column in [self.schema.columns.case, self.schema.columns.orig_file] {
            let cell = CellRef::new(row, column);
            let mark = if self.sheet.value(cell).trim().is_empty() {
                CellMark::Normal
            } else {
                CellMark::Identifying
            };
            self.sheet.set_mark(cell, mark);
        }
    }

    /// Rewrites the pending row `row` as one done row per slide, inserting rows
    /// below it as needed. Extra columns of the original row are copied cell
    /// for cell onto every inserted row.
    pub fn expand_case(
        &mut self,
        row: u32,
        case_ref: &str,
        anon_id: &AnonId,
        slides: &[SlideRecord],
    ) -> RowRange {
        let Some(count) = u32::try_from(slides.len()).ok().filter(|n| *n > 0) else {
            return RowRange::single(row);
        };

        let columns = self.schema.columns;
        let extras: Vec<u32> = (1..=self.sheet.max_column())
            .filter(|c| !columns.is_role(*c))
            .collect();

        if count > 1 {
            self.sheet.insert_rows(row + 1, count - 1);
        }

        for (offset, slide) in (0_u32..).zip(slides) {
            let r = row + offset;
            let mut put = |column: u32, value: &str| {
                self.sheet.set_value(CellRef::new(r, column), value);
            };
            put(columns.status, RowStatus::Done.ledger_text());
            put(columns.case, case_ref);
            put(columns.orig_file, &slide.relative_path);
            put(columns.anon_id, anon_id.as_str());
            put(columns.block, &slide.block);
            put(columns.stain, &slide.stain);
            if offset > 0 {
                for column in &extras {
                    self.sheet
                        .copy_cell(CellRef::new(row, *column), CellRef::new(r, *column));
                }
            }
            self.mark_row(r);
        }

        RowRange {
            first: row,
            last: row + count - 1,
        }
    }

    /// Writes the document out and records `range` as the latest checkpoint.
    pub fn persist(&mut self, range: RowRange) -> Result<(), LedgerError> {
        self.sheet.save()?;
        self.checkpoints.push(range);
        Ok(())
    }

    pub fn checkpoints(&self) -> &[RowRange] {
        &self.checkpoints
    }
}
