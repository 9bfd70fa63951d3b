use std::collections::BTreeMap;

use pathanon_domain::{
    AnonIdFormat, Barcode, CaseId, LedgerRow, LedgerRows, RowError, RowErrorKind, RowStatus,
    StatusCell,
};

use crate::IdentifierMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLedger {
    pub map: IdentifierMap,
    /// Barcodes of done rows, with the row each first appeared on.
    pub barcodes: BTreeMap<Barcode, u32>,
    pub done_rows: usize,
    pub ignored_rows: usize,
    pub pending_cases: usize,
    pub unallocated_cases: usize,
}

impl ValidatedLedger {
    pub fn format(&self) -> Option<&AnonIdFormat> {
        self.map.format()
    }
}

#[derive(Debug, Clone, Copy)]
struct CaseSeen {
    row: u32,
    done: bool,
}

/// Full pre-pass over the ledger in row order. Stops at the first violation.
pub fn validate_ledger(
    rows: &LedgerRows,
    format: Option<AnonIdFormat>,
) -> Result<ValidatedLedger, RowError> {
    let mut out = ValidatedLedger {
        map: IdentifierMap::new(format),
        barcodes: BTreeMap::new(),
        done_rows: 0,
        ignored_rows: 0,
        pending_cases: 0,
        unallocated_cases: 0,
    };
    let mut cases: BTreeMap<CaseId, CaseSeen> = BTreeMap::new();
    let mut first_unallocated: Option<u32> = None;

    for row in rows.rows() {
        let status = match &row.status {
            StatusCell::Known(status) => *status,
            StatusCell::Unknown(value) => {
                return Err(RowError::new(
                    row.row,
                    RowErrorKind::UnknownStatus {
                        value: value.clone(),
                    },
                ));
            }
        };
        if status == RowStatus::Ignore {
            out.ignored_rows += 1;
            continue;
        }

        if status == RowStatus::Done {
            check_done_row(row, &mut out.barcodes)?;
            out.done_rows += 1;
        }

        match &row.anon_id {
            Some(anon_id) => {
                if let Some(unallocated_row) = first_unallocated {
                    return Err(RowError::new(
                        row.row,
                        RowErrorKind::AnonIdAfterUnallocated {
                            anon_id: anon_id.clone(),
                            unallocated_row,
                        },
                    ));
                }
                out.map.observe(row.row, anon_id)?;
                if let Some(case_id) = &row.case_id {
                    out.map.bind(row.row, case_id, anon_id)?;
                }
            }
            None => {
                first_unallocated.get_or_insert(row.row);
                out.unallocated_cases += 1;
            }
        }

        if let Some(case_id) = &row.case_id
            && !row.inherited_case
        {
            let done = status == RowStatus::Done;
            if let Some(seen) = cases.get(case_id)
                && !(done && seen.done)
            {
                return Err(RowError::new(
                    row.row,
                    RowErrorKind::DuplicateCase {
                        case_id: case_id.clone(),
                        other_row: seen.row,
                    },
                ));
            }
            cases.insert(case_id.clone(), CaseSeen { row: row.row, done });
        }

        if status == RowStatus::Pending {
            if row.has_slide_data() {
                return Err(RowError::new(row.row, RowErrorKind::PendingRowHasSlideData));
            }
            if row.case_id.is_none() || row.inherited_case {
                return Err(RowError::new(row.row, RowErrorKind::MissingCase));
            }
            out.pending_cases += 1;
        }
    }

    if let Some(row) = first_unallocated
        && out.map.format().is_none()
    {
        return Err(RowError::new(row, RowErrorKind::NoIdFormat));
    }

    Ok(out)
}

fn check_done_row(row: &LedgerRow, barcodes: &mut BTreeMap<Barcode, u32>) -> Result<(), RowError> {
    let Some(barcode) = row.barcode() else {
        return Err(RowError::new(row.row, RowErrorKind::DoneRowIncomplete));
    };
    if let Some(first_row) = barcodes.get(&barcode) {
        return Err(RowError::new(
            row.row,
            RowErrorKind::DuplicateBarcode {
                barcode,
                first_row: *first_row,
            },
        ));
    }
    barcodes.insert(barcode, row.row);
    Ok(())
}
