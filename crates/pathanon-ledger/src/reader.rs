use pathanon_domain::{
    AnonId, AnonIdFormat, CaseGroup, CaseId, CellRef, IdFormatSource, LedgerRow, LedgerRows,
    LedgerSchema, RowError, RowErrorKind, StatusCell,
};

use crate::sheet::Sheet;

pub fn check_headers<S: Sheet + ?Sized>(sheet: &S, schema: &LedgerSchema) -> Result<(), RowError> {
    for check in &schema.header_checks {
        let actual = sheet.value(check.cell);
        if actual.trim() != check.expected {
            return Err(RowError::new(
                check.cell.row,
                RowErrorKind::UnsupportedHeader {
                    cell: check.cell,
                    expected: check.expected.clone(),
                    actual,
                },
            ));
        }
    }
    Ok(())
}

/// Id format stored in the document itself. `None` when the schema infers the
/// format or both cells are still blank.
pub fn read_id_format<S: Sheet + ?Sized>(
    sheet: &S,
    schema: &LedgerSchema,
) -> Result<Option<AnonIdFormat>, RowError> {
    let IdFormatSource::Cells { prefix, digits } = &schema.id_format else {
        return Ok(None);
    };
    let prefix_value = sheet.value(*prefix).trim().to_string();
    let digits_value = sheet.value(*digits).trim().to_string();
    if prefix_value.is_empty() && digits_value.is_empty() {
        return Ok(None);
    }

    let invalid = |cell: CellRef, value: &str| {
        RowError::new(
            cell.row,
            RowErrorKind::InvalidIdFormatCell {
                cell,
                value: value.to_string(),
            },
        )
    };
    let width = parse_digit_count(&digits_value).ok_or_else(|| invalid(*digits, &digits_value))?;
    AnonIdFormat::new(&prefix_value, width)
        .map(Some)
        .ok_or_else(|| invalid(*prefix, &prefix_value))
}

// Spreadsheets hand numbers back as "3" or "3.0" depending on how they were typed.
fn parse_digit_count(raw: &str) -> Option<usize> {
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    raw.parse::<usize>().ok().filter(|d| (1..=18).contains(d))
}

pub fn read_row<S: Sheet + ?Sized>(sheet: &S, schema: &LedgerSchema, row: u32) -> LedgerRow {
    let columns = &schema.columns;
    let text = |column: u32| sheet.value(CellRef::new(row, column)).trim().to_string();

    let case_ref = text(columns.case);
    LedgerRow {
        row,
        status: StatusCell::parse(&text(columns.status)),
        case_id: CaseId::from_case_ref(&case_ref),
        case_ref,
        inherited_case: false,
        orig_file: text(columns.orig_file),
        anon_id: AnonId::new(&text(columns.anon_id)),
        block: text(columns.block),
        stain: text(columns.stain),
    }
}

/// Reads every data row and groups rows whose case cell was left blank under
/// the case above them. A blank case cell only continues the previous group
/// when the row carries no AnonID or the same AnonID as the row above;
/// otherwise it opens a group with no case (keys already removed).
pub fn read_ledger<S: Sheet + ?Sized>(sheet: &S, schema: &LedgerSchema) -> LedgerRows {
    let mut groups: Vec<CaseGroup> = Vec::new();

    for row in schema.data_start_row..=sheet.max_row() {
        let mut record = read_row(sheet, schema, row);
        if record.is_blank() {
            continue;
        }

        if record.case_ref.is_empty()
            && let Some(group) = groups.last_mut()
            && let Some(previous) = group.rows.last()
            && (record.anon_id.is_none() || record.anon_id == previous.anon_id)
        {
            record.case_id = group.case_id.clone();
            record.inherited_case = true;
            group.rows.push(record);
            continue;
        }

        groups.push(CaseGroup {
            case_id: record.case_id.clone(),
            rows: vec![record],
        });
    }

    LedgerRows { groups }
}
