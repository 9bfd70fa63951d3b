use pathanon_domain::{AnonIdFormat, LedgerRows, LedgerSchema, RowErrorKind};
use pathanon_identity::{IdentifierAllocator, validate_ledger};
use pathanon_ledger::{MemorySheet, reader};

fn ledger_rows(data: &[[&str; 6]]) -> LedgerRows {
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); 12];
    for r in data {
        rows.push(r.iter().map(|s| s.to_string()).collect());
    }
    reader::read_ledger(&MemorySheet::from_rows(rows), &LedgerSchema::aida_v1())
}

#[test]
fn consistent_ledger_validates_and_reports_counts() {
    let rows = ledger_rows(&[
        ["Done", "case1", "A_HE/a.svs", "P001", "A", "HE"],
        ["Done", "case1", "B_PAS/b.svs", "P001", "B", "PAS"],
        ["ignore", "junk", "whatever", "???", "", ""],
        ["", "case2", "", "P002", "", ""],
        ["", "case3.zip", "", "", "", ""],
    ]);
    let validated = validate_ledger(&rows, None).expect("valid");

    assert_eq!(validated.done_rows, 2);
    assert_eq!(validated.ignored_rows, 1);
    assert_eq!(validated.pending_cases, 2);
    assert_eq!(validated.unallocated_cases, 1);
    assert_eq!(validated.barcodes.len(), 2);
    assert_eq!(validated.map.high_water_mark(), 2);
    assert_eq!(validated.format().map(ToString::to_string).as_deref(), Some("P###"));
}

#[test]
fn same_anon_id_for_two_cases_names_both_rows() {
    let rows = ledger_rows(&[
        ["", "case1", "", "P001", "", ""],
        ["", "case2", "", "P002", "", ""],
        ["", "case3", "", "P002", "", ""],
    ]);
    let err = validate_ledger(&rows, None).expect_err("clash");
    assert_eq!(err.row, 15);
    assert!(matches!(
        &err.kind,
        RowErrorKind::AnonIdTaken { other_row: 14, other_case, .. } if other_case.as_str() == "case2"
    ));
    assert_eq!(err.reason_code(), "VALIDATION_ERROR");
    assert!(err.to_string().starts_with("Error on row 15: Case case3 is given AnonID P002"));
}

#[test]
fn unknown_status_is_rejected() {
    let rows = ledger_rows(&[["later", "case1", "", "P001", "", ""]]);
    let err = validate_ledger(&rows, None).expect_err("status");
    assert_eq!(
        err.kind,
        RowErrorKind::UnknownStatus {
            value: "later".to_string()
        }
    );
}

#[test]
fn done_row_needs_anon_id_block_and_stain() {
    let rows = ledger_rows(&[["done", "case1", "A_HE/a.svs", "P001", "A", ""]]);
    let err = validate_ledger(&rows, None).expect_err("incomplete");
    assert_eq!(err.kind, RowErrorKind::DoneRowIncomplete);
}

#[test]
fn duplicate_barcode_names_first_row() {
    let rows = ledger_rows(&[
        ["done", "case1", "A_HE/a.svs", "P001", "A", "HE"],
        ["done", "", "A_HE/b.svs", "P001", "A", "HE"],
    ]);
    let err = validate_ledger(&rows, None).expect_err("duplicate");
    assert_eq!(err.row, 14);
    assert!(matches!(
        err.kind,
        RowErrorKind::DuplicateBarcode { first_row: 13, .. }
    ));
}

#[test]
fn decreasing_number_is_rejected() {
    let rows = ledger_rows(&[
        ["", "case1", "", "P003", "", ""],
        ["", "case2", "", "P002", "", ""],
    ]);
    let err = validate_ledger(&rows, None).expect_err("decrease");
    assert_eq!(
        err.kind,
        RowErrorKind::AnonIdDecreased {
            number: 2,
            high_water_mark: 3
        }
    );
}

#[test]
fn supplied_format_overrides_inference() {
    let rows = ledger_rows(&[["", "case1", "", "P01", "", ""]]);
    let err = validate_ledger(&rows, AnonIdFormat::new("P", 3)).expect_err("width");
    assert!(matches!(err.kind, RowErrorKind::MalformedAnonId { .. }));
}

#[test]
fn case_may_not_reappear_unless_both_rows_are_done() {
    let rows = ledger_rows(&[
        ["done", "case1", "A_HE/a.svs", "P001", "A", "HE"],
        ["", "case1", "", "P001", "", ""],
    ]);
    let err = validate_ledger(&rows, None).expect_err("reappears");
    assert_eq!(err.row, 14);
    assert!(matches!(
        err.kind,
        RowErrorKind::DuplicateCase { other_row: 13, .. }
    ));

    let rows = ledger_rows(&[
        ["", "case1", "", "", "", ""],
        ["", "case1", "", "", "", ""],
    ]);
    let err = validate_ledger(&rows, AnonIdFormat::new("P", 3)).expect_err("twice pending");
    assert!(matches!(err.kind, RowErrorKind::DuplicateCase { .. }));
}

#[test]
fn pending_row_with_slide_data_is_garbage() {
    let rows = ledger_rows(&[["", "case1", "A_HE/a.svs", "P001", "", ""]]);
    let err = validate_ledger(&rows, None).expect_err("garbage");
    assert_eq!(err.kind, RowErrorKind::PendingRowHasSlideData);
}

#[test]
fn pending_row_without_case_is_rejected() {
    let rows = ledger_rows(&[["", "", "", "P001", "", ""]]);
    let err = validate_ledger(&rows, None).expect_err("no case");
    assert_eq!(err.kind, RowErrorKind::MissingCase);

    let rows = ledger_rows(&[
        ["", "case1", "", "P001", "", ""],
        ["", "", "", "", "", ""],
        ["", "", "", "P001", "", "HE"],
    ]);
    let err = validate_ledger(&rows, None).expect_err("inherited pending");
    assert_eq!(err.row, 15);
}

#[test]
fn explicit_anon_id_after_unallocated_row_is_rejected() {
    let rows = ledger_rows(&[
        ["", "case1", "", "", "", ""],
        ["", "case2", "", "P005", "", ""],
    ]);
    let err = validate_ledger(&rows, None).expect_err("ordering");
    assert_eq!(err.row, 14);
    assert!(matches!(
        err.kind,
        RowErrorKind::AnonIdAfterUnallocated {
            unallocated_row: 13,
            ..
        }
    ));
}

#[test]
fn unallocated_case_without_any_format_fails_up_front() {
    let rows = ledger_rows(&[["", "case1", "", "", "", ""]]);
    let err = validate_ledger(&rows, None).expect_err("no format");
    assert_eq!(err.row, 13);
    assert_eq!(err.kind, RowErrorKind::NoIdFormat);
}

#[test]
fn keyless_done_rows_still_count_towards_high_water_mark() {
    let rows = ledger_rows(&[
        ["done", "", "", "P001", "A", "HE"],
        ["done", "", "", "P002", "A", "HE"],
        ["", "case9", "", "", "", ""],
    ]);
    let validated = validate_ledger(&rows, None).expect("valid");
    let mut allocator = IdentifierAllocator::new(validated.map);
    let case9 = pathanon_domain::CaseId::from_case_ref("case9").expect("case");
    let anon = allocator.allocate(15, &case9).expect("allocate");
    assert_eq!(anon.as_str(), "P003");
}
