use core::fmt;

use crate::{AnonId, AnonIdFormat, Barcode, CaseId, CellRef};

/// A failure tied to one ledger row. Every variant aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: u32,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    UnsupportedHeader {
        cell: CellRef,
        expected: String,
        actual: String,
    },
    InvalidIdFormatCell {
        cell: CellRef,
        value: String,
    },
    UnknownStatus {
        value: String,
    },
    DoneRowIncomplete,
    DuplicateBarcode {
        barcode: Barcode,
        first_row: u32,
    },
    AnonIdWithoutNumber {
        anon_id: AnonId,
    },
    MalformedAnonId {
        anon_id: AnonId,
        format: AnonIdFormat,
    },
    AnonIdDecreased {
        number: u64,
        high_water_mark: u64,
    },
    AnonIdTaken {
        case_id: CaseId,
        anon_id: AnonId,
        other_case: CaseId,
        other_row: u32,
    },
    CaseAlreadyMapped {
        case_id: CaseId,
        anon_id: AnonId,
        other_anon_id: AnonId,
        other_row: u32,
    },
    DuplicateCase {
        case_id: CaseId,
        other_row: u32,
    },
    PendingRowHasSlideData,
    MissingCase,
    AnonIdAfterUnallocated {
        anon_id: AnonId,
        unallocated_row: u32,
    },
    NoIdFormat,
    AnonIdSpaceExhausted {
        format: AnonIdFormat,
    },
    InvalidSlideDirectory {
        directory: String,
        case: String,
    },
    SlideCount {
        directory: String,
        case: String,
        found: Vec<String>,
    },
    NoSlides {
        case: String,
    },
    CaseUnreadable {
        case: String,
        detail: String,
    },
    ArchiveUnreadable {
        case: String,
    },
    ArchiveUnsafeEntry {
        case: String,
    },
    AnonymizerFailed {
        command: String,
    },
    AnonymizerOutputMissing {
        expected: String,
    },
    AnonymizerOutputNotRemoved {
        path: String,
    },
}

impl RowError {
    pub fn new(row: u32, kind: RowErrorKind) -> Self {
        Self { row, kind }
    }

    pub fn reason_code(&self) -> &'static str {
        match self.kind {
            RowErrorKind::UnsupportedHeader { .. } | RowErrorKind::InvalidIdFormatCell { .. } => {
                "UNSUPPORTED_LEDGER"
            }
            RowErrorKind::InvalidSlideDirectory { .. }
            | RowErrorKind::SlideCount { .. }
            | RowErrorKind::NoSlides { .. }
            | RowErrorKind::CaseUnreadable { .. } => "SLIDE_LAYOUT_ERROR",
            RowErrorKind::ArchiveUnreadable { .. } | RowErrorKind::ArchiveUnsafeEntry { .. } => {
                "ARCHIVE_ERROR"
            }
            RowErrorKind::AnonymizerFailed { .. }
            | RowErrorKind::AnonymizerOutputMissing { .. }
            | RowErrorKind::AnonymizerOutputNotRemoved { .. } => "ANONYMIZER_FAILED",
            _ => "VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error on row {}: {}", self.row, self.kind)
    }
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedHeader {
                cell,
                expected,
                actual,
            } => write!(
                f,
                "Unsupported ledger format. Cell {cell} should be {expected:?} but is {actual:?}."
            ),
            Self::InvalidIdFormatCell { cell, value } => write!(
                f,
                "Cell {cell} must hold the AnonID prefix or digit count, but is {value:?}."
            ),
            Self::UnknownStatus { value } => write!(f, "Unknown Status {value:?}."),
            Self::DoneRowIncomplete => f.write_str("AnonID/Block/Stain missing!"),
            Self::DuplicateBarcode { barcode, first_row } => write!(
                f,
                "Barcode {:?} same as on row {first_row} but barcodes must be unique.",
                barcode.as_str()
            ),
            Self::AnonIdWithoutNumber { anon_id } => write!(
                f,
                "AnonID {:?} must end with a zero padded number, such as '001'.",
                anon_id.as_str()
            ),
            Self::MalformedAnonId { anon_id, format } => write!(
                f,
                "AnonID is {:?}, but must start with Prefix {:?} followed by a {}-digit number > 0 ({format}).",
                anon_id.as_str(),
                format.prefix(),
                format.digits()
            ),
            Self::AnonIdDecreased {
                number,
                high_water_mark,
            } => write!(
                f,
                "AnonID number is {number}, but must not be less than the previous ({high_water_mark})."
            ),
            Self::AnonIdTaken {
                case_id,
                anon_id,
                other_case,
                other_row,
            } => write!(
                f,
                "Case {case_id} is given AnonID {anon_id} on this row, but this AnonID was previously given to Case {other_case} on row {other_row}."
            ),
            Self::CaseAlreadyMapped {
                case_id,
                anon_id,
                other_anon_id,
                other_row,
            } => write!(
                f,
                "Case {case_id} is given AnonID {anon_id} on this row, but this Case was previously given AnonID {other_anon_id} on row {other_row}."
            ),
            Self::DuplicateCase { case_id, other_row } => write!(
                f,
                "Cases must be unique before anonymizing, but ID {:?} occurs multiple times; here and also on row {other_row}.",
                case_id.as_str()
            ),
            Self::PendingRowHasSlideData => f.write_str(
                "Garbage in OrigFile/Block/Stain columns; OrigFile, Block and Stain must be given by subfolders to Case.",
            ),
            Self::MissingCase => f.write_str("No Case specified."),
            Self::AnonIdAfterUnallocated {
                anon_id,
                unallocated_row,
            } => write!(
                f,
                "AnonID {anon_id} follows row {unallocated_row}, which has no AnonID yet; AnonIDs are allocated in row order."
            ),
            Self::NoIdFormat => f.write_str(
                "No AnonID is given anywhere in the ledger and no prefix/digits were supplied, so a new AnonID cannot be allocated.",
            ),
            Self::AnonIdSpaceExhausted { format } => {
                write!(f, "All AnonIDs of the form {format} are used up.")
            }
            Self::InvalidSlideDirectory { directory, case } => write!(
                f,
                "Slide directory {directory:?} for Case {case:?} is not named on the format BLOCK_STAIN (eg 'A_HE')."
            ),
            Self::SlideCount {
                directory,
                case,
                found,
            } => {
                write!(
                    f,
                    "Expected 1 slide file in slide directory {directory:?} for Case {case:?} but found {}",
                    found.len()
                )?;
                if !found.is_empty() {
                    let names = found
                        .iter()
                        .map(|n| format!("{n:?}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, " ({names})")?;
                }
                f.write_str(".")
            }
            Self::NoSlides { case } => write!(f, "No slides present for Case {case:?}."),
            Self::CaseUnreadable { case, detail } => {
                write!(f, "Case {case:?} could not be read: {detail}.")
            }
            Self::ArchiveUnreadable { case } => {
                write!(f, "Case archive {case:?} is not a readable zip file.")
            }
            Self::ArchiveUnsafeEntry { case } => write!(
                f,
                "Case archive {case:?} contains an entry that would extract outside its directory."
            ),
            Self::AnonymizerFailed { command } => write!(
                f,
                "anonymizer returned a nonzero exit code for command {command}. Aborting."
            ),
            Self::AnonymizerOutputMissing { expected } => write!(
                f,
                "anonymizer succeeded but did not produce {expected:?}. Aborting."
            ),
            Self::AnonymizerOutputNotRemoved { path } => write!(
                f,
                "anonymizer output was copied to the output directory but {path:?} could not be removed; delete it before rerunning. Aborting."
            ),
        }
    }
}
