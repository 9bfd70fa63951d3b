use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use pathanon_domain::{
    AnonId, AnonIdFormat, Barcode, CaseId, CaseState, RowError, RowErrorKind, RowStatus,
    SlideRecord, StatusCell, case_basename, is_archive_ref,
};
use pathanon_identity::{IdentifierAllocator, validate_ledger};
use pathanon_ledger::{Ledger, RowRange, Sheet};

use crate::EngineError;
use crate::anonymizer::Anonymizer;
use crate::archive::ExtractedCase;
use crate::slides::discover_slides;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    /// Where case directories and archives named in the ledger live.
    pub workdir: PathBuf,
    pub tmpdir: PathBuf,
    pub anondir: PathBuf,
}

/// Progress callbacks. The engine itself never prints.
pub trait RunObserver {
    fn row_skipped(&mut self, _row: u32, _state: CaseState) {}

    fn case_started(&mut self, _row: u32, _case_ref: &str, _anon_id: &AnonId) {}

    fn archive_extracted(&mut self, _row: u32, _case_ref: &str, _dir: &Path) {}

    fn slide_anonymized(&mut self, _row: u32, _barcode: &Barcode) {}

    fn case_completed(&mut self, _range: RowRange, _anon_id: &AnonId, _slides: usize) {}

    fn stopped_early(&mut self, _row: u32, _case_ref: &str, _missing: &Path) {}

    /// The case completed but its extraction directory could not be removed.
    fn cleanup_failed(&mut self, _row: u32, _dir: &Path, _err: &std::io::Error) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Overrides any format stored in the ledger or inferred from it.
    pub id_format: Option<AnonIdFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A pending case was not found in the work directory. Everything above
    /// it has been processed and persisted.
    StoppedEarly { row: u32, case_ref: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub barcodes: BTreeSet<Barcode>,
    pub cases_processed: usize,
    pub slides_anonymized: usize,
    pub rows_skipped: usize,
    pub issued: Vec<(CaseId, AnonId)>,
}

impl RunReport {
    /// blake3 over the sorted barcode set; equal digests mean two runs ended
    /// with the same assignments.
    pub fn barcode_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for barcode in &self.barcodes {
            hasher.update(barcode.as_str().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Validates the whole ledger, then processes pending cases top to bottom,
/// persisting the ledger after every row it touches.
pub fn run<S, A, O>(
    ledger: &mut Ledger<S>,
    layout: &WorkLayout,
    anonymizer: &mut A,
    observer: &mut O,
    options: &RunOptions,
) -> Result<RunReport, EngineError>
where
    S: Sheet,
    A: Anonymizer + ?Sized,
    O: RunObserver + ?Sized,
{
    ledger.check_headers()?;
    let format = match options.id_format.clone() {
        Some(format) => Some(format),
        None => ledger.read_id_format()?,
    };
    let validated = validate_ledger(&ledger.read(), format)?;

    let mut barcodes: BTreeMap<Barcode, u32> = validated.barcodes;
    let mut allocator = IdentifierAllocator::new(validated.map);
    let mut report = RunReport {
        outcome: RunOutcome::Completed,
        barcodes: BTreeSet::new(),
        cases_processed: 0,
        slides_anonymized: 0,
        rows_skipped: 0,
        issued: Vec::new(),
    };

    let mut row = ledger.schema().data_start_row;
    while row <= ledger.max_row() {
        let record = ledger.read_row(row);
        let state = match &record.status {
            StatusCell::Known(RowStatus::Done) => CaseState::AlreadyDone,
            StatusCell::Known(RowStatus::Ignore) => CaseState::Ignored,
            StatusCell::Known(RowStatus::Pending) => CaseState::Pending,
            StatusCell::Unknown(value) => {
                let kind = RowErrorKind::UnknownStatus {
                    value: value.clone(),
                };
                return Err(RowError::new(row, kind).into());
            }
        };

        if state.is_terminal() {
            ledger.mark_row(row);
            ledger.persist(RowRange::single(row))?;
            observer.row_skipped(row, state);
            report.rows_skipped += 1;
            row += 1;
            continue;
        }
        if record.is_blank() {
            row += 1;
            continue;
        }

        let Some(case_id) = record.case_id.clone() else {
            return Err(RowError::new(row, RowErrorKind::MissingCase).into());
        };
        let case_name = case_basename(&record.case_ref);
        let case_path = layout.workdir.join(case_name);
        if !case_path.exists() {
            observer.stopped_early(row, &record.case_ref, &case_path);
            report.outcome = RunOutcome::StoppedEarly {
                row,
                case_ref: record.case_ref.clone(),
            };
            break;
        }

        let anon_id = allocator.allocate(row, &case_id)?;
        observer.case_started(row, &record.case_ref, &anon_id);

        let extracted = if is_archive_ref(case_name) {
            let extracted = ExtractedCase::extract(&case_path, &layout.tmpdir, &case_id, case_name)
                .map_err(|kind| RowError::new(row, kind))?;
            observer.archive_extracted(row, &record.case_ref, extracted.dir());
            Some(extracted)
        } else {
            None
        };
        let case_root = extracted
            .as_ref()
            .map_or(case_path.as_path(), ExtractedCase::root);

        let slides = discover_slides(case_root, case_name, ledger.schema())
            .map_err(|kind| RowError::new(row, kind))?;
        let slide_barcodes = claim_barcodes(row, &anon_id, &slides, &barcodes)?;

        for (slide, barcode) in slides.iter().zip(&slide_barcodes) {
            anonymizer
                .anonymize(&slide.source_path, barcode, &layout.anondir)
                .map_err(|err| RowError::new(row, err.into_row_kind()))?;
            observer.slide_anonymized(row, barcode);
        }

        let range = ledger.expand_case(row, &record.case_ref, &anon_id, &slides);
        ledger.persist(range)?;
        for (offset, barcode) in (0_u32..).zip(slide_barcodes) {
            barcodes.insert(barcode, row + offset);
        }
        if let Some(extracted) = extracted {
            let dir = extracted.dir().to_path_buf();
            if let Err(err) = extracted.remove() {
                observer.cleanup_failed(row, &dir, &err);
            }
        }

        observer.case_completed(range, &anon_id, slides.len());
        report.cases_processed += 1;
        report.slides_anonymized += slides.len();
        row = range.last + 1;
    }

    report.barcodes = barcodes.into_keys().collect();
    report.issued = allocator.issued().to_vec();
    Ok(report)
}

fn claim_barcodes(
    row: u32,
    anon_id: &AnonId,
    slides: &[SlideRecord],
    known: &BTreeMap<Barcode, u32>,
) -> Result<Vec<Barcode>, RowError> {
    let mut out = Vec::with_capacity(slides.len());
    for slide in slides {
        let barcode = slide.barcode(anon_id);
        if let Some(first_row) = known.get(&barcode) {
            return Err(RowError::new(
                row,
                RowErrorKind::DuplicateBarcode {
                    barcode,
                    first_row: *first_row,
                },
            ));
        }
        out.push(barcode);
    }
    Ok(out)
}
