use super::*;

use pathanon_domain::{AnonId, Barcode, CaseState};
use pathanon_engine::{
    ProcessAnonymizer, RunObserver, RunOptions, RunOutcome, RunReport, WorkLayout, detect_garbage,
};
use pathanon_ledger::RowRange;

use crate::garbage_command::report_garbage;

pub(super) fn cmd_run(exe: &str, args: &[String]) -> ExitCode {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_run_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_run_args(args) {
        Ok(v) => v,
        Err(msg) => return exit_usage(exe, &msg, print_run_help),
    };
    if let Err(msg) = validate_run_args(&parsed) {
        return exit_usage(exe, &msg, print_run_help);
    }
    let schema = match parsed.ledger.load_schema() {
        Ok(s) => s,
        Err(msg) => return exit_usage(exe, &msg, print_run_help),
    };
    let id_format = match parsed.ledger.id_format() {
        Ok(f) => f,
        Err(msg) => return exit_usage(exe, &msg, print_run_help),
    };
    let ledger_path = match parsed.ledger.ledger_path() {
        Ok(p) => p.to_path_buf(),
        Err(msg) => return exit_usage(exe, &msg, print_run_help),
    };

    let layout = WorkLayout {
        workdir: parsed
            .workdir
            .clone()
            .unwrap_or_else(|| ledger_dir(&ledger_path)),
        tmpdir: parsed
            .tmpdir
            .clone()
            .unwrap_or_else(|| beside_ledger(&ledger_path, "_tmp")),
        anondir: parsed
            .anondir
            .clone()
            .unwrap_or_else(|| beside_ledger(&ledger_path, "_anon")),
    };

    let ledger_label = path_label(&ledger_path);
    let schema_name = schema.name.clone();
    let log_ctx = LogContext::new(&ledger_label, &schema_name);
    let fail = |reason_code: &str, event: &str, message: &str| {
        log_error(log_ctx, event, reason_code, Some(message));
        eprintln!("{message}");
        if parsed.suppress_exitcode {
            ExitCode::from(EXIT_OK)
        } else {
            ExitCode::from(EXIT_FATAL)
        }
    };

    for dir in [&layout.tmpdir, &layout.anondir] {
        if let Err(err) = std::fs::create_dir_all(dir) {
            let message = format!("error: could not create {}: {}", dir.display(), err.kind());
            return fail("INTERNAL_ERROR", "output_dir_failed", &message);
        }
    }

    let mut ledger = match pathanon_ledger::open_document(&ledger_path) {
        Ok(sheet) => Ledger::new(sheet, schema),
        Err(err) => {
            let message = format!("error: {err}");
            return fail(err.reason_code(), "ledger_open_failed", &message);
        }
    };

    log_info_detail(log_ctx, "run_started", parsed.style.as_str());
    let mut anonymizer = ProcessAnonymizer::new(&parsed.anonymizer, parsed.style);
    let mut progress = ConsoleProgress { log_ctx };
    let options = RunOptions { id_format };

    let report = match pathanon_engine::run(
        &mut ledger,
        &layout,
        &mut anonymizer,
        &mut progress,
        &options,
    ) {
        Ok(report) => report,
        Err(err) => return fail(err.reason_code(), "run_failed", &err.to_string()),
    };

    match detect_garbage(&layout.anondir, &report.barcodes) {
        Ok(garbage) => report_garbage(log_ctx, &garbage),
        Err(err) => {
            let detail = err.kind().to_string();
            log_warn(log_ctx, "garbage_scan_failed", "INTERNAL_ERROR", Some(&detail));
        }
    }

    finish(log_ctx, &report);
    ExitCode::from(EXIT_OK)
}

fn finish(log_ctx: LogContext<'_>, report: &RunReport) {
    log_info(
        log_ctx,
        "run_completed",
        Some(BTreeMap::from([
            ("cases_processed", report.cases_processed as u64),
            ("slides_anonymized", report.slides_anonymized as u64),
            ("rows_skipped", report.rows_skipped as u64),
            ("ids_issued", report.issued.len() as u64),
            ("barcodes", report.barcodes.len() as u64),
        ])),
    );
    log_info_detail(log_ctx, "barcode_digest", &report.barcode_digest());

    if report.outcome == RunOutcome::Completed {
        println!("Done! Processed all cases in the ledger.");
    } else {
        println!("Done! Stopped at the first case missing from the work directory.");
    }
    println!(
        "{} case(s) processed, {} slide(s) anonymized.",
        report.cases_processed, report.slides_anonymized
    );
    println!();
    println!("Your data is now Pseudonymous.");
    println!(
        "To make your data Anonymous: Delete all keys (the Case and OrigFile columns) from the ledger."
    );
}

struct ConsoleProgress<'a> {
    log_ctx: LogContext<'a>,
}

impl RunObserver for ConsoleProgress<'_> {
    fn row_skipped(&mut self, row: u32, state: CaseState) {
        println!("Row {row}: {}", state.as_str());
    }

    fn case_started(&mut self, row: u32, case_ref: &str, anon_id: &AnonId) {
        println!("Row {row}: anonymizing case {case_ref} as {anon_id}");
    }

    fn archive_extracted(&mut self, row: u32, case_ref: &str, dir: &Path) {
        println!("Row {row}: extracted {case_ref} to {}", dir.display());
    }

    fn slide_anonymized(&mut self, _row: u32, barcode: &Barcode) {
        println!("  {barcode}");
    }

    fn case_completed(&mut self, range: RowRange, anon_id: &AnonId, slides: usize) {
        println!(
            "Rows {}-{}: {anon_id} done ({slides} slide(s))",
            range.first, range.last
        );
        log_info(
            self.log_ctx,
            "case_completed",
            Some(BTreeMap::from([
                ("first_row", u64::from(range.first)),
                ("last_row", u64::from(range.last)),
                ("slides", slides as u64),
            ])),
        );
    }

    fn cleanup_failed(&mut self, row: u32, dir: &Path, err: &std::io::Error) {
        println!("Row {row}: could not remove {}", dir.display());
        log_warn(
            self.log_ctx,
            "cleanup_failed",
            "CLEANUP_FAILED",
            Some(&err.kind().to_string()),
        );
    }

    fn stopped_early(&mut self, row: u32, case_ref: &str, missing: &Path) {
        println!(
            "Terminating at Row {row}: Case {case_ref} does not exist in work directory {}",
            missing
                .parent()
                .map_or_else(|| missing.display().to_string(), |p| p.display().to_string())
        );
        log_warn(
            self.log_ctx,
            "case_not_found",
            "CASE_NOT_FOUND",
            Some(&format!("row {row}")),
        );
    }
}
