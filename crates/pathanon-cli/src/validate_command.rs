use super::*;

use pathanon_domain::RowError;
use pathanon_identity::{ValidatedLedger, validate_ledger};

pub(super) fn cmd_validate(exe: &str, args: &[String]) -> ExitCode {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_validate_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_validate_args(args) {
        Ok(v) => v,
        Err(msg) => return exit_usage(exe, &msg, print_validate_help),
    };
    if let Err(msg) = parsed.ledger.validate() {
        return exit_usage(exe, &msg, print_validate_help);
    }
    let schema = match parsed.ledger.load_schema() {
        Ok(s) => s,
        Err(msg) => return exit_usage(exe, &msg, print_validate_help),
    };

    let ledger_path = match parsed.ledger.ledger_path() {
        Ok(p) => p,
        Err(msg) => return exit_usage(exe, &msg, print_validate_help),
    };
    let ledger_label = path_label(ledger_path);
    let schema_name = schema.name.clone();
    let log_ctx = LogContext::new(&ledger_label, &schema_name);

    let validated = match load_validated(&parsed.ledger, schema, log_ctx) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let format = validated
        .format()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    println!("Ledger OK: {}", ledger_path.display());
    println!("  done rows:        {}", validated.done_rows);
    println!("  ignored rows:     {}", validated.ignored_rows);
    println!("  pending cases:    {}", validated.pending_cases);
    println!("  new ids needed:   {}", validated.unallocated_cases);
    println!("  AnonID format:    {format}");

    log_info(
        log_ctx,
        "ledger_validated",
        Some(BTreeMap::from([
            ("done_rows", validated.done_rows as u64),
            ("ignored_rows", validated.ignored_rows as u64),
            ("pending_cases", validated.pending_cases as u64),
            ("unallocated_cases", validated.unallocated_cases as u64),
        ])),
    );
    ExitCode::from(EXIT_OK)
}

/// Opens the ledger read-only and runs the header check and validator
/// pre-pass. Failures are printed and logged before returning the exit code.
pub(super) fn load_validated(
    args: &LedgerArgs,
    schema: LedgerSchema,
    log_ctx: LogContext<'_>,
) -> Result<ValidatedLedger, ExitCode> {
    let path = args.ledger_path().map_err(|msg| {
        log_error(log_ctx, "ledger_missing", "USAGE", Some(&msg));
        ExitCode::from(EXIT_USAGE)
    })?;
    let format_override = args.id_format().map_err(|msg| {
        log_error(log_ctx, "invalid_id_format", "USAGE", Some(&msg));
        ExitCode::from(EXIT_USAGE)
    })?;
    let ledger = open_ledger(path, schema, log_ctx)?;

    let validated = ledger.check_headers().and_then(|()| {
        let format = match format_override {
            Some(format) => Some(format),
            None => ledger.read_id_format()?,
        };
        validate_ledger(&ledger.read(), format)
    });
    validated.map_err(|err| report_row_error(&err, log_ctx))
}

fn report_row_error(err: &RowError, log_ctx: LogContext<'_>) -> ExitCode {
    let message = err.to_string();
    log_error(log_ctx, "validation_failed", err.reason_code(), Some(&message));
    eprintln!("{message}");
    ExitCode::from(EXIT_FATAL)
}
