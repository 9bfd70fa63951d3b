use super::*;

use std::collections::BTreeSet;

use pathanon_engine::detect_garbage;

use crate::validate_command::load_validated;

pub(super) fn cmd_garbage(exe: &str, args: &[String]) -> ExitCode {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_garbage_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_garbage_args(args) {
        Ok(v) => v,
        Err(msg) => return exit_usage(exe, &msg, print_garbage_help),
    };
    if let Err(msg) = parsed.ledger.validate() {
        return exit_usage(exe, &msg, print_garbage_help);
    }
    let schema = match parsed.ledger.load_schema() {
        Ok(s) => s,
        Err(msg) => return exit_usage(exe, &msg, print_garbage_help),
    };
    let ledger_path = match parsed.ledger.ledger_path() {
        Ok(p) => p,
        Err(msg) => return exit_usage(exe, &msg, print_garbage_help),
    };
    let anondir = parsed
        .anondir
        .clone()
        .unwrap_or_else(|| beside_ledger(ledger_path, "_anon"));

    let ledger_label = path_label(ledger_path);
    let schema_name = schema.name.clone();
    let log_ctx = LogContext::new(&ledger_label, &schema_name);

    let validated = match load_validated(&parsed.ledger, schema, log_ctx) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let known = validated.barcodes.into_keys().collect::<BTreeSet<_>>();

    match detect_garbage(&anondir, &known) {
        Ok(garbage) => {
            report_garbage(log_ctx, &garbage);
            if garbage.is_empty() {
                println!("No garbage in {}", anondir.display());
            }
            ExitCode::from(EXIT_OK)
        }
        Err(err) => {
            let detail = err.kind().to_string();
            log_error(log_ctx, "garbage_scan_failed", "INTERNAL_ERROR", Some(&detail));
            eprintln!("error: could not list {}: {detail}", anondir.display());
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Lists orphaned output files; shared with `run`. Nothing is deleted.
pub(super) fn report_garbage(log_ctx: LogContext<'_>, garbage: &[String]) {
    if garbage.is_empty() {
        return;
    }
    log_warn(
        log_ctx,
        "garbage_found",
        "GARBAGE_FOUND",
        Some(&format!("{} file(s)", garbage.len())),
    );
    println!("Output directory contains files not referenced by the ledger:");
    for name in garbage {
        println!("  {name}");
    }
}
