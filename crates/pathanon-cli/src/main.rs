use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pathanon_domain::{AnonIdFormat, LedgerSchema};
use pathanon_engine::{DEFAULT_ANONYMIZER, InvocationStyle};
use pathanon_ledger::{Ledger, Sheet};

mod garbage_command;
mod logging;
mod run_command;
mod validate_command;

use logging::{LogContext, log_error, log_info, log_info_detail, log_warn};

const EXIT_OK: u8 = 0;
const EXIT_FATAL: u8 = 1;
const EXIT_USAGE: u8 = 3;

const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let mut args = std::env::args().collect::<Vec<String>>();
    let exe = args.first().cloned().unwrap_or_else(|| "pathanon".to_string());
    if !args.is_empty() {
        args.remove(0);
    }

    if args.first().is_some_and(|a| a == "--version") {
        println!("pathanon {TOOL_VERSION}");
        return ExitCode::from(EXIT_OK);
    }
    if args.is_empty() || args[0] == "-h" || args[0] == "--help" {
        print_root_help(&exe);
        return ExitCode::from(EXIT_OK);
    }

    match args[0].as_str() {
        "run" => run_command::cmd_run(&exe, &args[1..]),
        "validate" => validate_command::cmd_validate(&exe, &args[1..]),
        "garbage" => garbage_command::cmd_garbage(&exe, &args[1..]),
        _ => exit_usage(&exe, "unknown command", print_root_help),
    }
}

fn exit_usage(exe: &str, message: &str, help: fn(&str)) -> ExitCode {
    log_error(LogContext::unknown(), "usage_error", "USAGE", Some(message));
    eprintln!("error: {message}");
    eprintln!();
    help(exe);
    ExitCode::from(EXIT_USAGE)
}

/// Flags shared by every command that reads a ledger.
#[derive(Debug, Default)]
struct LedgerArgs {
    ledger: Option<PathBuf>,
    schema_json: Option<PathBuf>,
    prefix: Option<String>,
    digits: Option<usize>,
}

impl LedgerArgs {
    /// Consumes `args[*i]` (and its value) if it is a ledger flag.
    fn take_flag(&mut self, args: &[String], i: &mut usize) -> Result<bool, String> {
        match args[*i].as_str() {
            "--ledger" => {
                *i += 1;
                self.ledger = Some(require_value(args, *i, "--ledger")?);
            }
            "--schema-json" => {
                *i += 1;
                self.schema_json = Some(require_value(args, *i, "--schema-json")?);
            }
            "--prefix" => {
                *i += 1;
                self.prefix = Some(require_text(args, *i, "--prefix")?);
            }
            "--digits" => {
                *i += 1;
                let raw = require_text(args, *i, "--digits")?;
                let digits = raw
                    .parse::<usize>()
                    .map_err(|_| "--digits must be a positive integer".to_string())?;
                self.digits = Some(digits);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn ledger_path(&self) -> Result<&Path, String> {
        self.ledger
            .as_deref()
            .ok_or_else(|| "missing required flag: --ledger".to_string())
    }

    fn validate(&self) -> Result<(), String> {
        let ledger = self.ledger_path()?;
        ensure_file_exists(ledger, "ledger")?;
        let ext = ledger
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(ext.as_deref(), Some("xlsx" | "csv")) {
            return Err("ledger must be an .xlsx or .csv file".to_string());
        }
        if let Some(schema) = &self.schema_json {
            ensure_file_exists(schema, "schema-json")?;
        }
        self.id_format()?;
        Ok(())
    }

    fn id_format(&self) -> Result<Option<AnonIdFormat>, String> {
        match (&self.prefix, self.digits) {
            (None, None) => Ok(None),
            (Some(prefix), Some(digits)) => AnonIdFormat::new(prefix, digits)
                .map(Some)
                .ok_or_else(|| {
                    "--digits must be 1..=18 and --prefix must not end in a digit".to_string()
                }),
            _ => Err("--prefix and --digits must be given together".to_string()),
        }
    }

    fn load_schema(&self) -> Result<LedgerSchema, String> {
        match &self.schema_json {
            None => Ok(LedgerSchema::aida_v1()),
            Some(path) => {
                LedgerSchema::load_json(path).map_err(|err| format!("schema-json: {err}"))
            }
        }
    }
}

fn ledger_dir(ledger: &Path) -> PathBuf {
    match ledger.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<dir>/<stem><suffix>` beside the ledger file.
fn beside_ledger(ledger: &Path, suffix: &str) -> PathBuf {
    let stem = ledger
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    ledger_dir(ledger).join(format!("{stem}{suffix}"))
}

fn open_ledger(
    path: &Path,
    schema: LedgerSchema,
    log_ctx: LogContext<'_>,
) -> Result<Ledger<Box<dyn Sheet>>, ExitCode> {
    match pathanon_ledger::open_document(path) {
        Ok(sheet) => Ok(Ledger::new(sheet, schema)),
        Err(err) => {
            log_error(
                log_ctx,
                "ledger_open_failed",
                err.reason_code(),
                Some(err.as_str()),
            );
            eprintln!("error: {err}");
            Err(ExitCode::from(EXIT_FATAL))
        }
    }
}

fn path_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug)]
struct RunArgs {
    ledger: LedgerArgs,
    workdir: Option<PathBuf>,
    tmpdir: Option<PathBuf>,
    anondir: Option<PathBuf>,
    anonymizer: String,
    style: InvocationStyle,
    suppress_exitcode: bool,
}

fn parse_run_args(args: &[String]) -> Result<RunArgs, String> {
    let mut ledger = LedgerArgs::default();
    let mut workdir = None;
    let mut tmpdir = None;
    let mut anondir = None;
    let mut anonymizer = None;
    let mut style = InvocationStyle::default();
    let mut suppress_exitcode = false;

    let mut i = 0;
    while i < args.len() {
        if ledger.take_flag(args, &mut i)? {
            i += 1;
            continue;
        }
        let a = args[i].as_str();
        match a {
            "--workdir" => {
                i += 1;
                workdir = Some(require_value(args, i, "--workdir")?);
            }
            "--tmpdir" => {
                i += 1;
                tmpdir = Some(require_value(args, i, "--tmpdir")?);
            }
            "--anondir" => {
                i += 1;
                anondir = Some(require_value(args, i, "--anondir")?);
            }
            "--anonymizer" => {
                i += 1;
                anonymizer = Some(require_text(args, i, "--anonymizer")?);
            }
            "--anonymizer-style" => {
                i += 1;
                let raw = require_text(args, i, "--anonymizer-style")?;
                style = InvocationStyle::parse(&raw).ok_or_else(|| {
                    "--anonymizer-style must be 'output-flag' or 'move-output'".to_string()
                })?;
            }
            "--suppress-exitcode" | "-z" => {
                suppress_exitcode = true;
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown flag: {unknown}"));
            }
            other => {
                return Err(format!("unexpected argument: {other}"));
            }
        }
        i += 1;
    }

    ledger.ledger_path()?;
    Ok(RunArgs {
        ledger,
        workdir,
        tmpdir,
        anondir,
        anonymizer: anonymizer.unwrap_or_else(|| DEFAULT_ANONYMIZER.to_string()),
        style,
        suppress_exitcode,
    })
}

fn validate_run_args(args: &RunArgs) -> Result<(), String> {
    args.ledger.validate()?;
    if let Some(workdir) = &args.workdir {
        ensure_dir_exists(workdir, "workdir")?;
    }
    for (path, kind) in [(&args.tmpdir, "tmpdir"), (&args.anondir, "anondir")] {
        if let Some(path) = path
            && let Ok(meta) = std::fs::metadata(path)
            && !meta.is_dir()
        {
            return Err(format!("{kind} path must be a directory when it exists"));
        }
    }
    Ok(())
}

#[derive(Debug)]
struct ValidateArgs {
    ledger: LedgerArgs,
}

fn parse_validate_args(args: &[String]) -> Result<ValidateArgs, String> {
    let mut ledger = LedgerArgs::default();

    let mut i = 0;
    while i < args.len() {
        if !ledger.take_flag(args, &mut i)? {
            return Err(unexpected(&args[i]));
        }
        i += 1;
    }

    ledger.ledger_path()?;
    Ok(ValidateArgs { ledger })
}

#[derive(Debug)]
struct GarbageArgs {
    ledger: LedgerArgs,
    anondir: Option<PathBuf>,
}

fn parse_garbage_args(args: &[String]) -> Result<GarbageArgs, String> {
    let mut ledger = LedgerArgs::default();
    let mut anondir = None;

    let mut i = 0;
    while i < args.len() {
        if ledger.take_flag(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--anondir" => {
                i += 1;
                anondir = Some(require_value(args, i, "--anondir")?);
            }
            other => return Err(unexpected(other)),
        }
        i += 1;
    }

    ledger.ledger_path()?;
    Ok(GarbageArgs { ledger, anondir })
}

fn unexpected(arg: &str) -> String {
    if arg.starts_with('-') {
        format!("unknown flag: {arg}")
    } else {
        format!("unexpected argument: {arg}")
    }
}

fn require_value(args: &[String], i: usize, flag: &'static str) -> Result<PathBuf, String> {
    require_text(args, i, flag).map(PathBuf::from)
}

fn require_text(args: &[String], i: usize, flag: &'static str) -> Result<String, String> {
    let value = args
        .get(i)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    if value.starts_with("--") {
        return Err(format!("missing value for {flag}"));
    }
    Ok(value.clone())
}

fn ensure_dir_exists(path: &Path, kind: &str) -> Result<(), String> {
    let meta = std::fs::metadata(path)
        .map_err(|_| format!("{kind} path does not exist or is not accessible"))?;
    if !meta.is_dir() {
        return Err(format!("{kind} path must be a directory"));
    }
    Ok(())
}

fn ensure_file_exists(path: &Path, kind: &str) -> Result<(), String> {
    let meta = std::fs::metadata(path)
        .map_err(|_| format!("{kind} path does not exist or is not accessible"))?;
    if !meta.is_file() {
        return Err(format!("{kind} path must be a file"));
    }
    Ok(())
}

fn print_root_help(exe: &str) {
    println!("pathanon {TOOL_VERSION} (whole-slide image anonymization ledger)");
    println!("Research software not approved for clinical use.");
    println!();
    println!("USAGE:");
    println!("  {exe} <COMMAND> [FLAGS]");
    println!();
    println!("COMMANDS:");
    println!("  run        Anonymize every pending case in the ledger and update it in place");
    println!("  validate   Check the ledger without touching it or any slide");
    println!("  garbage    List files in the output directory the ledger does not account for");
    println!();
    println!("Run '{exe} <COMMAND> --help' for command-specific help.");
}

fn print_ledger_flags_help() {
    println!("  --schema-json <PATH>   Ledger layout descriptor (default: built-in aida.v1)");
    println!("  --prefix <P>           AnonID prefix for new ids (requires --digits)");
    println!("  --digits <N>           AnonID digit count for new ids (requires --prefix)");
}

fn print_run_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} run --ledger <PATH> [FLAGS]");
    println!();
    println!("REQUIRED:");
    println!("  --ledger <PATH>   Ledger spreadsheet (.xlsx or .csv); updated in place");
    println!();
    println!("OPTIONAL:");
    println!("  --workdir <DIR>        Where cases live (default: the ledger's directory)");
    println!("  --tmpdir <DIR>         Temporary files (default: <LEDGER>_tmp)");
    println!("  --anondir <DIR>        Anonymized slides (default: <LEDGER>_anon)");
    println!("  --anonymizer <PROGRAM> Anonymization tool (default: {DEFAULT_ANONYMIZER})");
    println!("  --anonymizer-style output-flag|move-output   Default: output-flag");
    print_ledger_flags_help();
    println!("  -z, --suppress-exitcode   Exit 0 even when the run fails");
}

fn print_validate_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} validate --ledger <PATH> [FLAGS]");
    println!();
    println!("REQUIRED:");
    println!("  --ledger <PATH>   Ledger spreadsheet (.xlsx or .csv); never modified");
    println!();
    println!("OPTIONAL:");
    print_ledger_flags_help();
}

fn print_garbage_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} garbage --ledger <PATH> [FLAGS]");
    println!();
    println!("REQUIRED:");
    println!("  --ledger <PATH>   Ledger spreadsheet (.xlsx or .csv); never modified");
    println!();
    println!("OPTIONAL:");
    println!("  --anondir <DIR>   Anonymized slides (default: <LEDGER>_anon)");
    print_ledger_flags_help();
}
