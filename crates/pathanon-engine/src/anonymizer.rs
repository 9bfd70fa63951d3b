use core::fmt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pathanon_domain::{Barcode, RowErrorKind};

pub const DEFAULT_ANONYMIZER: &str = "anonymize_wsi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationStyle {
    /// `<tool> -o <outdir> -bv <barcode> <source>`
    #[default]
    OutputFlag,
    /// `<tool> -bv <barcode> <source>`; the tool writes `<barcode>_anon.<ext>`
    /// next to the source and the result is moved into the output directory.
    MoveOutput,
}

impl InvocationStyle {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "output-flag" => Some(Self::OutputFlag),
            "move-output" => Some(Self::MoveOutput),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutputFlag => "output-flag",
            Self::MoveOutput => "move-output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnonymizerError {
    Failed { command: String },
    OutputMissing { expected: PathBuf },
    /// The output was copied out but the tool's copy beside the slide is still there.
    OutputNotRemoved { path: PathBuf },
}

impl AnonymizerError {
    pub fn into_row_kind(self) -> RowErrorKind {
        match self {
            Self::Failed { command } => RowErrorKind::AnonymizerFailed { command },
            Self::OutputMissing { expected } => RowErrorKind::AnonymizerOutputMissing {
                expected: expected.display().to_string(),
            },
            Self::OutputNotRemoved { path } => RowErrorKind::AnonymizerOutputNotRemoved {
                path: path.display().to_string(),
            },
        }
    }
}

impl fmt::Display for AnonymizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { command } => write!(f, "anonymizer failed: {command}"),
            Self::OutputMissing { expected } => {
                write!(f, "anonymizer output missing: {}", expected.display())
            }
            Self::OutputNotRemoved { path } => {
                write!(f, "anonymizer output not removed: {}", path.display())
            }
        }
    }
}

/// Produces one anonymized copy of a slide in `out_dir`, labelled with
/// `barcode`.
pub trait Anonymizer {
    fn anonymize(
        &mut self,
        source: &Path,
        barcode: &Barcode,
        out_dir: &Path,
    ) -> Result<(), AnonymizerError>;
}

/// Runs an external anonymization program once per slide and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessAnonymizer {
    program: OsString,
    style: InvocationStyle,
}

impl ProcessAnonymizer {
    pub fn new(program: impl Into<OsString>, style: InvocationStyle) -> Self {
        Self {
            program: program.into(),
            style,
        }
    }

    pub fn style(&self) -> InvocationStyle {
        self.style
    }

    pub fn args(&self, source: &Path, barcode: &Barcode, out_dir: &Path) -> Vec<OsString> {
        let mut args = Vec::with_capacity(5);
        if self.style == InvocationStyle::OutputFlag {
            args.push(OsString::from("-o"));
            args.push(out_dir.as_os_str().to_os_string());
        }
        args.push(OsString::from("-bv"));
        args.push(OsString::from(barcode.as_str()));
        args.push(source.as_os_str().to_os_string());
        args
    }

    /// Quoted command line as shown in error messages.
    pub fn render_command(&self, args: &[OsString]) -> String {
        std::iter::once(&self.program)
            .chain(args)
            .map(|a| format!("{:?}", a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Anonymizer for ProcessAnonymizer {
    fn anonymize(
        &mut self,
        source: &Path,
        barcode: &Barcode,
        out_dir: &Path,
    ) -> Result<(), AnonymizerError> {
        let args = self.args(source, barcode, out_dir);
        let failed = || AnonymizerError::Failed {
            command: self.render_command(&args),
        };

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|_| failed())?;
        if !status.success() {
            return Err(failed());
        }

        match self.style {
            InvocationStyle::OutputFlag => Ok(()),
            InvocationStyle::MoveOutput => move_output(source, barcode, out_dir),
        }
    }
}

fn move_output(source: &Path, barcode: &Barcode, out_dir: &Path) -> Result<(), AnonymizerError> {
    let file_name = match source.extension() {
        Some(ext) => format!("{}_anon.{}", barcode.as_str(), ext.to_string_lossy()),
        None => format!("{}_anon", barcode.as_str()),
    };
    let produced = source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&file_name);
    if !produced.is_file() {
        return Err(AnonymizerError::OutputMissing { expected: produced });
    }

    let dest = out_dir.join(&file_name);
    if std::fs::rename(&produced, &dest).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems; fall back to copy + remove
    std::fs::copy(&produced, &dest).map_err(|_| AnonymizerError::OutputMissing {
        expected: dest.clone(),
    })?;
    std::fs::remove_file(&produced)
        .map_err(|_| AnonymizerError::OutputNotRemoved { path: produced })
}
