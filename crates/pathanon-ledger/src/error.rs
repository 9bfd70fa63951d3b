use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    Io,
    Parse,
    UnsupportedFormat,
    MissingWorksheet,
}

impl LedgerError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "ledger file could not be read or written",
            Self::Parse => "ledger file could not be parsed",
            Self::UnsupportedFormat => "ledger file must be .xlsx or .csv",
            Self::MissingWorksheet => "ledger workbook has no worksheet",
        }
    }

    pub const fn reason_code(self) -> &'static str {
        match self {
            Self::UnsupportedFormat | Self::MissingWorksheet => "UNSUPPORTED_LEDGER",
            Self::Io | Self::Parse => "LEDGER_IO_ERROR",
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for LedgerError {}
