use core::fmt;

use pathanon_domain::RowError;
use pathanon_ledger::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Row(RowError),
    Ledger(LedgerError),
}

impl EngineError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Row(err) => err.reason_code(),
            Self::Ledger(err) => err.reason_code(),
        }
    }

    pub fn row(&self) -> Option<u32> {
        match self {
            Self::Row(err) => Some(err.row),
            Self::Ledger(_) => None,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(err) => err.fmt(f),
            Self::Ledger(err) => write!(f, "Error saving ledger: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<RowError> for EngineError {
    fn from(err: RowError) -> Self {
        Self::Row(err)
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}
