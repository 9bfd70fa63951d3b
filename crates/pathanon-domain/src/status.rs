use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    Done,
    Ignore,
}

impl RowStatus {
    /// Status cells are matched case-insensitively; a blank cell is pending.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            Some(Self::Pending)
        } else if raw.eq_ignore_ascii_case("done") {
            Some(Self::Done)
        } else if raw.eq_ignore_ascii_case("ignore") {
            Some(Self::Ignore)
        } else {
            None
        }
    }

    pub const fn ledger_text(self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Done => "Done",
            Self::Ignore => "Ignore",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
            Self::Ignore => "IGNORE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCell {
    Known(RowStatus),
    Unknown(String),
}

impl StatusCell {
    pub fn parse(raw: &str) -> Self {
        match RowStatus::parse(raw) {
            Some(status) => Self::Known(status),
            None => Self::Unknown(raw.trim().to_string()),
        }
    }

    pub fn known(&self) -> Option<RowStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Pending,
    Processing,
    Done,
    AlreadyDone,
    Ignored,
    Error,
}

impl CaseState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Done | Self::AlreadyDone | Self::Ignored | Self::Error
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Done => "DONE",
            Self::AlreadyDone => "ALREADY_DONE",
            Self::Ignored => "IGNORED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
