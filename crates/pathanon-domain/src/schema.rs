use core::fmt;
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

pub const SCHEMA_JSON_VERSION: &str = "ledger-schema.v1";
pub const AIDA_V1: &str = "aida.v1";

const AIDA_TITLE: &str = "AIDA Pathology Anonymization Sheet";
const DEFAULT_SLIDE_EXTENSIONS: [&str; 2] = [".svs", ".ndpi"];

/// One-based spreadsheet coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub column: u32,
}

impl CellRef {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Parses A1-style references such as `D12` or `AA3`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let split = raw.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = raw.split_at(split);
        let column = parse_column(letters)?;
        if digits.starts_with('0') {
            return None;
        }
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0)?;
        Some(Self { row, column })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

pub fn parse_column(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut column = 0_u32;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        column = column * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1);
    }
    Some(column)
}

pub fn column_letters(mut column: u32) -> String {
    let mut out = Vec::<u8>::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        out.push(b'A' + rem);
        column = (column - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCheck {
    pub cell: CellRef,
    pub expected: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub status: u32,
    pub case: u32,
    pub orig_file: u32,
    pub anon_id: u32,
    pub block: u32,
    pub stain: u32,
}

impl ColumnLayout {
    pub const fn roles(&self) -> [u32; 6] {
        [
            self.status,
            self.case,
            self.orig_file,
            self.anon_id,
            self.block,
            self.stain,
        ]
    }

    pub fn is_role(&self, column: u32) -> bool {
        self.roles().contains(&column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFormatSource {
    /// Prefix and digit width come from the first AnonID in the ledger.
    Inferred,
    /// Prefix and digit width are stored in fixed cells above the header.
    Cells { prefix: CellRef, digits: CellRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSchema {
    pub name: String,
    pub header_checks: Vec<HeaderCheck>,
    pub data_start_row: u32,
    pub columns: ColumnLayout,
    pub id_format: IdFormatSource,
    pub slide_extensions: Vec<String>,
}

impl LedgerSchema {
    pub fn aida_v1() -> Self {
        let header = |row: u32, column: u32, expected: &str| HeaderCheck {
            cell: CellRef::new(row, column),
            expected: expected.to_string(),
        };
        Self {
            name: AIDA_V1.to_string(),
            header_checks: vec![
                header(1, 4, AIDA_TITLE),
                header(12, 1, "Status"),
                header(12, 2, "Case"),
                header(12, 3, "OrigFile"),
                header(12, 4, "AnonID"),
                header(12, 5, "Block"),
                header(12, 6, "Stain"),
            ],
            data_start_row: 13,
            columns: ColumnLayout {
                status: 1,
                case: 2,
                orig_file: 3,
                anon_id: 4,
                block: 5,
                stain: 6,
            },
            id_format: IdFormatSource::Inferred,
            slide_extensions: DEFAULT_SLIDE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, SchemaError> {
        let bytes = std::fs::read(path).map_err(|_| SchemaError::Io)?;
        Self::from_json(&bytes)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, SchemaError> {
        let raw: SchemaJson = serde_json::from_slice(bytes).map_err(|_| SchemaError::Json)?;
        if raw.schema_version != SCHEMA_JSON_VERSION {
            return Err(SchemaError::UnsupportedVersion);
        }

        let mut header_checks = Vec::with_capacity(raw.headers.len());
        for (cell, expected) in raw.headers {
            let cell = CellRef::parse(&cell).ok_or(SchemaError::InvalidCell(cell))?;
            header_checks.push(HeaderCheck { cell, expected });
        }
        header_checks.sort_by_key(|h| (h.cell.row, h.cell.column));

        let column = |letters: &str| -> Result<u32, SchemaError> {
            parse_column(letters).ok_or_else(|| SchemaError::InvalidColumn(letters.to_string()))
        };
        let columns = ColumnLayout {
            status: column(&raw.columns.status)?,
            case: column(&raw.columns.case)?,
            orig_file: column(&raw.columns.orig_file)?,
            anon_id: column(&raw.columns.anon_id)?,
            block: column(&raw.columns.block)?,
            stain: column(&raw.columns.stain)?,
        };
        let mut roles = columns.roles().to_vec();
        roles.sort_unstable();
        roles.dedup();
        if roles.len() != columns.roles().len() {
            return Err(SchemaError::DuplicateColumn);
        }

        let last_header_row = header_checks.iter().map(|h| h.cell.row).max().unwrap_or(0);
        if raw.data_start_row == 0 || raw.data_start_row <= last_header_row {
            return Err(SchemaError::InvalidDataStartRow);
        }

        let id_format = match raw.id_format {
            None => IdFormatSource::Inferred,
            Some(cells) => IdFormatSource::Cells {
                prefix: CellRef::parse(&cells.prefix_cell)
                    .ok_or(SchemaError::InvalidCell(cells.prefix_cell.clone()))?,
                digits: CellRef::parse(&cells.digits_cell)
                    .ok_or(SchemaError::InvalidCell(cells.digits_cell.clone()))?,
            },
        };

        let slide_extensions = match raw.slide_extensions {
            Some(exts) if exts.is_empty() => return Err(SchemaError::NoSlideExtensions),
            Some(exts) => exts
                .into_iter()
                .map(|e| {
                    let e = e.trim().to_ascii_lowercase();
                    if e.starts_with('.') { e } else { format!(".{e}") }
                })
                .collect(),
            None => DEFAULT_SLIDE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(Self {
            name: raw.name,
            header_checks,
            data_start_row: raw.data_start_row,
            columns,
            id_format,
            slide_extensions,
        })
    }

    pub fn is_slide_file(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.slide_extensions
            .iter()
            .any(|ext| lower.len() > ext.len() && lower.ends_with(ext.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    Io,
    Json,
    UnsupportedVersion,
    InvalidCell(String),
    InvalidColumn(String),
    DuplicateColumn,
    InvalidDataStartRow,
    NoSlideExtensions,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => f.write_str("schema file is unreadable"),
            Self::Json => f.write_str("schema file is not valid schema JSON"),
            Self::UnsupportedVersion => {
                write!(f, "schema_version must be {SCHEMA_JSON_VERSION:?}")
            }
            Self::InvalidCell(c) => write!(f, "invalid cell reference {c:?}"),
            Self::InvalidColumn(c) => write!(f, "invalid column {c:?}"),
            Self::DuplicateColumn => f.write_str("two column roles share one column"),
            Self::InvalidDataStartRow => {
                f.write_str("data_start_row must come after every header cell")
            }
            Self::NoSlideExtensions => f.write_str("slide_extensions must not be empty"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaJson {
    schema_version: String,
    name: String,
    headers: BTreeMap<String, String>,
    data_start_row: u32,
    columns: ColumnsJson,
    #[serde(default)]
    id_format: Option<IdFormatCellsJson>,
    #[serde(default)]
    slide_extensions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnsJson {
    status: String,
    case: String,
    orig_file: String,
    anon_id: String,
    block: String,
    stain: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdFormatCellsJson {
    prefix_cell: String,
    digits_cell: String,
}
