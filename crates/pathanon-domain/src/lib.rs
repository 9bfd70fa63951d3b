pub mod error;
pub mod ids;
pub mod record;
pub mod schema;
pub mod slide;
pub mod status;

pub use error::{RowError, RowErrorKind};
pub use ids::{AnonId, AnonIdFormat, Barcode, CaseId, case_basename, is_archive_ref};
pub use record::{CaseGroup, LedgerRow, LedgerRows};
pub use schema::{
    AIDA_V1, CellRef, ColumnLayout, HeaderCheck, IdFormatSource, LedgerSchema,
    SCHEMA_JSON_VERSION, SchemaError, column_letters, parse_column,
};
pub use slide::{SlideRecord, split_slide_dir_name};
pub use status::{CaseState, RowStatus, StatusCell};
