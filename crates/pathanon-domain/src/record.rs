use crate::{AnonId, Barcode, CaseId, RowStatus, StatusCell};

/// One data row as read from the ledger, with the case inherited from the
/// group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub row: u32,
    pub status: StatusCell,
    pub case_ref: String,
    pub case_id: Option<CaseId>,
    pub inherited_case: bool,
    pub orig_file: String,
    pub anon_id: Option<AnonId>,
    pub block: String,
    pub stain: String,
}

impl LedgerRow {
    pub fn status(&self) -> Option<RowStatus> {
        self.status.known()
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.status, StatusCell::Known(RowStatus::Pending))
            && self.case_ref.is_empty()
            && self.orig_file.is_empty()
            && self.anon_id.is_none()
            && self.block.is_empty()
            && self.stain.is_empty()
    }

    pub fn has_slide_data(&self) -> bool {
        !(self.orig_file.is_empty() && self.block.is_empty() && self.stain.is_empty())
    }

    pub fn barcode(&self) -> Option<Barcode> {
        let anon_id = self.anon_id.as_ref()?;
        if self.block.is_empty() || self.stain.is_empty() {
            return None;
        }
        Some(Barcode::new(anon_id, &self.block, &self.stain))
    }
}

/// Consecutive rows describing one case: a row naming the case followed by any
/// rows whose case cell was left blank (merged person cells).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseGroup {
    pub case_id: Option<CaseId>,
    pub rows: Vec<LedgerRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRows {
    pub groups: Vec<CaseGroup>,
}

impl LedgerRows {
    pub fn rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.groups.iter().flat_map(|g| g.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.rows.is_empty())
    }
}
