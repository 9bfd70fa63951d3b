use std::path::PathBuf;

use crate::{AnonId, Barcode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    pub block: String,
    pub stain: String,
    pub source_path: PathBuf,
    /// `BLOCK_STAIN/<file>` relative to the case root; this is what the ledger
    /// records as OrigFile.
    pub relative_path: String,
}

impl SlideRecord {
    pub fn barcode(&self, anon_id: &AnonId) -> Barcode {
        Barcode::new(anon_id, &self.block, &self.stain)
    }
}

/// Splits a slide directory name of the form `BLOCK_STAIN`.
pub fn split_slide_dir_name(name: &str) -> Option<(&str, &str)> {
    let (block, stain) = name.split_once('_')?;
    if block.is_empty() || stain.is_empty() {
        return None;
    }
    Some((block, stain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_dir_name_needs_both_halves() {
        assert_eq!(split_slide_dir_name("A_HE"), Some(("A", "HE")));
        assert_eq!(split_slide_dir_name("A1_HE_2"), Some(("A1", "HE_2")));
        assert_eq!(split_slide_dir_name("AHE"), None);
        assert_eq!(split_slide_dir_name("_HE"), None);
        assert_eq!(split_slide_dir_name("__MACOSX"), None);
    }
}
