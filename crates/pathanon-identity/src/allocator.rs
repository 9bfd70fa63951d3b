use pathanon_domain::{AnonId, CaseId, RowError, RowErrorKind};

use crate::IdentifierMap;

/// Hands out AnonIDs for cases that have none, continuing from the
/// high-water mark of the validated ledger.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    map: IdentifierMap,
    issued: Vec<(CaseId, AnonId)>,
}

impl IdentifierAllocator {
    pub fn new(map: IdentifierMap) -> Self {
        Self {
            map,
            issued: Vec::new(),
        }
    }

    pub fn map(&self) -> &IdentifierMap {
        &self.map
    }

    pub fn into_map(self) -> IdentifierMap {
        self.map
    }

    /// AnonIDs created by this allocator, in the order they were issued.
    pub fn issued(&self) -> &[(CaseId, AnonId)] {
        &self.issued
    }

    pub fn allocate(&mut self, row: u32, case_id: &CaseId) -> Result<AnonId, RowError> {
        if let Some(existing) = self.map.anon_for(case_id) {
            return Ok(existing.clone());
        }

        let format = self
            .map
            .format()
            .cloned()
            .ok_or_else(|| RowError::new(row, RowErrorKind::NoIdFormat))?;
        let next = self.map.high_water_mark().saturating_add(1);
        let anon_id = format.format(next).ok_or_else(|| {
            RowError::new(
                row,
                RowErrorKind::AnonIdSpaceExhausted {
                    format: format.clone(),
                },
            )
        })?;

        self.map.observe(row, &anon_id)?;
        self.map.bind(row, case_id, &anon_id)?;
        self.issued.push((case_id.clone(), anon_id.clone()));
        Ok(anon_id)
    }
}
