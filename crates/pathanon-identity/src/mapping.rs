use std::collections::BTreeMap;

use pathanon_domain::{AnonId, AnonIdFormat, CaseId, RowError, RowErrorKind};

/// Case ↔ AnonID assignments seen so far, rebuilt from the full ledger on
/// every run. The first row to pair a case with an AnonID wins; every later
/// row must agree with it in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    by_case: BTreeMap<CaseId, (AnonId, u32)>,
    by_anon: BTreeMap<AnonId, (CaseId, u32)>,
    high_water_mark: u64,
    format: Option<AnonIdFormat>,
}

impl IdentifierMap {
    pub fn new(format: Option<AnonIdFormat>) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn format(&self) -> Option<&AnonIdFormat> {
        self.format.as_ref()
    }

    pub fn high_water_mark(&self) -> u64 {
        self.high_water_mark
    }

    /// Checks an AnonID against the format and the running high-water mark,
    /// fixing the format from it if none is known yet. Returns its number.
    pub fn observe(&mut self, row: u32, anon_id: &AnonId) -> Result<u64, RowError> {
        if self.format.is_none() {
            let inferred = AnonIdFormat::infer(anon_id).ok_or_else(|| {
                RowError::new(
                    row,
                    RowErrorKind::AnonIdWithoutNumber {
                        anon_id: anon_id.clone(),
                    },
                )
            })?;
            self.format = Some(inferred);
        }
        let Some(format) = self.format.as_ref() else {
            return Err(RowError::new(row, RowErrorKind::NoIdFormat));
        };

        let number = format.parse_number(anon_id).ok_or_else(|| {
            RowError::new(
                row,
                RowErrorKind::MalformedAnonId {
                    anon_id: anon_id.clone(),
                    format: format.clone(),
                },
            )
        })?;
        if number < self.high_water_mark {
            return Err(RowError::new(
                row,
                RowErrorKind::AnonIdDecreased {
                    number,
                    high_water_mark: self.high_water_mark,
                },
            ));
        }
        self.high_water_mark = number;
        Ok(number)
    }

    pub fn bind(&mut self, row: u32, case_id: &CaseId, anon_id: &AnonId) -> Result<(), RowError> {
        if let Some((other_case, other_row)) = self.by_anon.get(anon_id)
            && other_case != case_id
        {
            return Err(RowError::new(
                row,
                RowErrorKind::AnonIdTaken {
                    case_id: case_id.clone(),
                    anon_id: anon_id.clone(),
                    other_case: other_case.clone(),
                    other_row: *other_row,
                },
            ));
        }
        if let Some((other_anon, other_row)) = self.by_case.get(case_id)
            && other_anon != anon_id
        {
            return Err(RowError::new(
                row,
                RowErrorKind::CaseAlreadyMapped {
                    case_id: case_id.clone(),
                    anon_id: anon_id.clone(),
                    other_anon_id: other_anon.clone(),
                    other_row: *other_row,
                },
            ));
        }

        self.by_anon
            .entry(anon_id.clone())
            .or_insert_with(|| (case_id.clone(), row));
        self.by_case
            .entry(case_id.clone())
            .or_insert_with(|| (anon_id.clone(), row));
        Ok(())
    }

    pub fn anon_for(&self, case_id: &CaseId) -> Option<&AnonId> {
        self.by_case.get(case_id).map(|(anon, _)| anon)
    }

    pub fn case_for(&self, anon_id: &AnonId) -> Option<&CaseId> {
        self.by_anon.get(anon_id).map(|(case, _)| case)
    }

    pub fn len(&self) -> usize {
        self.by_case.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_case.is_empty()
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&CaseId, &AnonId)> {
        self.by_case.iter().map(|(case, (anon, _))| (case, anon))
    }
}
