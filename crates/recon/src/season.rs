use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::SeasonId;

/// Read-only season lookup by start year.
pub trait SeasonLookup {
    fn season_id(&self, start_year: i32) -> Option<SeasonId>;
}

#[derive(Debug, Clone, Default)]
pub struct SeasonTable {
    by_year: BTreeMap<i32, SeasonId>,
}

impl SeasonTable {
    /// Build from (id, start year) rows. Two rows for one year is a malformed table.
    pub fn from_rows<I>(rows: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (SeasonId, i32)>,
    {
        let mut by_year = BTreeMap::new();
        for (id, year) in rows {
            if by_year.insert(year, id).is_some() {
                return Err(ReconError::DuplicateSeason { year });
            }
        }
        Ok(Self { by_year })
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

impl SeasonLookup for SeasonTable {
    fn season_id(&self, start_year: i32) -> Option<SeasonId> {
        self.by_year.get(&start_year).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_year_lookup() {
        let table = SeasonTable::from_rows(vec![(SeasonId(1), 2020), (SeasonId(2), 2021)]).unwrap();
        assert_eq!(table.season_id(2021), Some(SeasonId(2)));
        assert_eq!(table.season_id(2022), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_year_rejected() {
        let err = SeasonTable::from_rows(vec![(SeasonId(1), 2021), (SeasonId(5), 2021)]).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateSeason { year: 2021 }));
    }
}
