//! Source-name resolution: (data source, raw name) → canonical team.
//!
//! Exact lookup only. A name that is not in the table is reported as
//! [`Resolution::Unknown`], never guessed.

use std::collections::{BTreeMap, HashMap};

use crate::error::ReconError;
use crate::model::{DataSource, ObservationRef, ResolvedObservation, SourceNameEntry, TeamId, UnknownName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Team(TeamId),
    Unknown,
}

impl Resolution {
    pub fn team(self) -> Option<TeamId> {
        match self {
            Self::Team(id) => Some(id),
            Self::Unknown => None,
        }
    }
}

/// Read-only team lookup. Implemented by the in-memory snapshot below;
/// anything that can answer the same question may stand in for it.
pub trait TeamLookup {
    fn resolve(&self, source: &DataSource, raw_name: &str) -> Resolution;
}

#[derive(Debug, Clone, Default)]
pub struct SourceNameTable {
    names: HashMap<DataSource, HashMap<String, TeamId>>,
}

impl SourceNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from reference rows. A (source, name) listed twice is a
    /// malformed table, even when both rows agree.
    pub fn from_entries<I>(entries: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = SourceNameEntry>,
    {
        let mut table = Self::new();
        for entry in entries {
            let by_name = table.names.entry(entry.source.clone()).or_default();
            if by_name.contains_key(&entry.name) {
                return Err(ReconError::DuplicateSourceName {
                    source: entry.source.to_string(),
                    name: entry.name,
                });
            }
            by_name.insert(entry.name, entry.team);
        }
        Ok(table)
    }

    /// Add a mapping. Returns `Ok(false)` if the identical mapping already exists.
    pub fn insert(&mut self, entry: SourceNameEntry) -> Result<bool, ReconError> {
        let by_name = self.names.entry(entry.source.clone()).or_default();
        match by_name.get(&entry.name) {
            Some(&existing) if existing == entry.team => Ok(false),
            Some(&existing) => Err(ReconError::ConflictingSourceName {
                source: entry.source.to_string(),
                name: entry.name,
                existing: existing.0,
                requested: entry.team.0,
            }),
            None => {
                by_name.insert(entry.name, entry.team);
                Ok(true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TeamLookup for SourceNameTable {
    fn resolve(&self, source: &DataSource, raw_name: &str) -> Resolution {
        self.names
            .get(source)
            .and_then(|by_name| by_name.get(raw_name))
            .map_or(Resolution::Unknown, |&id| Resolution::Team(id))
    }
}

/// Group every unresolved raw name in a batch, so the whole list can be
/// shown at once. Ordered by (source, name); observation refs in input order.
pub fn collect_unknown_names<'a, I>(observations: I) -> Vec<UnknownName>
where
    I: IntoIterator<Item = &'a ResolvedObservation>,
{
    let mut grouped: BTreeMap<(DataSource, String), Vec<ObservationRef>> = BTreeMap::new();

    for obs in observations {
        let o = &obs.observation;
        let mut push = |name: &str| {
            let refs = grouped.entry((o.source.clone(), name.to_string())).or_default();
            if refs.last() != Some(&obs.id) {
                refs.push(obs.id);
            }
        };
        if obs.home_team.is_none() {
            push(&o.home_name);
        }
        if obs.away_team.is_none() {
            push(&o.away_name);
        }
    }

    grouped
        .into_iter()
        .map(|((source, raw_name), observations)| UnknownName {
            source,
            raw_name,
            observations,
        })
        .collect()
}
