use crate::error::ReconError;
use crate::model::{Observation, ObservationRef, ResolvedObservation, Side};
use crate::resolver::TeamLookup;
use crate::season::SeasonLookup;

/// Attach team and season ids to one observation.
///
/// Unknown teams are carried as `None`; a missing season is fatal.
pub fn normalize<T, S>(
    id: ObservationRef,
    observation: Observation,
    teams: &T,
    seasons: &S,
) -> Result<ResolvedObservation, ReconError>
where
    T: TeamLookup + ?Sized,
    S: SeasonLookup + ?Sized,
{
    let season_id = seasons
        .season_id(observation.season)
        .ok_or(ReconError::SeasonNotFound { year: observation.season })?;

    let home_team = teams.resolve(&observation.source, &observation.home_name).team();
    let away_team = teams.resolve(&observation.source, &observation.away_name).team();

    Ok(ResolvedObservation {
        id,
        observation,
        home_team,
        away_team,
        season_id,
    })
}

/// Normalize a whole batch for one side, numbering observations in input order.
pub fn normalize_batch<T, S>(
    side: Side,
    observations: Vec<Observation>,
    teams: &T,
    seasons: &S,
) -> Result<Vec<ResolvedObservation>, ReconError>
where
    T: TeamLookup + ?Sized,
    S: SeasonLookup + ?Sized,
{
    observations
        .into_iter()
        .enumerate()
        .map(|(index, obs)| normalize(ObservationRef { side, index }, obs, teams, seasons))
        .collect()
}

/// Retry resolution for observations with a missing team, after new
/// source names were added. Resolved fields are never touched.
/// Returns how many observations became fully resolved.
pub fn re_resolve<T>(batch: &mut [ResolvedObservation], teams: &T) -> usize
where
    T: TeamLookup + ?Sized,
{
    let mut newly_resolved = 0;
    for obs in batch.iter_mut().filter(|o| !o.is_resolved()) {
        let o = &obs.observation;
        if obs.home_team.is_none() {
            obs.home_team = teams.resolve(&o.source, &o.home_name).team();
        }
        if obs.away_team.is_none() {
            obs.away_team = teams.resolve(&o.source, &o.away_name).team();
        }
        if obs.is_resolved() {
            newly_resolved += 1;
        }
    }
    newly_resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SeasonId, SourceNameEntry, TeamId};
    use crate::resolver::SourceNameTable;
    use crate::season::SeasonTable;
    use chrono::NaiveDate;

    fn obs(season: i32, home: &str, away: &str) -> Observation {
        Observation {
            source: "ncaa.org".into(),
            season,
            date: NaiveDate::from_ymd_opt(2021, 9, 4).unwrap(),
            home_name: home.into(),
            away_name: away.into(),
            home_points: Some(21),
            away_points: Some(14),
            neutral_site: Some(false),
            overtimes: None,
            comment: None,
        }
    }

    fn names(rows: &[(&str, i64)]) -> SourceNameTable {
        SourceNameTable::from_entries(rows.iter().map(|(name, team)| SourceNameEntry {
            source: "ncaa.org".into(),
            name: (*name).into(),
            team: TeamId(*team),
        }))
        .unwrap()
    }

    fn seasons() -> SeasonTable {
        SeasonTable::from_rows(vec![(SeasonId(11), 2021)]).unwrap()
    }

    #[test]
    fn attaches_ids() {
        let teams = names(&[("Georgia", 1), ("Clemson", 2)]);
        let batch = normalize_batch(Side::Right, vec![obs(2021, "Clemson", "Georgia")], &teams, &seasons()).unwrap();
        assert_eq!(batch[0].home_team, Some(TeamId(2)));
        assert_eq!(batch[0].away_team, Some(TeamId(1)));
        assert_eq!(batch[0].season_id, SeasonId(11));
        assert_eq!(batch[0].id, ObservationRef { side: Side::Right, index: 0 });
    }

    #[test]
    fn unknown_team_is_not_an_error() {
        let teams = names(&[("Georgia", 1)]);
        let batch = normalize_batch(Side::Right, vec![obs(2021, "St. Johns", "Georgia")], &teams, &seasons()).unwrap();
        assert_eq!(batch[0].home_team, None);
        assert_eq!(batch[0].away_team, Some(TeamId(1)));
        assert!(!batch[0].is_resolved());
    }

    #[test]
    fn missing_season_is_fatal() {
        let teams = names(&[("Georgia", 1), ("Clemson", 2)]);
        let err = normalize_batch(
            Side::Left,
            vec![obs(2021, "Clemson", "Georgia"), obs(1999, "Clemson", "Georgia")],
            &teams,
            &seasons(),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::SeasonNotFound { year: 1999 }));
    }

    #[test]
    fn re_resolve_fills_only_missing_teams() {
        let mut teams = names(&[("Georgia", 1), ("Clemson", 2)]);
        let mut batch = normalize_batch(
            Side::Right,
            vec![obs(2021, "Clemson", "Georgia"), obs(2021, "St. Johns", "Georgia")],
            &teams,
            &seasons(),
        )
        .unwrap();
        let before = batch[0].clone();

        teams
            .insert(SourceNameEntry {
                source: "ncaa.org".into(),
                name: "St. Johns".into(),
                team: TeamId(40),
            })
            .unwrap();

        assert_eq!(re_resolve(&mut batch, &teams), 1);
        assert_eq!(batch[0], before);
        assert_eq!(batch[1].home_team, Some(TeamId(40)));
        // Second pass has nothing left to do.
        assert_eq!(re_resolve(&mut batch, &teams), 0);
    }
}
