use std::collections::BTreeMap;

use crate::model::{Bucket, Classification, ReportSummary};

/// Count a classification. `bucket_counts` counts observations, so its values
/// always add up to `total_observations`.
pub fn compute_summary(c: &Classification) -> ReportSummary {
    let multiply_matched_observations: usize =
        c.multiply_matched.iter().map(|g| g.observation_count()).sum();

    let mut bucket_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut count = |bucket: Bucket, n: usize| {
        *bucket_counts.entry(bucket.to_string()).or_insert(0) += n;
    };
    count(Bucket::Consistent, c.consistent.len() * 2);
    count(Bucket::Conflicting, c.conflicting.len() * 2);
    count(Bucket::MultiplyMatched, multiply_matched_observations);
    count(Bucket::UnmatchedLeft, c.unmatched_left.len());
    count(Bucket::UnmatchedRight, c.unmatched_right.len());
    count(Bucket::UnknownTeam, c.unknown_left.len() + c.unknown_right.len());

    ReportSummary {
        total_observations: bucket_counts.values().sum(),
        consistent: c.consistent.len(),
        conflicting: c.conflicting.len(),
        multiply_matched_groups: c.multiply_matched.len(),
        multiply_matched_observations,
        unmatched_left: c.unmatched_left.len(),
        unmatched_right: c.unmatched_right.len(),
        unknown_left: c.unknown_left.len(),
        unknown_right: c.unknown_right.len(),
        unknown_names: c.unknown_names.len(),
        bucket_counts,
    }
}

impl Classification {
    pub fn summary(&self) -> ReportSummary {
        compute_summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::matcher::match_observations;
    use crate::model::{Observation, ObservationRef, ResolvedObservation, SeasonId, Side, TeamId};
    use chrono::NaiveDate;

    fn ob(side: Side, index: usize, home: Option<i64>, away: i64, points: (u32, u32)) -> ResolvedObservation {
        ResolvedObservation {
            id: ObservationRef { side, index },
            observation: Observation {
                source: "espn.com".into(),
                season: 2021,
                date: NaiveDate::from_ymd_opt(2021, 9, 4).unwrap(),
                home_name: "Home".into(),
                away_name: "Away".into(),
                home_points: Some(points.0),
                away_points: Some(points.1),
                neutral_site: Some(false),
                overtimes: None,
                comment: None,
            },
            home_team: home.map(TeamId),
            away_team: Some(TeamId(away)),
            season_id: SeasonId(1),
        }
    }

    #[test]
    fn summary_counts() {
        let left = vec![
            ob(Side::Left, 0, Some(1), 2, (21, 14)),
            ob(Side::Left, 1, Some(3), 4, (7, 0)),
            ob(Side::Left, 2, Some(5), 6, (7, 0)),
            ob(Side::Left, 3, Some(5), 6, (7, 0)),
            ob(Side::Left, 4, None, 8, (3, 0)),
        ];
        let right = vec![
            ob(Side::Right, 0, Some(1), 2, (21, 14)),
            ob(Side::Right, 1, Some(3), 4, (7, 3)),
            ob(Side::Right, 2, Some(5), 6, (7, 0)),
            ob(Side::Right, 3, Some(9), 10, (1, 0)),
        ];
        let summary = compute_summary(&classify(&match_observations(&left, &right)));

        assert_eq!(summary.total_observations, 9);
        assert_eq!(summary.consistent, 1);
        assert_eq!(summary.conflicting, 1);
        assert_eq!(summary.multiply_matched_groups, 1);
        assert_eq!(summary.multiply_matched_observations, 3);
        assert_eq!(summary.unmatched_left, 0);
        assert_eq!(summary.unmatched_right, 1);
        assert_eq!(summary.unknown_left, 1);
        assert_eq!(summary.unknown_names, 1);
        assert_eq!(summary.bucket_counts["unknown_team"], 1);
        assert_eq!(summary.bucket_counts["consistent"], 2);
    }
}
