//! Load cached per-source scrape files into observations.

use chrono::NaiveDate;

use crate::config::ColumnMapping;
use crate::error::ReconError;
use crate::model::{DataSource, Observation};

/// Parse one source's CSV text. Required columns must be present in the
/// header; optional ones (neutral site, overtimes, comments) are read only
/// when their header exists. Empty cells mean "not reported".
pub fn load_csv_observations(
    source: &DataSource,
    season: i32,
    csv_data: &str,
    columns: &ColumnMapping,
) -> Result<Vec<Observation>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let idx = |name: &str| -> Result<usize, ReconError> {
        position(name).ok_or_else(|| ReconError::MissingColumn {
            source: source.to_string(),
            column: name.into(),
        })
    };

    let date_idx = idx(&columns.date)?;
    let home_idx = idx(&columns.home)?;
    let away_idx = idx(&columns.away)?;
    let home_points_idx = idx(&columns.home_points)?;
    let away_points_idx = idx(&columns.away_points)?;
    let neutral_idx = columns.neutral_site.as_deref().and_then(position);
    let overtimes_idx = columns.overtimes.as_deref().and_then(position);
    let comments_idx = columns.comments.as_deref().and_then(position);

    let mut observations = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        // 1-based, counting the header line.
        let row = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let opt_cell = |idx: Option<usize>| idx.map(cell).filter(|v| !v.is_empty());

        let date_str = cell(date_idx);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| ReconError::DateParse {
            source: source.to_string(),
            row,
            value: date_str.into(),
        })?;

        let value_err = |column: &str, value: &str| ReconError::ValueParse {
            source: source.to_string(),
            row,
            column: column.into(),
            value: value.into(),
        };

        let home_points = opt_cell(Some(home_points_idx))
            .map(|v| parse_count(v).ok_or_else(|| value_err(&columns.home_points, v)))
            .transpose()?;
        let away_points = opt_cell(Some(away_points_idx))
            .map(|v| parse_count(v).ok_or_else(|| value_err(&columns.away_points, v)))
            .transpose()?;
        let overtimes = opt_cell(overtimes_idx)
            .map(|v| parse_count(v).ok_or_else(|| value_err("overtimes", v)))
            .transpose()?;
        let neutral_site = opt_cell(neutral_idx)
            .map(|v| parse_flag(v).ok_or_else(|| value_err("neutral site", v)))
            .transpose()?;

        observations.push(Observation {
            source: source.clone(),
            season,
            date,
            home_name: cell(home_idx).to_string(),
            away_name: cell(away_idx).to_string(),
            home_points,
            away_points,
            neutral_site,
            overtimes,
            comment: opt_cell(comments_idx).map(String::from),
        });
    }

    log::debug!("{source}: loaded {} observations", observations.len());
    Ok(observations)
}

/// Non-negative integer. Cached frames written by dataframe tools store
/// nullable integer columns as floats, so `21.0` is accepted.
fn parse_count(value: &str) -> Option<u32> {
    if let Ok(n) = value.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = value.parse().ok()?;
    if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) {
        Some(f as u32)
    } else {
        None
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espn() -> DataSource {
        DataSource::ESPN.into()
    }

    #[test]
    fn load_basic() {
        let csv = "\
Date,Home,Away,HomePoints,AwayPoints,NeutralSite,Overtimes,Comments
2021-09-04,Alabama,Miami (FL),44,13,1,0,Chick-fil-A Kickoff
2021-09-04,Georgia,Clemson,10,3,,,
";
        let obs = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].home_name, "Alabama");
        assert_eq!(obs[0].away_name, "Miami (FL)");
        assert_eq!(obs[0].home_points, Some(44));
        assert_eq!(obs[0].neutral_site, Some(true));
        assert_eq!(obs[0].overtimes, Some(0));
        assert_eq!(obs[0].comment.as_deref(), Some("Chick-fil-A Kickoff"));
        assert_eq!(obs[1].neutral_site, None);
        assert_eq!(obs[1].overtimes, None);
        assert_eq!(obs[1].comment, None);
        assert_eq!(obs[1].season, 2021);
    }

    #[test]
    fn empty_scores_are_not_final() {
        let csv = "Date,Home,Away,HomePoints,AwayPoints\n2021-11-27,Auburn,Alabama,,\n";
        let obs = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap();
        assert_eq!(obs[0].home_points, None);
        assert_eq!(obs[0].away_points, None);
        // Optional columns absent from the header.
        assert_eq!(obs[0].neutral_site, None);
    }

    #[test]
    fn float_points_accepted() {
        let csv = "Date,Home,Away,HomePoints,AwayPoints,Overtimes\n2021-09-04,A,B,21.0,14.0,2.0\n";
        let obs = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap();
        assert_eq!(obs[0].home_points, Some(21));
        assert_eq!(obs[0].away_points, Some(14));
        assert_eq!(obs[0].overtimes, Some(2));
    }

    #[test]
    fn custom_columns() {
        let columns = ColumnMapping {
            date: "game_date".into(),
            home: "home_team".into(),
            away: "away_team".into(),
            home_points: "hs".into(),
            away_points: "as".into(),
            neutral_site: Some("neutral".into()),
            overtimes: None,
            comments: None,
        };
        let csv = "game_date,home_team,away_team,hs,as,neutral\n2021-09-04,Miami (FL),Alabama,13,44,true\n";
        let obs = load_csv_observations(&"ncaa.org".into(), 2021, csv, &columns).unwrap();
        assert_eq!(obs[0].home_name, "Miami (FL)");
        assert_eq!(obs[0].neutral_site, Some(true));
    }

    #[test]
    fn missing_column() {
        let csv = "Date,Home,HomePoints,AwayPoints\n";
        let err = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "Away"));
    }

    #[test]
    fn bad_date_reports_row() {
        let csv = "Date,Home,Away,HomePoints,AwayPoints\n2021-09-04,A,B,1,0\n09/04/2021,C,D,1,0\n";
        let err = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, ReconError::DateParse { row: 3, .. }));
    }

    #[test]
    fn bad_points() {
        let csv = "Date,Home,Away,HomePoints,AwayPoints\n2021-09-04,A,B,-3,0\n";
        let err = load_csv_observations(&espn(), 2021, csv, &ColumnMapping::default()).unwrap_err();
        assert!(err.to_string().contains("HomePoints"));
    }
}
