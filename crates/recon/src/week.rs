use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ReconError;

pub const MAX_REGULAR_WEEK: u8 = 15;

/// Scraping unit within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "WeekRepr")]
pub enum Week {
    Regular(u8),
    /// Post-season bowl games.
    Bowl,
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular(n) => write!(f, "{n}"),
            Self::Bowl => write!(f, "Bowl"),
        }
    }
}

impl FromStr for Week {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("bowl") || s.eq_ignore_ascii_case("b") {
            return Ok(Self::Bowl);
        }
        match s.parse::<u8>() {
            Ok(n) if (1..=MAX_REGULAR_WEEK).contains(&n) => Ok(Self::Regular(n)),
            _ => Err(ReconError::ConfigValidation(format!(
                "week must be 1-{MAX_REGULAR_WEEK} or 'Bowl', got '{s}'"
            ))),
        }
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// TOML accepts `week = 3` as well as `week = "Bowl"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WeekRepr {
    Num(i64),
    Label(String),
}

impl TryFrom<WeekRepr> for Week {
    type Error = ReconError;

    fn try_from(repr: WeekRepr) -> Result<Self, Self::Error> {
        match repr {
            WeekRepr::Num(n) => n.to_string().parse(),
            WeekRepr::Label(s) => s.parse(),
        }
    }
}

/// Cache file name for one source's scrape of one week, e.g. `ESPN-2021-3.csv`.
pub fn cache_file_name(prefix: &str, season: i32, week: Week) -> String {
    format!("{prefix}-{season}-{week}.csv")
}
