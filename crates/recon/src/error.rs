use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad season, same source twice, etc.).
    ConfigValidation(String),
    /// No season row starts in the requested year. Fatal for the batch.
    SeasonNotFound { year: i32 },
    /// The same (source, name) appears twice in the reference rows.
    DuplicateSourceName { source: String, name: String },
    /// An insert would remap an existing (source, name) to a different team.
    ConflictingSourceName {
        source: String,
        name: String,
        existing: i64,
        requested: i64,
    },
    /// Two season rows share a start year.
    DuplicateSeason { year: i32 },
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Date parse error.
    DateParse { source: String, row: usize, value: String },
    /// Points / overtimes / neutral-site parse error.
    ValueParse {
        source: String,
        row: usize,
        column: String,
        value: String,
    },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SeasonNotFound { year } => write!(f, "no season starting in {year}"),
            Self::DuplicateSourceName { source, name } => {
                write!(f, "source '{source}': name '{name}' is listed more than once")
            }
            Self::ConflictingSourceName { source, name, existing, requested } => write!(
                f,
                "source '{source}': name '{name}' already maps to team {existing}, refusing to remap to {requested}"
            ),
            Self::DuplicateSeason { year } => write!(f, "more than one season starts in {year}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::DateParse { source, row, value } => {
                write!(f, "source '{source}', row {row}: cannot parse date '{value}'")
            }
            Self::ValueParse { source, row, column, value } => write!(
                f,
                "source '{source}', row {row}: cannot parse {column} '{value}'"
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
