//! SQLite store for the reference tables (team, season, source team names)
//! and the canonical game and result tables.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use gridiron_recon::model::{CanonicalGame, DataSource, GameKey, GameResult, SeasonId, SourceNameEntry, TeamId};
use gridiron_recon::resolver::SourceNameTable;
use gridiron_recon::season::SeasonTable;
use gridiron_recon::sink::{AppendOutcome, GameSink};
use gridiron_recon::ReconError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS team (
    id INTEGER PRIMARY KEY,
    shortname TEXT NOT NULL UNIQUE,
    longname TEXT UNIQUE,
    mascot TEXT
);

CREATE TABLE IF NOT EXISTS season (
    id INTEGER PRIMARY KEY,
    name TEXT,
    start INTEGER NOT NULL UNIQUE,
    "end" INTEGER
);

CREATE TABLE IF NOT EXISTS game (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,               -- %Y-%m-%d
    seasonid INTEGER REFERENCES season(id),
    hometeamid INTEGER NOT NULL REFERENCES team(id),
    awayteamid INTEGER NOT NULL REFERENCES team(id),
    neutralsite INTEGER NOT NULL DEFAULT 0,
    comments TEXT,
    UNIQUE (date, hometeamid, awayteamid)
);

CREATE TABLE IF NOT EXISTS gameresult (
    id INTEGER PRIMARY KEY REFERENCES game(id),
    homepoints INTEGER NOT NULL,
    awaypoints INTEGER NOT NULL,
    overtimes INTEGER NOT NULL DEFAULT 0,
    comments TEXT
);

CREATE TABLE IF NOT EXISTS sourceteamname (
    datasource TEXT NOT NULL,
    name TEXT NOT NULL,
    teamid INTEGER NOT NULL REFERENCES team(id),
    PRIMARY KEY (datasource, name)
);
"#;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// Reference rows violate an engine invariant.
    Recon(ReconError),
    /// A stored value cannot be read back (bad date text, negative points).
    InvalidData(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "database error: {e}"),
            Self::Recon(e) => write!(f, "{e}"),
            Self::InvalidData(msg) => write!(f, "invalid stored data: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Recon(e) => Some(e),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<ReconError> for StoreError {
    fn from(e: ReconError) -> Self {
        Self::Recon(e)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub shortname: String,
    pub longname: Option<String>,
    pub mascot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub id: SeasonId,
    pub name: Option<String>,
    pub start: i32,
    pub end: Option<i32>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        log::debug!("opening store {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Open an existing database without creating it or touching the schema.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        log::debug!("opening store {} read-only", path.display());
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -- teams --

    pub fn add_team(&self, shortname: &str, longname: Option<&str>, mascot: Option<&str>) -> Result<TeamId, StoreError> {
        self.conn.execute(
            "INSERT INTO team (shortname, longname, mascot) VALUES (?1, ?2, ?3)",
            params![shortname, longname, mascot],
        )?;
        Ok(TeamId(self.conn.last_insert_rowid()))
    }

    pub fn teams(&self) -> Result<Vec<Team>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, shortname, longname, mascot FROM team ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Team {
                id: TeamId(row.get(0)?),
                shortname: row.get(1)?,
                longname: row.get(2)?,
                mascot: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn team_by_shortname(&self, shortname: &str) -> Result<Option<TeamId>, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT id FROM team WHERE shortname = ?1", [shortname], |row| row.get(0))
            .optional()?
            .map(TeamId))
    }

    // -- seasons --

    /// Add a season starting in `start`. Seasons span two calendar years.
    pub fn add_season(&self, start: i32, name: Option<&str>) -> Result<SeasonId, StoreError> {
        let default_name = format!("{start}-{}", start + 1);
        self.conn.execute(
            r#"INSERT INTO season (name, start, "end") VALUES (?1, ?2, ?3)"#,
            params![name.unwrap_or(default_name.as_str()), start, start + 1],
        )?;
        Ok(SeasonId(self.conn.last_insert_rowid()))
    }

    pub fn seasons(&self) -> Result<Vec<Season>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT id, name, start, "end" FROM season ORDER BY start"#)?;
        let rows = stmt.query_map([], |row| {
            Ok(Season {
                id: SeasonId(row.get(0)?),
                name: row.get(1)?,
                start: row.get(2)?,
                end: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn season_table(&self) -> Result<SeasonTable, StoreError> {
        let seasons = self.seasons()?;
        Ok(SeasonTable::from_rows(seasons.into_iter().map(|s| (s.id, s.start)))?)
    }

    // -- source team names --

    /// Record a source spelling. Returns `Ok(false)` when the identical
    /// mapping is already stored; remapping a name to another team fails.
    pub fn add_source_name(&self, entry: &SourceNameEntry) -> Result<bool, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT teamid FROM sourceteamname WHERE datasource = ?1 AND name = ?2",
                params![entry.source.as_str(), entry.name],
                |row| row.get(0),
            )
            .optional()?;
        match existing {
            Some(team) if team == entry.team.0 => Ok(false),
            Some(team) => Err(ReconError::ConflictingSourceName {
                source: entry.source.to_string(),
                name: entry.name.clone(),
                existing: team,
                requested: entry.team.0,
            }
            .into()),
            None => {
                self.conn.execute(
                    "INSERT INTO sourceteamname (datasource, name, teamid) VALUES (?1, ?2, ?3)",
                    params![entry.source.as_str(), entry.name, entry.team.0],
                )?;
                Ok(true)
            }
        }
    }

    pub fn source_names(&self) -> Result<Vec<SourceNameEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT datasource, name, teamid FROM sourceteamname ORDER BY datasource, name")?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceNameEntry {
                source: DataSource::new(row.get::<_, String>(0)?),
                name: row.get(1)?,
                team: TeamId(row.get(2)?),
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn source_name_table(&self) -> Result<SourceNameTable, StoreError> {
        Ok(SourceNameTable::from_entries(self.source_names()?)?)
    }

    // -- games --

    /// Every persisted game key, for the reconciler's duplicate check.
    pub fn existing_game_keys(&self) -> Result<HashSet<GameKey>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT date, hometeamid, awayteamid FROM game")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;
        let mut keys = HashSet::new();
        for row in rows {
            let (date, home, away) = row?;
            keys.insert(GameKey {
                date: parse_date(&date)?,
                home: TeamId(home),
                away: TeamId(away),
            });
        }
        Ok(keys)
    }

    pub fn games(&self) -> Result<Vec<CanonicalGame>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT g.date, g.seasonid, g.hometeamid, g.awayteamid, g.neutralsite, g.comments, \
                    r.homepoints, r.awaypoints, r.overtimes \
             FROM game g LEFT JOIN gameresult r ON r.id = g.id \
             ORDER BY g.date, g.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<i64>>(6)?,
                row.get::<_, Option<i64>>(7)?,
                row.get::<_, Option<i64>>(8)?,
            ))
        })?;

        let mut games = Vec::new();
        for row in rows {
            let (date, season, home, away, neutral_site, comments, home_points, away_points, overtimes) = row?;
            let result = match (home_points, away_points) {
                (Some(h), Some(a)) => Some(GameResult {
                    home_points: to_count(h, "homepoints")?,
                    away_points: to_count(a, "awaypoints")?,
                    overtimes: to_count(overtimes.unwrap_or(0), "overtimes")?,
                }),
                _ => None,
            };
            let season = season.ok_or_else(|| StoreError::InvalidData(format!("game on {date} has no season")))?;
            games.push(CanonicalGame {
                date: parse_date(&date)?,
                season_id: SeasonId(season),
                home_team: TeamId(home),
                away_team: TeamId(away),
                neutral_site,
                comments,
                result,
            });
        }
        Ok(games)
    }
}

impl GameSink for Store {
    type Error = StoreError;

    /// Insert a game and, when it has one, its result, in one transaction.
    /// A taken (date, home, away) key comes back as `DuplicateKey`.
    fn append(&mut self, game: &CanonicalGame) -> Result<AppendOutcome, StoreError> {
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO game (date, seasonid, hometeamid, awayteamid, neutralsite, comments) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                game.date.format(DATE_FORMAT).to_string(),
                game.season_id.0,
                game.home_team.0,
                game.away_team.0,
                game.neutral_site,
                game.comments,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(AppendOutcome::DuplicateKey),
            Err(e) => return Err(e.into()),
        }

        if let Some(result) = &game.result {
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO gameresult (id, homepoints, awaypoints, overtimes) VALUES (?1, ?2, ?3, ?4)",
                params![id, result.home_points, result.away_points, result.overtimes],
            )?;
        }
        tx.commit()?;
        Ok(AppendOutcome::Inserted)
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StoreError::InvalidData(format!("bad game date '{value}'")))
}

fn to_count(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData(format!("{column} out of range: {value}")))
}
