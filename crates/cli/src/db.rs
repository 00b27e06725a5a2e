//! `gridiron db`: reference-table maintenance and stored-game listing.

use std::path::PathBuf;

use clap::Subcommand;

use gridiron_recon::model::{SourceNameEntry, TeamId};
use gridiron_store::Store;

use crate::CliError;

#[derive(Subcommand)]
pub enum DbCommands {
    /// Create the database file and schema
    Init,

    /// Add a team
    #[command(after_help = "\
Examples:
  gridiron db --db football.db add-team Alabama --longname 'University of Alabama' --mascot 'Crimson Tide'")]
    AddTeam {
        shortname: String,
        #[arg(long)]
        longname: Option<String>,
        #[arg(long)]
        mascot: Option<String>,
    },

    /// Add a season by start year
    AddSeason {
        start: i32,
        /// Display name; defaults to "<start>-<start+1>"
        #[arg(long)]
        name: Option<String>,
    },

    /// Map a source's spelling of a team name to a team
    #[command(after_help = "\
Examples:
  gridiron db --db football.db add-name ncaa.org 'Miami (Fla.)' 'Miami (FL)'
  gridiron db --db football.db add-name espn.com UConn 8")]
    AddName {
        /// Data source tag, e.g. espn.com
        source: String,
        /// Raw name as the source spells it
        name: String,
        /// Team id or team shortname
        team: String,
    },

    /// List team name mappings
    Names {
        #[arg(long)]
        json: bool,
    },

    /// List stored games
    Games {
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_db(db: PathBuf, cmd: DbCommands) -> Result<(), CliError> {
    let store = Store::open(&db)?;

    match cmd {
        DbCommands::Init => {
            eprintln!("initialized {}", db.display());
        }
        DbCommands::AddTeam { shortname, longname, mascot } => {
            let id = store.add_team(&shortname, longname.as_deref(), mascot.as_deref())?;
            println!("{id}");
        }
        DbCommands::AddSeason { start, name } => {
            let id = store.add_season(start, name.as_deref())?;
            println!("{}", id.0);
        }
        DbCommands::AddName { source, name, team } => {
            let team = resolve_team(&store, &team)?;
            let entry = SourceNameEntry { source: source.as_str().into(), name, team };
            if store.add_source_name(&entry)? {
                eprintln!("{}: '{}' -> team {}", entry.source, entry.name, entry.team);
            } else {
                eprintln!("{}: '{}' already maps to team {}", entry.source, entry.name, entry.team);
            }
        }
        DbCommands::Names { json } => {
            let names = store.source_names()?;
            if json {
                print_json(&names)?;
            } else {
                for n in &names {
                    println!("{}\t{}\t{}", n.source, n.name, n.team);
                }
            }
        }
        DbCommands::Games { json } => {
            let games = store.games()?;
            if json {
                print_json(&games)?;
            } else {
                for g in &games {
                    let score = g
                        .result
                        .map(|r| match r.overtimes {
                            0 => format!("{}-{}", r.home_points, r.away_points),
                            n => format!("{}-{} ({n}OT)", r.home_points, r.away_points),
                        })
                        .unwrap_or_else(|| "-".into());
                    let venue = if g.neutral_site { "neutral" } else { "" };
                    println!("{}\t{}\t{}\t{score}\t{venue}", g.date, g.home_team, g.away_team);
                }
            }
        }
    }
    Ok(())
}

/// Numeric ids are taken as-is; anything else is looked up by shortname.
fn resolve_team(store: &Store, team: &str) -> Result<TeamId, CliError> {
    if let Ok(id) = team.parse::<i64>() {
        return Ok(TeamId(id));
    }
    store
        .team_by_shortname(team)?
        .ok_or_else(|| CliError::usage(format!("no team with shortname '{team}'")))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}
