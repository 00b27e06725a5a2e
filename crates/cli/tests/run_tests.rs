// End-to-end tests for `gridiron run`, `gridiron validate` and `gridiron db`.
// Run with: cargo test -p gridiron-cli --test run_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use gridiron_recon::model::{DataSource, SourceNameEntry, TeamId};
use gridiron_store::Store;
use tempfile::TempDir;

const TEAMS: [&str; 12] = [
    "Alabama",
    "Miami (FL)",
    "Georgia",
    "Clemson",
    "Ohio State",
    "Minnesota",
    "Fresno State",
    "UConn",
    "Texas",
    "Louisiana",
    "Notre Dame",
    "Florida State",
];

const CONFIG: &str = r#"
name = "2021 week 1"
season = 2021
week = 1

[sources.left]
data_source = "espn.com"
cache_prefix = "ESPN"

[sources.right]
data_source = "ncaa.org"
cache_prefix = "NCAA"

[policy]
on_conflict = "prefer_right"
unmatched_left = "accept"

[policy.aliases."espn.com"]
"UConn" = 8

[store]
path = "football.db"
"#;

fn gridiron() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gridiron"))
}

fn recon_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures").join(name)
}

/// Temp dir with both week-1 scrapes, a seeded database and `config`.
fn workspace(config: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for csv in ["ESPN-2021-1.csv", "NCAA-2021-1.csv"] {
        std::fs::copy(recon_fixture(csv), dir.path().join(csv)).unwrap();
    }

    let store = Store::open(&dir.path().join("football.db")).unwrap();
    for team in TEAMS {
        store.add_team(team, None, None).unwrap();
    }
    store.add_season(2021, None).unwrap();

    let names = std::fs::read_to_string(recon_fixture("source_names.csv")).unwrap();
    for line in names.lines().skip(1) {
        let mut parts = line.splitn(3, ',');
        let source = parts.next().unwrap();
        let name = parts.next().unwrap();
        let team: i64 = parts.next().unwrap().parse().unwrap();
        store
            .add_source_name(&SourceNameEntry {
                source: DataSource::new(source),
                name: name.into(),
                team: TeamId(team),
            })
            .unwrap();
    }

    let config_path = dir.path().join("week1.recon.toml");
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn run(args: &[&str]) -> Output {
    gridiron().args(args).output().expect("gridiron")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("stdout must be one JSON value: {e}\n{}", String::from_utf8_lossy(&output.stdout))
    })
}

#[test]
fn run_persists_and_is_idempotent() {
    let (dir, config) = workspace(CONFIG);
    let config = config.to_str().unwrap();

    let first = stdout_json(&run(&["run", config, "--json"]));
    assert_eq!(first["reconciliation"]["summary"]["inserted"], 5);
    assert_eq!(first["persisted"]["inserted"], 5);
    assert_eq!(first["learned_names_saved"], 1);
    assert_eq!(first["dry_run"], false);

    let store = Store::open(&dir.path().join("football.db")).unwrap();
    assert_eq!(store.games().unwrap().len(), 5);
    assert!(store
        .source_names()
        .unwrap()
        .iter()
        .any(|n| n.source.as_str() == "espn.com" && n.name == "UConn"));

    let second = stdout_json(&run(&["run", config, "--json"]));
    assert_eq!(second["reconciliation"]["summary"]["inserted"], 0);
    assert_eq!(second["reconciliation"]["summary"]["duplicates"], 5);
    assert_eq!(second["learned_names"].as_array().unwrap().len(), 0);
    assert_eq!(store.games().unwrap().len(), 5);
}

#[test]
fn dry_run_writes_nothing() {
    let (dir, config) = workspace(CONFIG);
    let report = dir.path().join("report.json");

    let output = run(&["run", config.to_str().unwrap(), "--dry-run", "--output", report.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["dry_run"], true);
    assert!(json["persisted"].is_null());
    assert_eq!(json["summary"]["unknown_names"], 1);

    let store = Store::open(&dir.path().join("football.db")).unwrap();
    assert!(store.games().unwrap().is_empty());
}

#[test]
fn dry_run_never_creates_the_database() {
    let (dir, config) = workspace(CONFIG);
    let db = dir.path().join("fresh.db");
    let output = run(&["run", config.to_str().unwrap(), "--dry-run", "--db", db.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(6));
    assert!(!db.exists());
}

#[test]
fn strict_exits_3_on_ambiguity() {
    let (_dir, config) = workspace(CONFIG);
    let output = run(&["run", config.to_str().unwrap(), "--strict"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 multiply-matched groups"), "stderr: {stderr}");
}

#[test]
fn db_flag_overrides_config_store() {
    let (dir, config) = workspace(&CONFIG.replace("path = \"football.db\"", "path = \"missing/elsewhere.db\""));
    let db = dir.path().join("football.db");
    let output = run(&["run", config.to_str().unwrap(), "--db", db.to_str().unwrap(), "--json"]);
    let json = stdout_json(&output);
    assert_eq!(json["persisted"]["inserted"], 5);
}

#[test]
fn missing_store_is_usage_error() {
    let (_dir, config) = workspace(&CONFIG.replace("[store]\npath = \"football.db\"\n", ""));
    let output = gridiron()
        .args(["run", config.to_str().unwrap()])
        .env_remove("GRIDIRON_DB")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("hint:"));
}

#[test]
fn invalid_config_exits_4() {
    let (_dir, config) = workspace(&CONFIG.replace("season = 2021", "season = 1700"));
    let output = run(&["validate", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));

    let (_dir, config) = workspace(CONFIG);
    let output = run(&["validate", config.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("valid:"));
}

#[test]
fn missing_season_exits_5() {
    let config_2022 = CONFIG
        .replace("season = 2021", "season = 2022")
        .replace("cache_prefix = \"ESPN\"", "file = \"ESPN-2021-1.csv\"")
        .replace("cache_prefix = \"NCAA\"", "file = \"NCAA-2021-1.csv\"");
    let (_dir, config) = workspace(&config_2022);
    let output = run(&["run", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no season starting in 2022"));
}

#[test]
fn db_commands() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("new.db");
    let db = db.to_str().unwrap();

    assert!(run(&["db", "--db", db, "init"]).status.success());

    let added = run(&["db", "--db", db, "add-team", "Miami (FL)", "--mascot", "Hurricanes"]);
    assert_eq!(String::from_utf8_lossy(&added.stdout).trim(), "1");
    assert!(run(&["db", "--db", db, "add-season", "2021"]).status.success());
    assert!(run(&["db", "--db", db, "add-name", "ncaa.org", "Miami (Fla.)", "Miami (FL)"]).status.success());

    let unknown = run(&["db", "--db", db, "add-name", "ncaa.org", "Miami", "Hurricanes"]);
    assert_eq!(unknown.status.code(), Some(2));

    let remap = run(&["db", "--db", db, "add-name", "ncaa.org", "Miami (Fla.)", "2"]);
    assert_eq!(remap.status.code(), Some(6));

    let names = stdout_json(&run(&["db", "--db", db, "names", "--json"]));
    assert_eq!(names.as_array().unwrap().len(), 1);
    assert_eq!(names[0]["name"], "Miami (Fla.)");
    assert_eq!(names[0]["team"], 1);
}
