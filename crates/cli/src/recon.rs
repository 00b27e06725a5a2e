//! `gridiron run` / `gridiron validate`: config-driven reconciliation.

use std::path::{Path, PathBuf};

use serde::Serialize;

use gridiron_recon::config::SourceConfig;
use gridiron_recon::ingest::load_csv_observations;
use gridiron_recon::model::Observation;
use gridiron_recon::policy::{AutoPolicy, ResolutionPolicy, SkipPolicy};
use gridiron_recon::sink::{persist, PersistSummary};
use gridiron_recon::{ReconResult, RunConfig, RunInput};
use gridiron_store::Store;

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_UNRESOLVED};
use crate::CliError;

pub struct RunOptions {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub dry_run: bool,
    pub strict: bool,
}

/// JSON document written by `gridiron run`.
#[derive(Serialize)]
struct RunReport {
    #[serde(flatten)]
    result: ReconResult,
    dry_run: bool,
    /// `None` on dry runs.
    persisted: Option<PersistSummary>,
    learned_names_saved: usize,
}

fn load_config(path: &Path) -> Result<RunConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot read config {}: {e}", path.display())))?;
    RunConfig::from_toml(&config_str).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

fn load_source(
    base_dir: &Path,
    config: &RunConfig,
    source: &SourceConfig,
) -> Result<Vec<Observation>, CliError> {
    let file = source
        .input_file(config.season, config.week)
        .ok_or_else(|| CliError::new(EXIT_INVALID_CONFIG, format!("{}: no input file", source.data_source)))?;
    let csv_path = base_dir.join(file);
    let csv_data = std::fs::read_to_string(&csv_path)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot read {}: {e}", csv_path.display())))?;
    load_csv_observations(&source.data_source(), config.season, &csv_data, &source.columns)
        .map_err(|e| CliError::new(EXIT_RUNTIME, e.to_string()))
}

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let config = load_config(&opts.config)?;

    // Resolve file paths relative to config file's directory
    let base_dir = opts.config.parent().unwrap_or_else(|| Path::new("."));

    let db_path = match (&opts.db, &config.store) {
        (Some(db), _) => db.clone(),
        (None, Some(store)) => base_dir.join(&store.path),
        (None, None) => {
            return Err(CliError::usage("no database given")
                .with_hint("set [store] path in the config or pass --db"))
        }
    };

    let input = RunInput {
        left: load_source(base_dir, &config, &config.sources.left)?,
        right: load_source(base_dir, &config, &config.sources.right)?,
    };

    let mut store = if opts.dry_run {
        Store::open_read_only(&db_path)?
    } else {
        Store::open(&db_path)?
    };
    let mut names = store.source_name_table()?;
    let seasons = store.season_table()?;
    let existing = store.existing_game_keys()?;
    log::info!(
        "store {}: {} source names, {} seasons, {} games",
        db_path.display(),
        names.len(),
        seasons.len(),
        existing.len()
    );

    let mut policy: Box<dyn ResolutionPolicy> = if opts.dry_run {
        Box::new(SkipPolicy)
    } else {
        Box::new(AutoPolicy::from_config(&config.policy))
    };

    let result = gridiron_recon::run(&config, input, &mut names, &seasons, policy.as_mut(), &existing)
        .map_err(|e| CliError::new(EXIT_RUNTIME, e.to_string()))?;

    let (persisted, learned_names_saved) = if opts.dry_run {
        (None, 0)
    } else {
        let mut saved = 0;
        for entry in &result.learned_names {
            if store.add_source_name(entry)? {
                saved += 1;
            }
        }
        (Some(persist(&result.reconciliation.games, &mut store)?), saved)
    };

    let report = RunReport {
        result,
        dry_run: opts.dry_run,
        persisted,
        learned_names_saved,
    };

    if opts.json || opts.output.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = opts.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if opts.json {
            println!("{json_str}");
        }
    }

    print_summary(&report);

    let r = &report.result.reconciliation.summary;
    if opts.strict && (r.unresolved > 0 || r.ambiguous > 0) {
        return Err(CliError::new(
            EXIT_UNRESOLVED,
            format!(
                "{} observations with unknown teams, {} multiply-matched groups",
                r.unresolved, r.ambiguous
            ),
        ));
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(report: &RunReport) {
    let meta = &report.result.meta;
    let s = &report.result.summary;
    let r = &report.result.reconciliation.summary;

    eprintln!(
        "{} {} week {} ({} vs {}): {} observations",
        meta.config_name, meta.season, meta.week, meta.left_source, meta.right_source, s.total_observations,
    );
    eprintln!(
        "  {} consistent, {} conflicting, {} multiply-matched groups, {}/{} unmatched, {} unknown names",
        s.consistent, s.conflicting, s.multiply_matched_groups, s.unmatched_left, s.unmatched_right, s.unknown_names,
    );
    for name in &report.result.classification.unknown_names {
        eprintln!("  unknown team: '{}' from {} ({} games)", name.raw_name, name.source, name.observations.len());
    }
    eprintln!(
        "  {} new games, {} already stored, {} skipped",
        r.inserted, r.duplicates, r.skipped,
    );
    match &report.persisted {
        Some(p) => eprintln!(
            "  persisted {} games ({} integrity skips), {} new team names",
            p.inserted, p.integrity_skips, report.learned_names_saved,
        ),
        None => eprintln!("  dry run: nothing written"),
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' season {} week {}, {} vs {}",
        config.name, config.season, config.week, config.sources.left.data_source, config.sources.right.data_source,
    );
    Ok(())
}
