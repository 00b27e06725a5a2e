use crate::classify::classify;
use crate::config::RunConfig;
use crate::error::ReconError;
use crate::matcher::match_observations;
use crate::model::{Observation, ReconResult, RunMeta, Side, SourceNameEntry, UnknownName};
use crate::normalize::{normalize_batch, re_resolve};
use crate::policy::{ResolutionPolicy, UnknownTeamResolution};
use crate::reconcile::{reconcile, ReconcileOptions};
use crate::resolver::{collect_unknown_names, SourceNameTable};
use crate::season::SeasonLookup;
use crate::sink::ExistingGames;

/// Both sources' raw observations for one season/week.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub left: Vec<Observation>,
    pub right: Vec<Observation>,
}

/// Run one reconciliation: normalize, match, give the policy one pass over
/// unknown team names, re-match, classify, reconcile.
///
/// `names` gains every mapping learned from the policy; the same entries are
/// returned in `learned_names` for the caller to persist. Nothing is written
/// to the game store here.
pub fn run<S, P, E>(
    config: &RunConfig,
    input: RunInput,
    names: &mut SourceNameTable,
    seasons: &S,
    policy: &mut P,
    existing: &E,
) -> Result<ReconResult, ReconError>
where
    S: SeasonLookup + ?Sized,
    P: ResolutionPolicy + ?Sized,
    E: ExistingGames + ?Sized,
{
    let mut left = normalize_batch(Side::Left, input.left, &*names, seasons)?;
    let mut right = normalize_batch(Side::Right, input.right, &*names, seasons)?;
    log::debug!("normalized {} left / {} right observations", left.len(), right.len());

    let mut matched = match_observations(&left, &right);

    let unknown = collect_unknown_names(matched.unknown_left.iter().chain(&matched.unknown_right));
    let learned_names = if unknown.is_empty() {
        Vec::new()
    } else {
        resolve_unknown_teams(&unknown, policy, names)?
    };

    if !learned_names.is_empty() {
        let fixed = re_resolve(&mut left, &*names) + re_resolve(&mut right, &*names);
        log::info!("learned {} team names, {fixed} observations now resolved", learned_names.len());
        matched = match_observations(&left, &right);
    }

    let classification = classify(&matched);
    let summary = classification.summary();

    let options = ReconcileOptions {
        comment_separator: config.policy.comment_separator.clone(),
    };
    let reconciliation = reconcile(&classification, policy, existing, &options);

    log::info!(
        "{}: {} observations, {} consistent, {} conflicting, {} unknown names",
        config.name,
        summary.total_observations,
        summary.consistent,
        summary.conflicting,
        summary.unknown_names,
    );

    Ok(ReconResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            season: config.season,
            week: config.week.to_string(),
            left_source: config.sources.left.data_source(),
            right_source: config.sources.right.data_source(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        classification,
        reconciliation,
        learned_names,
    })
}

/// Ask the policy about each unknown name in order and record every answer
/// in `names`. Stops early on `SkipAll`.
pub fn resolve_unknown_teams<P>(
    unknown: &[UnknownName],
    policy: &mut P,
    names: &mut SourceNameTable,
) -> Result<Vec<SourceNameEntry>, ReconError>
where
    P: ResolutionPolicy + ?Sized,
{
    let mut learned = Vec::new();
    for name in unknown {
        match policy.resolve_unknown_team(&name.source, &name.raw_name) {
            UnknownTeamResolution::Team(team) => {
                let entry = SourceNameEntry {
                    source: name.source.clone(),
                    name: name.raw_name.clone(),
                    team,
                };
                if names.insert(entry.clone())? {
                    log::debug!("{}: '{}' -> team {team}", name.source, name.raw_name);
                    learned.push(entry);
                }
            }
            UnknownTeamResolution::Skip => {}
            UnknownTeamResolution::SkipAll => break,
        }
    }
    Ok(learned)
}
