//! `rosterjoin run | validate | score | teams`.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use rosterjoin_recon::engine::{load_dataset, run};
use rosterjoin_recon::model::{MatchTable, MergedTable, ReconInput};
use rosterjoin_recon::similarity::ScoreBreakdown;
use rosterjoin_recon::{ReconConfig, TeamNormalizer};

use crate::exit_codes::EXIT_UNMATCHED;
use crate::CliError;

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub matches: Option<PathBuf>,
    pub strict: bool,
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    let config = ReconConfig::from_toml(&config_str)?;
    info!("config '{}' from {}", config.name, config_path.display());
    Ok(config)
}

/// Paths in the config are relative to the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = read_config(&args.config)?;
    let base_dir = base_dir(&args.config);

    let read = |file: &str| -> Result<String, CliError> {
        let path = base_dir.join(file);
        debug!("reading {}", path.display());
        std::fs::read_to_string(&path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
    };
    let input = ReconInput {
        primary: load_dataset("primary", &read(&config.primary.file)?, &config.primary)?,
        secondary: load_dataset("secondary", &read(&config.secondary.file)?, &config.secondary)?,
    };

    let result = run(&config, &input)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    // Flags win over [output]; config paths resolve against the config dir.
    let target = |flag: Option<PathBuf>, configured: &Option<String>| {
        flag.or_else(|| configured.as_ref().map(|p| base_dir.join(p)))
    };

    if let Some(path) = target(args.output, &config.output.json) {
        std::fs::write(&path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(path) = target(args.csv, &config.output.csv) {
        write_merged_csv(&path, &result.merged)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(path) = target(args.matches, &config.output.matches_csv) {
        write_matches_csv(&path, &result.matches)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    }

    let s = &result.summary;
    eprintln!(
        "'{}': {} primary, {} secondary, {} matched, {} merged, {} dropped ({} no candidates, {} below threshold, {} already claimed)",
        result.meta.config_name,
        s.primary_records,
        s.secondary_records,
        s.matched,
        s.merged,
        s.dropped(),
        s.empty_candidate_set,
        s.no_qualifying_candidate,
        s.all_candidates_claimed,
    );
    if !s.unresolved_teams.is_empty() {
        eprintln!("unresolved teams: {}", s.unresolved_teams.join(", "));
    }

    if args.strict && s.dropped() > 0 {
        return Err(CliError::new(
            EXIT_UNMATCHED,
            format!("{} primary record(s) left unmatched (--strict)", s.dropped()),
        )
        .with_hint("add team aliases under [teams.aliases] or lower the threshold"));
    }

    Ok(())
}

fn write_merged_csv(path: &Path, merged: &MergedTable) -> Result<(), CliError> {
    let io_err = |e: csv::Error| CliError::io(format!("cannot write {}: {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;

    debug!("writing {} merged row(s) to {}", merged.len(), path.display());
    writer.write_record(merged.header()).map_err(io_err)?;
    for row in &merged.rows {
        writer
            .write_record(
                [row.name.as_str(), row.team.as_str()]
                    .into_iter()
                    .chain(row.values.iter().map(String::as_str)),
            )
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn write_matches_csv(path: &Path, matches: &MatchTable) -> Result<(), CliError> {
    let io_err = |e: csv::Error| CliError::io(format!("cannot write {}: {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;

    writer
        .write_record(["primary_name", "secondary_name", "team", "score"])
        .map_err(io_err)?;
    for m in matches {
        let score = m.score.to_string();
        writer
            .write_record([
                m.primary_name.as_str(),
                m.secondary_name.as_str(),
                m.team.as_str(),
                score.as_str(),
            ])
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' joins {} ({}) onto {} ({}), threshold {}{}",
        config.name,
        config.secondary.file,
        config.secondary.format,
        config.primary.file,
        config.primary.format,
        config.threshold,
        if config.one_to_one { ", one-to-one" } else { "" },
    );
    Ok(())
}

// ============================================================================
// score
// ============================================================================

#[derive(Serialize)]
struct ScoreOutput<'a> {
    a: &'a str,
    b: &'a str,
    #[serde(flatten)]
    breakdown: ScoreBreakdown,
    total: u32,
}

pub fn cmd_score(a: &str, b: &str, json: bool) -> Result<(), CliError> {
    if a.trim().is_empty() || b.trim().is_empty() {
        return Err(CliError::usage("both names must be non-empty"));
    }

    let breakdown = ScoreBreakdown::compute(a, b);
    let total = breakdown.total();

    if json {
        let out = ScoreOutput { a, b, breakdown, total };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        println!("ratio             {:>3}", breakdown.ratio);
        println!("partial_ratio     {:>3}", breakdown.partial_ratio);
        println!("token_sort_ratio  {:>3}", breakdown.token_sort_ratio);
        println!("token_set_ratio   {:>3}", breakdown.token_set_ratio);
        println!("total             {:>3}", total);
    }
    Ok(())
}

// ============================================================================
// teams
// ============================================================================

pub fn cmd_teams(labels: &[String], config_path: Option<PathBuf>) -> Result<(), CliError> {
    let normalizer = match config_path {
        Some(path) => TeamNormalizer::from_config(&read_config(&path)?.teams),
        None => TeamNormalizer::builtin(),
    };
    for label in labels {
        println!("{label}\t{}", normalizer.canonical(label));
    }
    Ok(())
}
