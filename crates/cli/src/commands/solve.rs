use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use fingerprint_core::db::{FingerprintDb, RunRecord, SearchStrategy, StoredFingerprint};
use fingerprint_core::features::SolverSettings;
use fingerprint_core::model::MethodId;
use fingerprint_core::search::{Fingerprint, SearchStats};
use fingerprint_core::service::FingerprintService;
use log::info;
use serde::Serialize;

use crate::commands::{load_corpus, resolve_config, ConfigOverrides};
use crate::sha256_file;

/// Everything the `solve` subcommand was asked to do.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub corpus: PathBuf,
    pub method: String,
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub greedy: bool,
    pub limit: Option<usize>,
    pub json: bool,
    pub record: Option<PathBuf>,
}

/// Result of a `solve` run, as printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub target: MethodId,
    pub strategy: SearchStrategy,
    pub settings: SolverSettings,
    pub complete: bool,
    /// Absent for greedy runs.
    pub stats: Option<SearchStats>,
    pub fingerprints: Vec<StoredFingerprint>,
}

/// Compute fingerprints for one method and render each as a pattern.
pub fn solve_report(options: &SolveOptions) -> Result<SolveReport> {
    let config = resolve_config(options.config.as_deref(), &options.overrides)?;
    let service = FingerprintService::new(load_corpus(&options.corpus)?, config.settings);
    let target = MethodId::from(options.method.as_str());

    let (strategy, complete, stats, mut fingerprints): (_, _, _, Vec<Fingerprint>) =
        if options.greedy {
            let fingerprint = service
                .solve_greedy(&target)
                .with_context(|| format!("Greedy search failed for {}", target))?;
            (SearchStrategy::Greedy, true, None, vec![fingerprint])
        } else {
            let outcome = service
                .solve(&target, &config.budget)
                .with_context(|| format!("Fingerprint search failed for {}", target))?;
            (SearchStrategy::Exhaustive, outcome.complete, Some(outcome.stats), outcome.fingerprints)
        };

    if let Some(limit) = options.limit {
        fingerprints.truncate(limit);
    }

    let snapshot = service.snapshot();
    let mut stored = Vec::with_capacity(fingerprints.len());
    for (rank, fingerprint) in fingerprints.into_iter().enumerate() {
        let rendered = snapshot
            .render_fingerprint(&target, &fingerprint)
            .context("Failed to render fingerprint")?;
        stored.push(StoredFingerprint {
            rank: rank + 1,
            features: fingerprint.into_features(),
            pattern: rendered.text,
        });
    }

    Ok(SolveReport {
        target,
        strategy,
        settings: config.settings,
        complete,
        stats,
        fingerprints: stored,
    })
}

/// Persist a report in the run database; returns the new run id.
pub fn record_run(
    db_path: &Path,
    corpus: &Path,
    report: &SolveReport,
    started_at: String,
) -> Result<i64> {
    let db = FingerprintDb::open(db_path)
        .with_context(|| format!("Failed to open run database at {}", db_path.display()))?;
    let record = RunRecord {
        target: report.target.clone(),
        corpus_hash: Some(sha256_file(corpus)?),
        settings: report.settings,
        strategy: report.strategy,
        complete: report.complete,
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        fingerprints: report.fingerprints.clone(),
    };
    let id = db.insert_run(&record).context("Failed to record fingerprint run")?;
    info!("Recorded run {} for {} in {}", id, record.target, db_path.display());
    Ok(id)
}

pub fn solve_command(options: &SolveOptions) -> Result<()> {
    let started_at = Utc::now().to_rfc3339();
    let report = solve_report(options)?;

    let run_id = match &options.record {
        Some(db_path) => Some(record_run(db_path, &options.corpus, &report, started_at)?),
        None => None,
    };

    if options.json {
        let serialized = serde_json::to_string_pretty(&report)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!(
        "Fingerprints for {} ({} found, {}):",
        report.target,
        report.fingerprints.len(),
        report.strategy.as_str()
    );
    if !report.complete {
        println!("Search budget exhausted; the list below may be incomplete.");
    }
    for fingerprint in &report.fingerprints {
        let tokens: Vec<&str> = fingerprint.features.iter().map(|f| f.token()).collect();
        println!();
        println!("#{} {{{}}}", fingerprint.rank, tokens.join(", "));
        println!("{}", fingerprint.pattern);
    }
    if let (Some(id), Some(db_path)) = (run_id, &options.record) {
        println!();
        println!("Recorded run {} in {}", id, db_path.display());
    }

    Ok(())
}
