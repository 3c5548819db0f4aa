use std::path::Path;

use anyhow::{bail, Context, Result};
use fingerprint_core::db::FingerprintDb;
use fingerprint_core::model::MethodId;

/// List recorded fingerprint runs, optionally for a single method.
///
/// The database must already exist; listing never creates one.
pub fn history_command(db_path: &Path, method: Option<&str>, json: bool) -> Result<()> {
    if !db_path.is_file() {
        bail!("Run database not found at {}", db_path.display());
    }
    let db = FingerprintDb::open(db_path)
        .with_context(|| format!("Failed to open run database at {}", db_path.display()))?;
    let target = method.map(MethodId::from);
    let runs = db.list_runs(target.as_ref()).context("Failed to list fingerprint runs")?;

    if json {
        let serialized = serde_json::to_string_pretty(&runs)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Runs:");
    if runs.is_empty() {
        println!("(none)");
        return Ok(());
    }

    for run in runs {
        let hash_display = run.corpus_hash.as_deref().unwrap_or("(none)");
        println!(
            "- {} [{}{}] at {} (corpus: {}, {} fingerprint(s))",
            run.target,
            run.strategy.as_str(),
            if run.complete { "" } else { ", incomplete" },
            run.finished_at,
            hash_display,
            run.fingerprints.len()
        );
        for fingerprint in &run.fingerprints {
            let tokens: Vec<&str> = fingerprint.features.iter().map(|f| f.token()).collect();
            println!("    #{} {{{}}}", fingerprint.rank, tokens.join(", "));
        }
    }

    Ok(())
}
