use std::path::Path;

use anyhow::{Context, Result};
use fingerprint_core::features::{Feature, SolverSettings};
use fingerprint_core::model::{Corpus, MethodId};
use fingerprint_core::service::FingerprintService;
use serde::Serialize;

use crate::commands::load_corpus;

/// Full feature set of one method, as printed by `features --json`.
#[derive(Debug, Serialize)]
pub struct FeatureReport {
    pub target: MethodId,
    pub features: Vec<Feature>,
    pub pattern: String,
}

/// List the method ids in a corpus, optionally filtered by substring.
pub fn methods_command(corpus: &Path, filter: Option<&str>, json: bool) -> Result<()> {
    let ids: Vec<MethodId> = Corpus::new(load_corpus(corpus)?)
        .ids()
        .into_iter()
        .filter(|id| filter.map_or(true, |needle| id.as_str().contains(needle)))
        .collect();

    if json {
        let serialized = serde_json::to_string_pretty(&ids)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Methods:");
    if ids.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for id in ids {
        println!("- {}", id);
    }

    Ok(())
}

/// Show every feature of a method together with its full pattern.
pub fn features_report(corpus: &Path, method: &str) -> Result<FeatureReport> {
    let service = FingerprintService::new(load_corpus(corpus)?, SolverSettings::default());
    let target = MethodId::from(method);
    let features = service.features(&target).context("Failed to look up method features")?;
    let pattern = service.full_fingerprint(&target).context("Failed to render full pattern")?;
    Ok(FeatureReport { target, features: features.to_vec(), pattern: pattern.text })
}

pub fn features_command(corpus: &Path, method: &str, json: bool) -> Result<()> {
    let report = features_report(corpus, method)?;

    if json {
        let serialized = serde_json::to_string_pretty(&report)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Features of {}:", report.target);
    for feature in &report.features {
        println!("- {}", feature);
    }
    println!();
    println!("{}", report.pattern);

    Ok(())
}
