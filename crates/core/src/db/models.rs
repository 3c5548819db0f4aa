use serde::{Deserialize, Serialize};

use crate::features::{Feature, SolverSettings};
use crate::model::MethodId;

/// How the fingerprints of a run were produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Breadth-first enumeration of every minimal fingerprint.
    Exhaustive,
    /// Single greedy fingerprint, reduced to an inclusion-minimal set.
    Greedy,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::Exhaustive => "exhaustive",
            SearchStrategy::Greedy => "greedy",
        }
    }

    /// Decode from the stored string; unknown values fall back to exhaustive.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "greedy" => SearchStrategy::Greedy,
            _ => SearchStrategy::Exhaustive,
        }
    }
}

/// One fingerprint of a run, in result order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFingerprint {
    pub rank: usize,
    pub features: Vec<Feature>,
    /// Rendered pattern, ready for a resolver to consume.
    pub pattern: String,
}

/// Record describing one fingerprint run for bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    pub target: MethodId,
    /// SHA-256 of the corpus file the run was computed against, if known.
    pub corpus_hash: Option<String>,
    pub settings: SolverSettings,
    pub strategy: SearchStrategy,
    /// False when a search budget cut the run short.
    pub complete: bool,
    pub started_at: String,
    pub finished_at: String,
    pub fingerprints: Vec<StoredFingerprint>,
}
