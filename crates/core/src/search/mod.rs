//! Minimal fingerprint search.
//!
//! For a target method `t` with feature set `T`, a fingerprint is a subset
//! `S` of `T` whose candidate set (methods sharing every feature of `S`) is
//! exactly `{t}`. The search returns every inclusion-minimal fingerprint.
//!
//! The search is a breadth-first walk over feature combinations:
//! - features are ranked rarest first, ties broken by token;
//! - a combination only grows with features ranked after its last member, so
//!   every combination is generated at most once;
//! - a branch stops growing as soon as it isolates the target;
//! - survivors that are strict supersets of another hit are filtered out.
//!
//! Because levels are processed in order of size, every hit recorded before a
//! budget cut is still minimal; the outcome is simply marked incomplete.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::Feature;
use crate::index::{intersect_sorted, FeatureIndex, IndexError, Slot};
use crate::model::MethodId;

mod greedy;

pub use greedy::greedy_fingerprint;

/// How often (in branches) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Error type for fingerprint searches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Method ID not found: {0}")]
    NotFound(MethodId),

    #[error("Method {0} has no features under the current settings")]
    NoFeatures(MethodId),

    /// Another method shares the target's complete feature set.
    #[error("Could not distinguish {target} from {count} other method(s) with the current settings")]
    DistinguishingImpossible { target: MethodId, count: usize, colliding: Vec<MethodId> },

    #[error("Search budget exhausted after {branches} branch(es) without a fingerprint for {target}")]
    BudgetExhausted { target: MethodId, branches: u64, elapsed: Duration },
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotFound(id) => SearchError::NotFound(id),
        }
    }
}

/// Optional ceilings on search effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of candidate extensions evaluated.
    pub max_branches: Option<u64>,
    /// Maximum wall-clock time in milliseconds.
    pub max_duration_ms: Option<u64>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_branches(mut self, max_branches: u64) -> Self {
        self.max_branches = Some(max_branches);
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration_ms = Some(max_duration.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_branches.is_none() && self.max_duration_ms.is_none()
    }
}

/// A distinguishing feature combination, kept sorted by token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Vec<Feature>);

impl Fingerprint {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut features: Vec<Feature> = features.into_iter().collect();
        features.sort();
        features.dedup();
        Self(features)
    }

    pub fn features(&self) -> &[Feature] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.0.iter()
    }

    pub fn contains(&self, feature: &Feature) -> bool {
        self.0.binary_search(feature).is_ok()
    }

    pub fn is_strict_superset_of(&self, other: &Fingerprint) -> bool {
        other.len() < self.len() && other.iter().all(|feature| self.contains(feature))
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, feature) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{feature}")?;
        }
        f.write_str("}")
    }
}

/// Counters describing how much work a search did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Candidate extensions evaluated.
    pub branches: u64,
    /// Deepest combination size reached.
    pub depth: usize,
    /// Largest frontier observed.
    pub frontier_peak: usize,
    pub elapsed: Duration,
}

/// Result of a search for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub target: MethodId,
    /// Minimal fingerprints ordered by size, then by token order.
    pub fingerprints: Vec<Fingerprint>,
    /// False when a budget cut the search short.
    pub complete: bool,
    pub stats: SearchStats,
}

/// Target features ranked rarest first, after the up-front checks passed.
pub(crate) struct RankedTarget<'a> {
    pub slot: Slot,
    pub ranked: Vec<(&'a Feature, &'a [Slot])>,
}

/// Resolve the target and rank its features, failing early when the target
/// has no features or cannot be isolated at all.
pub(crate) fn rank_target<'a>(
    index: &'a FeatureIndex,
    target: &MethodId,
) -> Result<RankedTarget<'a>, SearchError> {
    let slot = index.slot(target)?;
    let features = index.features_at(slot);
    if features.is_empty() {
        return Err(SearchError::NoFeatures(target.clone()));
    }

    let remaining = index.candidates_of(features.iter());
    if remaining.len() != 1 || remaining[0] != slot {
        let mut colliding: Vec<MethodId> = remaining
            .iter()
            .filter(|&&other| other != slot)
            .map(|&other| index.method_id(other).clone())
            .collect();
        colliding.sort();
        warn!(
            "Could not distinguish {target} from {} other method(s) with current settings",
            colliding.len()
        );
        for id in &colliding {
            warn!(" - {id}");
        }
        return Err(SearchError::DistinguishingImpossible {
            target: target.clone(),
            count: colliding.len(),
            colliding,
        });
    }

    let mut ranked: Vec<(&Feature, &[Slot])> =
        features.iter().map(|feature| (feature, index.candidates(feature))).collect();
    ranked.sort_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| a.0.cmp(b.0)));
    Ok(RankedTarget { slot, ranked })
}

struct Branch {
    /// Ranks of the member features, ascending.
    members: Vec<usize>,
    candidates: Vec<Slot>,
}

struct BudgetMeter {
    max_branches: Option<u64>,
    deadline: Option<Instant>,
    branches: u64,
}

impl BudgetMeter {
    fn new(budget: &SearchBudget, started: Instant) -> Self {
        Self {
            max_branches: budget.max_branches,
            deadline: budget.max_duration().map(|limit| started + limit),
            branches: 0,
        }
    }

    fn exhausted(&self) -> bool {
        if self.max_branches.is_some_and(|max| self.branches >= max) {
            return true;
        }
        match self.deadline {
            Some(deadline) if self.branches % CLOCK_CHECK_INTERVAL == 0 => {
                Instant::now() >= deadline
            }
            _ => false,
        }
    }
}

/// Breadth-first search for every minimal fingerprint of one target.
pub struct MinimalFingerprintSearch<'a> {
    index: &'a FeatureIndex,
    budget: SearchBudget,
}

impl<'a> MinimalFingerprintSearch<'a> {
    pub fn new(index: &'a FeatureIndex) -> Self {
        Self { index, budget: SearchBudget::unlimited() }
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn run(&self, target: &MethodId) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let RankedTarget { slot, ranked } = rank_target(self.index, target)?;
        info!(
            "Searching minimal fingerprints for {target}: {} feature(s) against {} method(s)",
            ranked.len(),
            self.index.len()
        );

        let mut meter = BudgetMeter::new(&self.budget, started);
        let mut stats = SearchStats { depth: 1, ..SearchStats::default() };
        let mut hits: Vec<Vec<usize>> = Vec::new();
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut frontier: VecDeque<Branch> = VecDeque::new();

        for (rank, (_, postings)) in ranked.iter().enumerate() {
            if postings.binary_search(&slot).is_err() {
                continue;
            }
            let members = vec![rank];
            seen.insert(members.clone());
            if postings.len() == 1 {
                hits.push(members);
            } else {
                frontier.push_back(Branch { members, candidates: postings.to_vec() });
            }
        }
        stats.frontier_peak = frontier.len();

        let mut complete = true;
        let mut level = 1;
        'search: while let Some(branch) = frontier.pop_front() {
            if branch.members.len() > level {
                level = branch.members.len();
                debug!(
                    "Level {level}: {} branch(es) queued, {} hit(s) so far",
                    frontier.len() + 1,
                    hits.len()
                );
            }
            let Some(&last) = branch.members.last() else {
                continue;
            };

            for next in (last + 1)..ranked.len() {
                if meter.exhausted() {
                    complete = false;
                    break 'search;
                }
                meter.branches += 1;

                let narrowed = intersect_sorted(&branch.candidates, ranked[next].1);
                if narrowed.binary_search(&slot).is_err() {
                    continue;
                }
                // A feature that removes nobody can never sit in a minimal set.
                if narrowed.len() == branch.candidates.len() {
                    continue;
                }
                let mut members = branch.members.clone();
                members.push(next);
                if !seen.insert(members.clone()) {
                    continue;
                }
                stats.depth = stats.depth.max(members.len());
                if narrowed.len() == 1 {
                    hits.push(members);
                } else {
                    frontier.push_back(Branch { members, candidates: narrowed });
                }
            }
            stats.frontier_peak = stats.frontier_peak.max(frontier.len());
        }

        let found: Vec<Fingerprint> = hits
            .iter()
            .map(|members| Fingerprint::new(members.iter().map(|&rank| ranked[rank].0.clone())))
            .collect();
        let mut fingerprints: Vec<Fingerprint> = found
            .iter()
            .filter(|candidate| !found.iter().any(|other| candidate.is_strict_superset_of(other)))
            .cloned()
            .collect();
        fingerprints.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        stats.branches = meter.branches;
        stats.elapsed = started.elapsed();

        if !complete {
            warn!(
                "Search budget exhausted for {target} after {} branch(es); {} fingerprint(s) found",
                stats.branches,
                fingerprints.len()
            );
            if fingerprints.is_empty() {
                return Err(SearchError::BudgetExhausted {
                    target: target.clone(),
                    branches: stats.branches,
                    elapsed: stats.elapsed,
                });
            }
        }

        info!(
            "Found {} minimal fingerprint(s) for {target} in {} branch(es)",
            fingerprints.len(),
            stats.branches
        );

        Ok(SearchOutcome { target: target.clone(), fingerprints, complete, stats })
    }
}

/// Run an unbounded search for `target`.
pub fn minimal_fingerprints(
    index: &FeatureIndex,
    target: &MethodId,
) -> Result<SearchOutcome, SearchError> {
    MinimalFingerprintSearch::new(index).run(target)
}
