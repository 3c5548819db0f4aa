//! Session object owning the corpus, the active settings and the index built
//! from them.
//!
//! The index is never mutated in place. A corpus or settings change builds a
//! fresh [`IndexSnapshot`] and swaps the `Arc` under a write lock, so a search
//! that already holds the previous snapshot keeps reading a consistent index.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use log::info;

use crate::features::{FeatureSet, SolverSettings};
use crate::index::{FeatureIndex, IndexError};
use crate::model::{MethodId, MethodRecord};
use crate::render::{FingerprintRenderer, RenderedPattern};
use crate::search::{
    greedy_fingerprint, Fingerprint, MinimalFingerprintSearch, SearchBudget, SearchError,
    SearchOutcome,
};

/// Immutable pairing of a corpus with the index built over it.
#[derive(Debug)]
pub struct IndexSnapshot {
    corpus: Arc<Vec<MethodRecord>>,
    index: FeatureIndex,
}

impl IndexSnapshot {
    pub fn build(corpus: Arc<Vec<MethodRecord>>, settings: SolverSettings) -> Self {
        let index = FeatureIndex::build(&corpus, settings);
        Self { corpus, index }
    }

    pub fn corpus(&self) -> &[MethodRecord] {
        &self.corpus
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn settings(&self) -> SolverSettings {
        self.index.settings()
    }

    pub fn solve(&self, target: &MethodId, budget: &SearchBudget) -> Result<SearchOutcome, SearchError> {
        MinimalFingerprintSearch::new(&self.index).with_budget(budget.clone()).run(target)
    }

    /// Render a fingerprint of `target`, padding parameter slots to its arity.
    pub fn render_fingerprint(
        &self,
        target: &MethodId,
        fingerprint: &Fingerprint,
    ) -> Result<RenderedPattern, IndexError> {
        let arity = self.index.parameter_count(target)?;
        Ok(FingerprintRenderer::new().with_parameter_count(arity).render(fingerprint.iter()))
    }

    /// Render the complete feature set of `target` for diagnostic display.
    pub fn render_full(&self, target: &MethodId) -> Result<RenderedPattern, IndexError> {
        let features = self.index.lookup(target)?;
        let arity = self.index.parameter_count(target)?;
        Ok(FingerprintRenderer::new().with_parameter_count(arity).render(features.iter()))
    }
}

pub struct FingerprintService {
    current: RwLock<Arc<IndexSnapshot>>,
    rebuild_lock: Mutex<()>,
}

impl FingerprintService {
    pub fn new(methods: Vec<MethodRecord>, settings: SolverSettings) -> Self {
        let snapshot = IndexSnapshot::build(Arc::new(methods), settings);
        Self { current: RwLock::new(Arc::new(snapshot)), rebuild_lock: Mutex::new(()) }
    }

    /// The snapshot in effect right now. Holding it pins that version.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn settings(&self) -> SolverSettings {
        self.snapshot().settings()
    }

    /// Replace the corpus, keeping the current settings.
    pub fn set_corpus(&self, methods: Vec<MethodRecord>) {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let settings = self.snapshot().settings();
        self.swap(IndexSnapshot::build(Arc::new(methods), settings));
    }

    /// Replace the settings, keeping the current corpus.
    pub fn set_settings(&self, settings: SolverSettings) {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if current.settings() == settings {
            return;
        }
        self.swap(IndexSnapshot::build(Arc::clone(&current.corpus), settings));
    }

    fn swap(&self, snapshot: IndexSnapshot) {
        info!(
            "Swapping in rebuilt index: {} methods, {} features",
            snapshot.index.len(),
            snapshot.index.feature_count()
        );
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(snapshot);
    }

    pub fn features(&self, target: &MethodId) -> Result<FeatureSet, IndexError> {
        self.snapshot().index().lookup(target).cloned()
    }

    pub fn full_fingerprint(&self, target: &MethodId) -> Result<RenderedPattern, IndexError> {
        self.snapshot().render_full(target)
    }

    pub fn solve(&self, target: &MethodId, budget: &SearchBudget) -> Result<SearchOutcome, SearchError> {
        self.snapshot().solve(target, budget)
    }

    pub fn solve_greedy(&self, target: &MethodId) -> Result<Fingerprint, SearchError> {
        greedy_fingerprint(self.snapshot().index(), target)
    }

    /// Run a search on a worker thread against the snapshot current at call time.
    pub fn spawn_solve(
        &self,
        target: MethodId,
        budget: SearchBudget,
    ) -> JoinHandle<Result<SearchOutcome, SearchError>> {
        let snapshot = self.snapshot();
        thread::spawn(move || snapshot.solve(&target, &budget))
    }
}
