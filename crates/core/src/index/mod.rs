//! Corpus-wide inverted index from feature to the methods exhibiting it.
//!
//! Methods are addressed internally by dense slots (`u32`) assigned in corpus
//! order, so every posting list is a sorted `Vec<u32>` and intersections are a
//! linear merge. An index is immutable once built; a change of corpus or
//! settings means building a new one.

use std::collections::HashMap;

use log::{info, warn};
use thiserror::Error;

use crate::features::{Feature, FeatureExtractor, FeatureSet, SolverSettings};
use crate::model::{MethodId, MethodRecord};

/// Dense method position inside one index.
pub type Slot = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Method ID not found: {0}")]
    NotFound(MethodId),
}

#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    settings: SolverSettings,
    ids: Vec<MethodId>,
    slots: HashMap<MethodId, Slot>,
    feature_sets: Vec<FeatureSet>,
    parameter_counts: Vec<usize>,
    postings: HashMap<Feature, Vec<Slot>>,
}

impl FeatureIndex {
    /// Build the index for `methods` under `settings`.
    ///
    /// A record whose id was already seen replaces the earlier record.
    pub fn build(methods: &[MethodRecord], settings: SolverSettings) -> Self {
        let extractor = FeatureExtractor::new(settings);
        let mut ids = Vec::with_capacity(methods.len());
        let mut slots = HashMap::with_capacity(methods.len());
        let mut feature_sets = Vec::with_capacity(methods.len());
        let mut parameter_counts = Vec::with_capacity(methods.len());

        for method in methods {
            let id = method.id();
            let features = extractor.extract(method);
            match slots.get(&id) {
                Some(&slot) => {
                    warn!("Duplicate method id {id}; keeping the later record");
                    feature_sets[slot as usize] = features;
                    parameter_counts[slot as usize] = method.parameters.len();
                }
                None => {
                    slots.insert(id.clone(), ids.len() as Slot);
                    ids.push(id);
                    feature_sets.push(features);
                    parameter_counts.push(method.parameters.len());
                }
            }
        }

        // Slots are visited in ascending order, so each posting list comes out sorted.
        let mut postings: HashMap<Feature, Vec<Slot>> = HashMap::new();
        for (slot, features) in feature_sets.iter().enumerate() {
            for feature in features {
                postings.entry(feature.clone()).or_default().push(slot as Slot);
            }
        }

        info!(
            "Extracted features for {} methods ({} distinct features, settings: {:?})",
            ids.len(),
            postings.len(),
            settings
        );

        Self { settings, ids, slots, feature_sets, parameter_counts, postings }
    }

    pub fn settings(&self) -> SolverSettings {
        self.settings
    }

    /// Number of distinct methods.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct feature tokens across the corpus.
    pub fn feature_count(&self) -> usize {
        self.postings.len()
    }

    /// Method ids in slot order.
    pub fn ids(&self) -> &[MethodId] {
        &self.ids
    }

    pub fn contains(&self, id: &MethodId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn slot(&self, id: &MethodId) -> Result<Slot, IndexError> {
        self.slots.get(id).copied().ok_or_else(|| IndexError::NotFound(id.clone()))
    }

    pub fn method_id(&self, slot: Slot) -> &MethodId {
        &self.ids[slot as usize]
    }

    /// The feature set of one method.
    pub fn lookup(&self, id: &MethodId) -> Result<&FeatureSet, IndexError> {
        let slot = self.slot(id)?;
        Ok(&self.feature_sets[slot as usize])
    }

    pub fn features_at(&self, slot: Slot) -> &FeatureSet {
        &self.feature_sets[slot as usize]
    }

    /// Declared parameter count of a method, regardless of settings.
    pub fn parameter_count(&self, id: &MethodId) -> Result<usize, IndexError> {
        let slot = self.slot(id)?;
        Ok(self.parameter_counts[slot as usize])
    }

    /// Sorted slots of the methods sharing `feature`. Unknown features have none.
    pub fn candidates(&self, feature: &Feature) -> &[Slot] {
        self.postings.get(feature).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Methods sharing every feature in `features`; the empty combination
    /// matches the whole corpus.
    pub fn candidates_of<'a, I>(&self, features: I) -> Vec<Slot>
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut iter = features.into_iter();
        let mut current = match iter.next() {
            Some(first) => self.candidates(first).to_vec(),
            None => return (0..self.ids.len() as Slot).collect(),
        };
        for feature in iter {
            if current.is_empty() {
                break;
            }
            current = intersect_sorted(&current, self.candidates(feature));
        }
        current
    }

    /// Ids for a list of slots, in the same order.
    pub fn ids_of(&self, slots: &[Slot]) -> Vec<MethodId> {
        slots.iter().map(|&slot| self.method_id(slot).clone()).collect()
    }
}

/// Intersection of two ascending slot lists.
pub fn intersect_sorted(left: &[Slot], right: &[Slot]) -> Vec<Slot> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
