use std::collections::BTreeSet;

use fingerprint_core::features::{Feature, SolverSettings};
use fingerprint_core::index::FeatureIndex;
use fingerprint_core::model::MethodRecord;
use fingerprint_core::search::{greedy_fingerprint, minimal_fingerprints, Fingerprint, SearchError};
use proptest::prelude::*;

fn method_strategy() -> impl Strategy<Value = MethodRecord> {
    (
        prop::sample::select(vec!["LA;", "LB;", "LC;"]),
        prop::sample::select(vec!["a", "b", "c", "d"]),
        prop::sample::select(vec!["V", "I", "Z"]),
        prop::collection::vec(prop::sample::select(vec!["I", "J"]), 0..3),
        prop::collection::vec(prop::sample::select(vec!["x", "y", "z"]), 0..3),
        prop::sample::select(vec![0x1u32, 0x2, 0x9]),
    )
        .prop_map(|(class, name, ret, params, strings, flags)| {
            MethodRecord::new(class, name, ret)
                .with_parameters(params)
                .with_strings(strings)
                .with_access_flags(flags)
        })
}

/// Every inclusion-minimal isolating subset, found by trying all of them.
fn brute_force(index: &FeatureIndex, features: &[Feature], slot: u32) -> Vec<Fingerprint> {
    let mut isolating = Vec::new();
    for mask in 1u32..(1 << features.len()) {
        let subset: Vec<Feature> = features
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, f)| f.clone())
            .collect();
        if index.candidates_of(subset.iter()) == vec![slot] {
            isolating.push(Fingerprint::new(subset));
        }
    }
    let mut minimal: Vec<Fingerprint> = isolating
        .iter()
        .filter(|fp| !isolating.iter().any(|other| fp.is_strict_superset_of(other)))
        .cloned()
        .collect();
    minimal.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    minimal
}

proptest! {
    #[test]
    fn search_matches_exhaustive_enumeration(
        methods in prop::collection::vec(method_strategy(), 1..7),
        pick in 0usize..7,
    ) {
        let index = FeatureIndex::build(&methods, SolverSettings::default());
        let ids = index.ids().to_vec();
        let target = &ids[pick % ids.len()];
        let slot = index.slot(target).expect("slot");
        let features: Vec<Feature> = index.lookup(target).expect("lookup").to_vec();
        let expected = brute_force(&index, &features, slot);

        match minimal_fingerprints(&index, target) {
            Ok(outcome) => {
                prop_assert!(outcome.complete);
                prop_assert_eq!(outcome.fingerprints, expected);
            }
            Err(SearchError::DistinguishingImpossible { .. }) => prop_assert!(expected.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn greedy_is_distinguishing_and_inclusion_minimal(
        methods in prop::collection::vec(method_strategy(), 1..7),
        pick in 0usize..7,
    ) {
        let index = FeatureIndex::build(&methods, SolverSettings::default());
        let ids = index.ids().to_vec();
        let target = &ids[pick % ids.len()];
        let slot = index.slot(target).expect("slot");

        if let Ok(fingerprint) = greedy_fingerprint(&index, target) {
            prop_assert!(!fingerprint.is_empty());
            prop_assert_eq!(index.candidates_of(fingerprint.iter()), vec![slot]);
            let features: BTreeSet<&Feature> = fingerprint.iter().collect();
            if features.len() > 1 {
                for dropped in &features {
                    let rest = features.iter().copied().filter(|f| f != dropped);
                    prop_assert!(index.candidates_of(rest).len() > 1);
                }
            }
        }
    }
}
