use fingerprint_core::features::{Feature, SolverSettings};
use fingerprint_core::index::{intersect_sorted, FeatureIndex, IndexError};
use fingerprint_core::model::{MethodId, MethodRecord};

fn corpus() -> Vec<MethodRecord> {
    vec![
        MethodRecord::new("LA;", "a", "V").with_access_flags(1).with_parameters(["I"]),
        MethodRecord::new("LB;", "b", "V").with_access_flags(1).with_strings(["hello"]),
        MethodRecord::new("LC;", "c", "Z").with_access_flags(9).with_parameters(["I", "J"]),
    ]
}

#[test]
fn posting_lists_follow_corpus_order() {
    let index = FeatureIndex::build(&corpus(), SolverSettings::default());
    assert_eq!(index.len(), 3);
    assert_eq!(index.candidates(&Feature::return_type("V")), &[0, 1]);
    assert_eq!(index.candidates(&Feature::parameter(0, "I")), &[0, 2]);
    assert_eq!(index.candidates(&Feature::access_flags(9)), &[2]);
    assert!(index.candidates(&Feature::string("missing")).is_empty());
}

#[test]
fn candidates_of_intersects_every_feature() {
    let index = FeatureIndex::build(&corpus(), SolverSettings::default());
    let combo = [Feature::return_type("V"), Feature::access_flags(1)];
    assert_eq!(index.candidates_of(combo.iter()), vec![0, 1]);

    let isolating = [Feature::return_type("V"), Feature::parameter(0, "I")];
    assert_eq!(index.ids_of(&index.candidates_of(isolating.iter())), vec![MethodId::from("LA;a(I)V")]);

    assert_eq!(index.candidates_of(std::iter::empty()), vec![0, 1, 2]);
}

#[test]
fn lookup_returns_feature_set_and_arity() {
    let index = FeatureIndex::build(&corpus(), SolverSettings::default());
    let id = MethodId::from("LC;c(IJ)Z");
    let features = index.lookup(&id).expect("lookup");
    assert_eq!(features.len(), 4);
    assert_eq!(index.parameter_count(&id).expect("arity"), 2);
    assert!(index.contains(&id));
}

#[test]
fn unknown_ids_report_not_found() {
    let index = FeatureIndex::build(&corpus(), SolverSettings::default());
    let missing = MethodId::from("LZ;nope()V");
    let err = index.lookup(&missing).unwrap_err();
    assert_eq!(err, IndexError::NotFound(missing.clone()));
    assert_eq!(err.to_string(), "Method ID not found: LZ;nope()V");
}

#[test]
fn later_duplicate_record_replaces_earlier_one() {
    let mut methods = corpus();
    methods.push(MethodRecord::new("LA;", "a", "V").with_access_flags(2).with_parameters(["I"]));
    let index = FeatureIndex::build(&methods, SolverSettings::default());

    assert_eq!(index.len(), 3);
    let features = index.lookup(&MethodId::from("LA;a(I)V")).expect("lookup");
    assert!(features.contains(&Feature::access_flags(2)));
    assert!(!features.contains(&Feature::access_flags(1)));
    assert_eq!(index.candidates(&Feature::access_flags(1)), &[1]);
}

#[test]
fn settings_shape_the_feature_universe() {
    let settings = SolverSettings { use_access_flags: false, use_strings: false, ..Default::default() };
    let index = FeatureIndex::build(&corpus(), settings);
    assert_eq!(index.settings(), settings);
    assert!(index.candidates(&Feature::access_flags(1)).is_empty());
    assert!(index.candidates(&Feature::string("hello")).is_empty());
    // returnType|V, returnType|Z, parameter_0|I, parameter_1|J
    assert_eq!(index.feature_count(), 4);
}

#[test]
fn empty_corpus_builds_an_empty_index() {
    let index = FeatureIndex::build(&[], SolverSettings::default());
    assert!(index.is_empty());
    assert_eq!(index.feature_count(), 0);
}

#[test]
fn intersect_sorted_merges_ascending_lists() {
    assert_eq!(intersect_sorted(&[0, 2, 4, 6], &[1, 2, 3, 6, 7]), vec![2, 6]);
    assert!(intersect_sorted(&[], &[1, 2]).is_empty());
}
