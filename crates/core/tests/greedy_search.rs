use fingerprint_core::features::SolverSettings;
use fingerprint_core::index::FeatureIndex;
use fingerprint_core::model::{MethodId, MethodRecord};
use fingerprint_core::search::{greedy_fingerprint, minimal_fingerprints, SearchError};

fn corpus() -> Vec<MethodRecord> {
    vec![
        MethodRecord::new("LA;", "target", "V")
            .with_access_flags(1)
            .with_parameters(["I", "J"])
            .with_strings(["hello"]),
        MethodRecord::new("LA;", "sameReturn", "V").with_access_flags(1).with_parameters(["J", "J"]),
        MethodRecord::new("LB;", "sameParam", "Z").with_access_flags(1).with_parameters(["I", "I"]),
        MethodRecord::new("LB;", "sameSecond", "Z").with_access_flags(1).with_parameters(["Z", "J"]),
    ]
}

#[test]
fn greedy_picks_the_rarest_isolating_feature() {
    let index = FeatureIndex::build(&corpus(), SolverSettings::default());
    let fingerprint = greedy_fingerprint(&index, &MethodId::from("LA;target(IJ)V")).expect("greedy");
    let tokens: Vec<&str> = fingerprint.iter().map(|f| f.token()).collect();
    assert_eq!(tokens, vec!["strings|hello"]);
}

#[test]
fn greedy_result_is_one_of_the_minimal_fingerprints() {
    let settings = SolverSettings { use_strings: false, ..Default::default() };
    let index = FeatureIndex::build(&corpus(), settings);
    let id = MethodId::from("LA;target(IJ)V");

    let greedy = greedy_fingerprint(&index, &id).expect("greedy");
    let slot = index.slot(&id).expect("slot");
    assert_eq!(index.candidates_of(greedy.iter()), vec![slot]);

    let all = minimal_fingerprints(&index, &id).expect("exhaustive");
    assert!(all.fingerprints.contains(&greedy), "{greedy} should be minimal");
}

#[test]
fn greedy_reports_the_same_errors_as_the_exhaustive_search() {
    let mut methods = corpus();
    methods.push(
        MethodRecord::new("LC;", "target", "V")
            .with_access_flags(1)
            .with_parameters(["I", "J"])
            .with_strings(["hello"]),
    );
    let index = FeatureIndex::build(&methods, SolverSettings::default());
    let err = greedy_fingerprint(&index, &MethodId::from("LA;target(IJ)V")).unwrap_err();
    assert!(matches!(err, SearchError::DistinguishingImpossible { count: 1, .. }));

    let missing = MethodId::from("LX;x()V");
    assert_eq!(greedy_fingerprint(&index, &missing).unwrap_err(), SearchError::NotFound(missing));
}
