use log::{debug, info};

use crate::index::{intersect_sorted, FeatureIndex, Slot};
use crate::model::MethodId;
use crate::search::{rank_target, Fingerprint, RankedTarget, SearchError};

/// Find one minimal fingerprint quickly, without enumerating all of them.
///
/// Greedy set cover picks, at each step, the target feature that removes the
/// most remaining candidates. A reverse-deletion pass then drops every picked
/// feature the others make redundant, so the result is inclusion-minimal
/// (though not necessarily of minimum size).
pub fn greedy_fingerprint(index: &FeatureIndex, target: &MethodId) -> Result<Fingerprint, SearchError> {
    let RankedTarget { slot, ranked } = rank_target(index, target)?;
    info!("Greedy fingerprint for {target}: {} feature(s)", ranked.len());

    let mut remaining: Vec<Slot> = (0..index.len() as Slot).collect();
    let mut picked: Vec<usize> = Vec::new();

    while remaining.len() > 1 || picked.is_empty() {
        let best = (0..ranked.len())
            .filter(|rank| !picked.contains(rank))
            .map(|rank| (rank, intersect_sorted(&remaining, ranked[rank].1)))
            .min_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| a.0.cmp(&b.0)));

        let Some((rank, narrowed)) = best else {
            break;
        };
        // Up-front checks guarantee the full set isolates the target, so a
        // step that narrows nothing only happens once the target is alone.
        if narrowed.len() == remaining.len() && !picked.is_empty() {
            break;
        }
        debug!("Picked {} ({} candidate(s) left)", ranked[rank].0, narrowed.len());
        picked.push(rank);
        remaining = narrowed;
    }

    if remaining.len() != 1 || remaining[0] != slot {
        let colliding = index.ids_of(&remaining);
        let colliding: Vec<MethodId> = colliding.into_iter().filter(|id| id != target).collect();
        return Err(SearchError::DistinguishingImpossible {
            target: target.clone(),
            count: colliding.len(),
            colliding,
        });
    }

    let mut kept = picked.clone();
    for rank in picked.iter().rev() {
        if kept.len() == 1 {
            break;
        }
        let trial: Vec<usize> = kept.iter().copied().filter(|r| r != rank).collect();
        let candidates = index.candidates_of(trial.iter().map(|&r| ranked[r].0));
        if candidates.len() == 1 && candidates[0] == slot {
            kept = trial;
        }
    }

    Ok(Fingerprint::new(kept.into_iter().map(|rank| ranked[rank].0.clone())))
}
