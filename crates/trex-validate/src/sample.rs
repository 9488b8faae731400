//! Seeded sampling of extracted triplets
//!
//! Validation is paid per request, so large extractions are usually
//! checked on a sample.

use rand::rngs::StdRng;
use rand::SeedableRng;
use trex_core::Triplet;

/// Pick up to `n` triplets uniformly without replacement.
///
/// The result keeps discovery order and is reproducible for a given seed.
pub fn sample_triplets(triplets: &[Triplet], n: usize, seed: u64) -> Vec<Triplet> {
    if n >= triplets.len() {
        return triplets.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, triplets.len(), n).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| triplets[i].clone()).collect()
}
