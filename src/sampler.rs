//! Common interface of the two DAG samplers.

use rand::Rng;

use crate::dag::Dag;
use crate::lognum::LogProb;

/// A preprocessed sampler that draws independent DAGs.
///
/// Construction does all the preprocessing; after that the sampler is
/// immutable, so any number of draws can share it (also across threads, each
/// with its own random source).
pub trait Sampler {
    /// Number of nodes of the sampled DAGs.
    fn num_nodes(&self) -> usize;

    /// Sum of the weights of all DAGs on `num_nodes()` nodes.
    fn total_weight(&self) -> LogProb;

    /// Draws one DAG with probability proportional to its weight.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Dag;

    /// Draws `count` independent DAGs.
    fn sample_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Dag> {
        (0..count).map(|_| self.sample(rng)).collect()
    }
}
