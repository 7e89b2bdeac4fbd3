//! Sampler for the symmetric weight model.
//!
//! Here the weight of a node depends only on its number of parents, `w[k]`, so
//! node labels can be ignored until the very end. Sampling is done in two
//! steps:
//!
//! 1. Draw the *partition*: the sizes of the layers of the DAG, where layer
//!    `j` holds the nodes whose longest path from a root has length `j`.
//!    Every node of layer `j >= 1` has at least one parent in layer `j-1`.
//! 2. Shuffle the labels into the layers and draw the parents of every node
//!    from the earlier layers.
//!
//! Both steps rely on two tables built once:
//!
//! ```text
//! hw[r][t]  = aggregated weight of a node choosing its parents among t
//!             earlier nodes so that at least one of r specific ones is hit
//!             (hw[0][t]: no constraint)
//! rus[r][u] = weighted number of ways to complete a DAG on u remaining
//!             nodes whose first remaining layer has exactly r nodes
//! ```

use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dag::{Dag, Partition};
use crate::error::{Error, Result};
use crate::lognum::LogProb;
use crate::sampler::Sampler;
use crate::sampling::{choose_cumulative, choose_index, cumulative};
use crate::weights::SymmetricWeights;

/// Square table indexed `[r][t]` (or `[r][u]`), both in `0..=n`.
pub type Table = Vec<Vec<LogProb>>;

/// Builds the hat-weight table `hw`.
///
/// ```text
/// hw[0][t] = Σ_{j=0..t} C(t, j)     w[j]
/// hw[1][t] = Σ_{j=1..t} C(t-1, j-1) w[j]
/// hw[r][t] = hw[1][t] + hw[r-1][t-1]          for 2 <= r <= min(l_bound, t)
/// ```
///
/// The last line splits the parent sets hitting one of `r` specific nodes by
/// whether they contain the first of them. Cells not listed are zero.
pub fn hat_weights(n: usize, l_bound: usize, weights: &SymmetricWeights) -> Table {
    let mut hw = vec![vec![LogProb::zero(); n + 1]; n + 1];

    for t in 0..n {
        hw[0][t] = (0..=t).map(|j| LogProb::binomial(t, j) * weights.get(j)).sum();
    }
    for t in 1..n {
        hw[1][t] = (1..=t).map(|j| LogProb::binomial(t - 1, j - 1) * weights.get(j)).sum();
    }
    for t in 1..n {
        for r in 2..=l_bound.min(t) {
            hw[r][t] = hw[1][t] + hw[r - 1][t - 1];
        }
    }

    hw
}

/// Builds the continuation table `rus` from `hw`.
///
/// ```text
/// rus[i][i] = 1                      for i <= min(n, l_bound)
/// rus[0][u] = 0                      for u > 0
/// rus[r][u] = Σ_{r'=1..min(u-r, l_bound)} hw[r][n-u+r]^r' · C(u-r, r') · rus[r'][u-r]
/// ```
///
/// for `1 <= r <= min(u-1, l_bound)`: after a layer of `r` nodes, the next
/// layer has `r'` nodes, each of which needs a parent in the `r`-layer.
pub fn continuation_counts(n: usize, l_bound: usize, hw: &Table) -> Table {
    let mut rus = vec![vec![LogProb::zero(); n + 1]; n + 1];

    for (i, row) in rus.iter_mut().enumerate().take(n.min(l_bound) + 1) {
        row[i] = LogProb::one();
    }

    for u in 1..=n {
        for r in 1..=(u - 1).min(l_bound) {
            let rest = u - r;
            rus[r][u] = (1..=rest.min(l_bound))
                .map(|rp| hw[r][n - u + r].powi(rp) * LogProb::binomial(rest, rp) * rus[rp][rest])
                .sum();
        }
    }

    rus
}

/// Weight of all DAG completions whose next layer has `r` of the `u` remaining
/// nodes, given that the previous layer had `previous` nodes.
///
/// ```text
/// hw[previous][n-u]^r · rus[r][u] · C(u, r)
/// ```
pub fn compatible_dags(n: usize, u: usize, r: usize, previous: usize, hw: &Table, rus: &Table) -> LogProb {
    debug_assert!(1 <= r && r <= u && u <= n);
    hw[previous][n - u].powi(r) * rus[r][u] * LogProb::binomial(u, r)
}

/// Draws the layer sizes, first layer first.
pub fn sample_partition<R: Rng + ?Sized>(n: usize, l_bound: usize, hw: &Table, rus: &Table, rng: &mut R) -> Partition {
    let mut partition = Partition::new();
    let mut previous = 0;

    while partition.total() < n {
        let u = n - partition.total();
        let weights: Vec<LogProb> = (1..=u.min(l_bound))
            .map(|r| compatible_dags(n, u, r, previous, hw, rus))
            .collect();
        let r = 1 + choose_index(&weights, rng).expect("a reachable state has a positive continuation weight");
        trace!("sample_partition: u = {}, previous = {} -> r = {}", u, previous, r);
        partition.push(r);
        previous = r;
    }

    partition
}

/// Draws the labels and parents of a DAG with the given layer sizes.
///
/// Labels are a uniform permutation of `0..n` cut into the layers. For a node
/// of layer `j >= 1`, the parents intersect layer `j-1`; they are drawn by
/// first choosing the *anchor*, the smallest-labelled parent inside layer
/// `j-1`, and then the rest among the earlier layers and the larger-labelled
/// members of layer `j-1`.
pub fn sample_parents<R: Rng + ?Sized>(
    n: usize,
    weights: &SymmetricWeights,
    hw: &Table,
    partition: &Partition,
    rng: &mut R,
) -> Dag {
    let mut labels: Vec<usize> = (0..n).collect();
    labels.shuffle(rng);

    let mut layers: Vec<&[usize]> = Vec::with_capacity(partition.num_layers());
    let mut start = 0;
    for &size in partition.sizes() {
        layers.push(&labels[start..start + size]);
        start += size;
    }

    let mut dag = Dag::empty(n);
    let mut ancestors: Vec<usize> = Vec::new();

    for j in 1..layers.len() {
        let parent_layer = layers[j - 1];

        // Candidate pool for every possible anchor.
        let pools: Vec<Vec<usize>> = parent_layer
            .iter()
            .map(|&x| {
                let mut px = ancestors.clone();
                px.extend(parent_layer.iter().copied().filter(|&y| y > x));
                px
            })
            .collect();
        let anchors = cumulative(pools.iter().map(|px| hw[1][px.len() + 1]));

        for &node in layers[j] {
            let xi = choose_cumulative(&anchors, rng).expect("every layer has a positive anchor weight");
            let mut px = pools[xi].clone();

            let sizes: Vec<LogProb> = (1..=px.len() + 1)
                .map(|g| LogProb::binomial(px.len(), g - 1) * weights.get(g))
                .collect();
            let g = 1 + choose_index(&sizes, rng).expect("an anchor has a positive parent-set weight");

            let (chosen, _) = px.partial_shuffle(rng, g - 1);
            dag.set_parents(node, chosen.iter().copied().chain([parent_layer[xi]]));
        }

        ancestors.extend_from_slice(parent_layer);
    }

    dag
}

/// Preprocessed sampler for [`SymmetricWeights`].
#[derive(Debug, Clone)]
pub struct SymmetricSampler {
    weights: SymmetricWeights,
    layer_bound: usize,
    hw: Table,
    rus: Table,
    total: LogProb,
}

impl SymmetricSampler {
    /// Runs the preprocessing.
    ///
    /// Fails with [`Error::NoDag`] if every DAG has zero weight.
    pub fn new(weights: SymmetricWeights) -> Result<Self> {
        let n = weights.num_nodes();
        let layer_bound = n;

        debug!("SymmetricSampler::new(n = {})", n);
        let hw = hat_weights(n, layer_bound, &weights);
        let rus = continuation_counts(n, layer_bound, &hw);

        let total: LogProb = (1..=n.min(layer_bound)).map(|r| compatible_dags(n, n, r, 0, &hw, &rus)).sum();
        debug!("SymmetricSampler::new: total weight = {}", total);
        if total.is_zero() {
            return Err(Error::NoDag);
        }

        Ok(Self {
            weights,
            layer_bound,
            hw,
            rus,
            total,
        })
    }

    pub fn weights(&self) -> &SymmetricWeights {
        &self.weights
    }

    pub fn hat_weights(&self) -> &Table {
        &self.hw
    }

    pub fn continuation_counts(&self) -> &Table {
        &self.rus
    }

    pub fn sample_partition<R: Rng + ?Sized>(&self, rng: &mut R) -> Partition {
        sample_partition(self.num_nodes(), self.layer_bound, &self.hw, &self.rus, rng)
    }

    pub fn sample_parents<R: Rng + ?Sized>(&self, partition: &Partition, rng: &mut R) -> Dag {
        sample_parents(self.num_nodes(), &self.weights, &self.hw, partition, rng)
    }
}

impl Sampler for SymmetricSampler {
    fn num_nodes(&self) -> usize {
        self.weights.num_nodes()
    }

    fn total_weight(&self) -> LogProb {
        self.total
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Dag {
        let partition = self.sample_partition(rng);
        trace!("partition = {:?}", partition.sizes());
        self.sample_parents(&partition, rng)
    }
}
