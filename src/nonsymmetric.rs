//! Sampler for the nonsymmetric weight model.
//!
//! Every node `i` has its own weight `w_i[S]` for every parent set `S`. The DAG
//! is drawn through its *layering*: layer 1 holds the roots and every node of
//! layer `j >= 2` has at least one parent in layer `j-1` and all its parents in
//! layers `< j`. The layering of a DAG is unique, so summing over layerings
//! sums over DAGs exactly once.
//!
//! Two families of tables are built once:
//!
//! ```text
//! h[i](R, U)  (R ⊆ U, i ∉ U)
//!     total weight of parent sets S ⊆ U of node i that intersect R;
//!     h[i](0, U) is the total weight of all S ⊆ U
//! fs(S, U)    (S ⊆ U)
//!     total weight of all ways to arrange the nodes of U into layers whose
//!     first layer is S, with everything outside U already placed before
//! ```
//!
//! Sampling first draws the layers one by one, each proportionally to the mass
//! of completions it admits, and then draws every parent set directly from the
//! weights.

use log::{debug, trace};
use rand::Rng;

use crate::bits::{expand_bits, full_mask, Mask, Ones, Submasks};
use crate::dag::{Dag, Layering};
use crate::error::{Error, Result};
use crate::lognum::LogProb;
use crate::sampler::Sampler;
use crate::sampling::{choose_cumulative, cumulative};
use crate::subtable::{SubsetTable, MAX_NODES};
use crate::weights::NonsymmetricWeights;

/// Sum-over-subsets transform of `values` restricted to the bits of `universe`:
/// afterwards `values[t] = Σ_{s ⊆ t} values_before[s]` for every `t ⊆ universe`.
fn sum_over_subsets(values: &mut [LogProb], universe: Mask) {
    for bit in Ones::new(universe) {
        let b = 1 << bit;
        for t in 0..values.len() {
            if t & b != 0 {
                let lower = values[t ^ b];
                values[t] += lower;
            }
        }
    }
}

/// Builds the hat-weight tables, one [`SubsetTable`] per node.
///
/// For node `i` and every `t ⊆ V \ {i}`:
///
/// ```text
/// h[i](0, t)   = Σ_{S ⊆ t} w_i[S]
/// h[i]({p}, t) = Σ_{S ⊆ t, p ∈ S} w_i[S]                       (p ∈ t)
/// h[i](R, t)   = h[i]({k}, t) + h[i](R \ {k}, t \ {k})         (k = lowest bit of R)
/// ```
///
/// The last line unrolls to `Σ_{k ∈ R} h[i]({k}, t \ {bits of R below k})`:
/// every parent set meeting `R` is counted once, at the lowest bit of `R` it
/// contains. Supersets are processed in increasing order, so `t \ {k}` is
/// always ready.
pub fn hat_weights(weights: &NonsymmetricWeights) -> Vec<SubsetTable<LogProb>> {
    let n = weights.num_nodes();
    let all = full_mask(n);

    (0..n)
        .map(|i| {
            debug!("hat_weights: node {}", i);
            let others = all & !(1 << i);
            let mut h = SubsetTable::new(n);

            // Base case: mass of all parent sets inside t.
            let mut totals = weights.parent_weights(i).to_vec();
            sum_over_subsets(&mut totals, others);

            // Singletons: mass of parent sets inside t containing p.
            for p in Ones::new(others) {
                let mut containing: Vec<LogProb> = weights
                    .parent_weights(i)
                    .iter()
                    .enumerate()
                    .map(|(s, &w)| if s & (1 << p) != 0 { w } else { LogProb::zero() })
                    .collect();
                sum_over_subsets(&mut containing, others);
                for t in Submasks::new(others).filter(|t| t & (1 << p) != 0) {
                    h.set(1 << p, t, containing[t as usize]);
                }
            }

            h.set(0, 0, totals[0]);
            for t in (1..=others).filter(|t| t & !others == 0) {
                h.set(0, t, totals[t as usize]);
                for r in Submasks::new(t).filter(|r| r.count_ones() > 1) {
                    let low = r & r.wrapping_neg();
                    let value = h[(low, t)] + h[(r ^ low, t ^ low)];
                    h.set(r, t, value);
                }
            }

            h
        })
        .collect()
}

/// Builds the forward table `fs`, supersets in increasing order.
///
/// ```text
/// fs(0, 0) = 1
/// fs(U, U) = 1
/// fs(S, U) = Σ_{∅ ≠ S1 ⊆ U\S} [Π_{i ∈ S1} h[i](S, V \ (U\S))] · fs(S1, U\S)
/// ```
///
/// The product over `S1` is built incrementally over the compressed submasks
/// of `U\S`, each one extending a smaller one by its lowest node.
pub fn forward_table(n: usize, h: &[SubsetTable<LogProb>]) -> SubsetTable<LogProb> {
    let all = full_mask(n);
    let mut fs = SubsetTable::new(n);
    fs.set(0, 0, LogProb::one());

    let mut products = vec![LogProb::zero(); 1 << n];
    let mut links = Vec::with_capacity(n);

    for u in 1..=all {
        for s in Submasks::new(u) {
            if s == u {
                fs.set(s, u, LogProb::one());
                continue;
            }
            let rest = u & !s;
            let placed = all & !rest;

            links.clear();
            links.extend(Ones::new(rest).map(|i| h[i][(s, placed)]));

            let mut sum = LogProb::zero();
            products[0] = LogProb::one();
            for c in 1..1u32 << rest.count_ones() {
                let low = c & c.wrapping_neg();
                products[c as usize] = products[(c ^ low) as usize] * links[low.trailing_zeros() as usize];
                sum += products[c as usize] * fs[(expand_bits(c, rest), rest)];
            }
            fs.set(s, u, sum);
        }
    }

    fs
}

/// Draws the layering, sentinel first.
///
/// With `U` the unplaced nodes and `P` the last placed layer, the next layer
/// `R ⊆ U` has weight
///
/// ```text
/// prefix · Π_{i ∈ R} h[i](P, V \ U) · fs(R, U)
/// ```
///
/// where `prefix` is the mass already fixed by the placed layers (each one
/// linked to its predecessor). It is common to all candidates.
pub fn sample_layering<R: Rng + ?Sized>(
    n: usize,
    h: &[SubsetTable<LogProb>],
    fs: &SubsetTable<LogProb>,
    rng: &mut R,
) -> Layering {
    let all = full_mask(n);
    let mut layering = Layering::new();
    let mut prefix = LogProb::one();

    loop {
        let placed = layering.covered();
        if placed == all {
            break;
        }
        let remaining = all & !placed;
        let previous = layering.last();
        let link = |r: Mask| -> LogProb { Ones::new(r).map(|i| h[i][(previous, placed)]).product() };

        let candidates: Vec<Mask> = Submasks::new(remaining).collect();
        let bounds = cumulative(candidates.iter().map(|&r| prefix * link(r) * fs[(r, remaining)]));
        let index = choose_cumulative(&bounds, rng).expect("a reachable state has a positive continuation weight");
        let layer = candidates[index];

        trace!("sample_layering: remaining = {:#b} -> layer = {:#b}", remaining, layer);
        prefix *= link(layer);
        layering.push(layer);
    }

    layering
}

/// Draws the parent set of every node given the layering.
///
/// Nodes of the first real layer get no parents. A node of a later layer gets
/// a set `G` of nodes from earlier layers that meets the immediately preceding
/// layer, with probability proportional to `w_node[G]`.
pub fn sample_parents<R: Rng + ?Sized>(weights: &NonsymmetricWeights, layering: &Layering, rng: &mut R) -> Dag {
    let mut dag = Dag::empty(weights.num_nodes());
    let layers = layering.layers();
    let mut available = layers.first().copied().unwrap_or(0);

    for pair in layers.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        let candidates: Vec<Mask> = Submasks::new(available).filter(|g| g & previous != 0).collect();

        for node in Ones::new(current) {
            let bounds = cumulative(candidates.iter().map(|&g| weights.get(node, g)));
            let index = choose_cumulative(&bounds, rng).expect("a sampled layer admits a positive parent set");
            dag.set_parents(node, Ones::new(candidates[index]));
        }

        available |= current;
    }

    dag
}

/// Preprocessed sampler for [`NonsymmetricWeights`].
#[derive(Debug, Clone)]
pub struct NonsymmetricSampler {
    weights: NonsymmetricWeights,
    h: Vec<SubsetTable<LogProb>>,
    fs: SubsetTable<LogProb>,
    total: LogProb,
}

impl NonsymmetricSampler {
    /// Runs the preprocessing.
    ///
    /// Fails with [`Error::TooManyNodes`] beyond 30 nodes and with
    /// [`Error::NoDag`] if every DAG has zero weight.
    pub fn new(weights: NonsymmetricWeights) -> Result<Self> {
        let n = weights.num_nodes();
        if n > MAX_NODES {
            return Err(Error::TooManyNodes { got: n, max: MAX_NODES });
        }

        debug!("NonsymmetricSampler::new(n = {})", n);
        let h = hat_weights(&weights);
        let fs = forward_table(n, &h);
        debug!("NonsymmetricSampler::new: {} cells per table", fs.len());

        let all = full_mask(n);
        let total: LogProb = Submasks::new(all)
            .map(|r| Ones::new(r).map(|i| h[i][(0, 0)]).product::<LogProb>() * fs[(r, all)])
            .sum();
        debug!("NonsymmetricSampler::new: total weight = {}", total);
        if total.is_zero() {
            return Err(Error::NoDag);
        }

        Ok(Self { weights, h, fs, total })
    }

    pub fn weights(&self) -> &NonsymmetricWeights {
        &self.weights
    }

    /// Hat-weight table of `node`.
    pub fn hat_weights(&self, node: usize) -> &SubsetTable<LogProb> {
        &self.h[node]
    }

    pub fn forward_table(&self) -> &SubsetTable<LogProb> {
        &self.fs
    }

    pub fn sample_layering<R: Rng + ?Sized>(&self, rng: &mut R) -> Layering {
        sample_layering(self.num_nodes(), &self.h, &self.fs, rng)
    }

    pub fn sample_parents<R: Rng + ?Sized>(&self, layering: &Layering, rng: &mut R) -> Dag {
        sample_parents(&self.weights, layering, rng)
    }
}

impl Sampler for NonsymmetricSampler {
    fn num_nodes(&self) -> usize {
        self.weights.num_nodes()
    }

    fn total_weight(&self) -> LogProb {
        self.total
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Dag {
        let layering = self.sample_layering(rng);
        self.sample_parents(&layering, rng)
    }
}
