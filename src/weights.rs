//! Weight models consumed by the engines.
//!
//! - [`SymmetricWeights`]: the weight of a node depends only on how many
//!   parents it has.
//! - [`NonsymmetricWeights`]: the weight of a node depends on its exact parent
//!   set, given as a bitmask.
//!
//! The weight of a DAG is the product of the weights of its nodes. All values
//! are [`LogProb`]s; a zero weight forbids the configuration.

use std::collections::HashSet;

use crate::bits::{full_mask, Mask};
use crate::error::{Error, Result};
use crate::lognum::LogProb;
use crate::subtable::MAX_NODES;

fn check_weight(w: LogProb) -> Result<()> {
    if w.ln().is_nan() || w.ln() == f64::INFINITY {
        return Err(Error::InvalidWeights(format!("weight {} is not a finite log value", w.ln())));
    }
    Ok(())
}

/// Weights indexed by the number of parents.
///
/// Entry `k` is the weight of a node with exactly `k` parents, for `k` in
/// `0..n`. A node never has `n` parents, so `n` entries are enough.
#[derive(Debug, Clone)]
pub struct SymmetricWeights {
    weights: Vec<LogProb>,
}

impl SymmetricWeights {
    pub fn new(weights: Vec<LogProb>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidWeights("at least one node is required".to_string()));
        }
        for &w in &weights {
            check_weight(w)?;
        }
        Ok(Self { weights })
    }

    /// Every DAG on `n` nodes gets the same weight.
    pub fn uniform(n: usize) -> Result<Self> {
        Self::new(vec![LogProb::one(); n])
    }

    /// Forbid more than `max_in_degree` parents per node.
    pub fn with_max_in_degree(mut self, max_in_degree: usize) -> Self {
        for w in self.weights.iter_mut().skip(max_in_degree + 1) {
            *w = LogProb::zero();
        }
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.weights.len()
    }

    /// Weight for exactly `k` parents (zero for `k >= n`).
    pub fn get(&self, k: usize) -> LogProb {
        self.weights.get(k).copied().unwrap_or_else(LogProb::zero)
    }

    pub fn as_slice(&self) -> &[LogProb] {
        &self.weights
    }
}

/// Weights indexed by the exact parent set of every node.
///
/// Stored densely: `2^n` values per node, so `n` is limited to 30.
#[derive(Debug, Clone)]
pub struct NonsymmetricWeights {
    names: Vec<String>,
    weights: Vec<Vec<LogProb>>,
}

impl NonsymmetricWeights {
    /// All-zero weights over nodes named `0..n`.
    pub fn new(n: usize) -> Result<Self> {
        Self::with_names((0..n).map(|i| i.to_string()).collect())
    }

    /// All-zero weights over the given node names (node `i` is `names[i]`).
    pub fn with_names(names: Vec<String>) -> Result<Self> {
        let n = names.len();
        if n == 0 {
            return Err(Error::InvalidWeights("at least one node is required".to_string()));
        }
        if n > MAX_NODES {
            return Err(Error::TooManyNodes { got: n, max: MAX_NODES });
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidWeights(format!("duplicate node name '{}'", name)));
            }
        }
        Ok(Self {
            names,
            weights: vec![vec![LogProb::zero(); 1 << n]; n],
        })
    }

    /// Every parent set of every node gets weight one.
    pub fn uniform(n: usize) -> Result<Self> {
        let mut weights = Self::new(n)?;
        for node in 0..n {
            let others = full_mask(n) & !(1 << node);
            for parents in 0..=others {
                if parents & !others == 0 {
                    weights.weights[node][parents as usize] = LogProb::one();
                }
            }
        }
        Ok(weights)
    }

    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    /// Index of the node called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Set the weight of `node` having exactly the parents in `parents`.
    pub fn set(&mut self, node: usize, parents: Mask, weight: LogProb) -> Result<()> {
        let n = self.num_nodes();
        if node >= n {
            return Err(Error::InvalidWeights(format!("node {} out of range 0..{}", node, n)));
        }
        if parents & !full_mask(n) != 0 {
            return Err(Error::InvalidWeights(format!("parent set {:#b} names unknown nodes", parents)));
        }
        if parents & (1 << node) != 0 {
            return Err(Error::InvalidWeights(format!("node '{}' cannot be its own parent", self.names[node])));
        }
        check_weight(weight)?;
        self.weights[node][parents as usize] = weight;
        Ok(())
    }

    /// Weight of `node` having exactly the parents in `parents`.
    #[inline]
    pub fn get(&self, node: usize, parents: Mask) -> LogProb {
        self.weights[node][parents as usize]
    }

    /// All `2^n` parent-set weights of `node`.
    pub fn parent_weights(&self, node: usize) -> &[LogProb] {
        &self.weights[node]
    }
}
