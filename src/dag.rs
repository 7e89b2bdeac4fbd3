//! Sampled DAGs and the layer decompositions they are built from.
//!
//! A [`Dag`] over `n` nodes stores the sorted parent list of every node, so it
//! is not limited by the width of a bitmask. Both samplers first draw an
//! ordered decomposition of the nodes into layers and then draw the parents of
//! every node from strictly earlier layers, so the result is acyclic by
//! construction:
//!
//! - [`Partition`]: layer *sizes* only (symmetric model, labels assigned later);
//! - [`Layering`]: layer *masks*, with an empty sentinel layer in front
//!   (nonsymmetric model, at most 30 nodes).

use std::fmt;

use crate::bits::{full_mask, Mask, Ones};

/// A directed acyclic graph given by the parent list of every node.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Dag {
    parents: Vec<Vec<usize>>,
}

impl Dag {
    /// The DAG on `n` nodes without edges.
    pub fn empty(n: usize) -> Self {
        Self { parents: vec![Vec::new(); n] }
    }

    /// Builds a DAG from parent lists, given in any order.
    pub fn from_parents(parents: Vec<Vec<usize>>) -> Self {
        let mut dag = Self::empty(parents.len());
        for (node, list) in parents.into_iter().enumerate() {
            dag.set_parents(node, list);
        }
        dag
    }

    /// Builds a DAG from parent bitmasks (bit `p` set: `p` is a parent).
    pub fn from_masks(masks: &[Mask]) -> Self {
        Self {
            parents: masks.iter().map(|&m| Ones::new(m).collect()).collect(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.parents.len()
    }

    /// Parents of `node`, ascending.
    pub fn parents(&self, node: usize) -> &[usize] {
        &self.parents[node]
    }

    /// Parents of `node` as a bitmask. All parents must be below 32.
    pub fn parent_mask(&self, node: usize) -> Mask {
        self.parents[node].iter().fold(0, |acc, &p| {
            debug_assert!(p < Mask::BITS as usize, "parent {} does not fit into a mask", p);
            acc | (1 << p)
        })
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.parents[node].len()
    }

    pub fn set_parents(&mut self, node: usize, parents: impl IntoIterator<Item = usize>) {
        let mut list: Vec<usize> = parents.into_iter().collect();
        list.sort_unstable();
        list.dedup();
        self.parents[node] = list;
    }

    pub fn add_parent(&mut self, node: usize, parent: usize) {
        let list = &mut self.parents[node];
        if let Err(pos) = list.binary_search(&parent) {
            list.insert(pos, parent);
        }
    }

    pub fn num_edges(&self) -> usize {
        self.parents.iter().map(Vec::len).sum()
    }

    /// Checks acyclicity by repeatedly removing nodes without remaining parents.
    ///
    /// A parent outside `0..n` makes the graph invalid, so it is not acyclic either.
    pub fn is_acyclic(&self) -> bool {
        let n = self.num_nodes();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut waiting: Vec<usize> = Vec::with_capacity(n);
        for (node, list) in self.parents.iter().enumerate() {
            for &p in list {
                if p >= n {
                    return false;
                }
                children[p].push(node);
            }
            waiting.push(list.len());
        }

        let mut ready: Vec<usize> = (0..n).filter(|&i| waiting[i] == 0).collect();
        let mut removed = 0;
        while let Some(node) = ready.pop() {
            removed += 1;
            for &child in &children[node] {
                waiting[child] -= 1;
                if waiting[child] == 0 {
                    ready.push(child);
                }
            }
        }
        removed == n
    }

    /// Display with node names instead of indices.
    pub fn display_with_names<'a>(&'a self, names: &'a [String]) -> impl fmt::Display + 'a {
        NamedDag { dag: self, names }
    }

    fn write_with<D: fmt::Display>(&self, f: &mut fmt::Formatter<'_>, label: impl Fn(usize) -> D) -> fmt::Result {
        for (i, list) in self.parents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} <- {{", label(i))?;
            for (k, &p) in list.iter().enumerate() {
                if k > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", label(p))?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Dag {
    /// Formats as `0 <- {}, 1 <- {0}, 2 <- {0, 1}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_with(f, |i| i)
    }
}

struct NamedDag<'a> {
    dag: &'a Dag,
    names: &'a [String],
}

impl fmt::Display for NamedDag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dag.write_with(f, |i| &self.names[i])
    }
}

/// Layer sizes of a symmetric sample, in order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Partition(Vec<usize>);

impl Partition {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, size: usize) {
        debug_assert!(size > 0, "layers are nonempty");
        self.0.push(size);
    }

    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    pub fn num_layers(&self) -> usize {
        self.0.len()
    }

    /// Number of nodes covered so far.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// Layer masks of a nonsymmetric sample.
///
/// Index 0 always holds the empty sentinel layer, so that the first real layer
/// has a (empty) predecessor like every other layer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Layering(Vec<Mask>);

impl Layering {
    pub fn new() -> Self {
        Self(vec![0])
    }

    pub fn push(&mut self, layer: Mask) {
        debug_assert_ne!(layer, 0, "layers are nonempty");
        debug_assert_eq!(layer & self.covered(), 0, "layers are disjoint");
        self.0.push(layer);
    }

    /// All layers, sentinel included.
    pub fn as_slice(&self) -> &[Mask] {
        &self.0
    }

    /// Real layers, sentinel excluded.
    pub fn layers(&self) -> &[Mask] {
        &self.0[1..]
    }

    /// The most recently placed layer (the sentinel if none).
    pub fn last(&self) -> Mask {
        self.0[self.0.len() - 1]
    }

    /// Union of all placed layers.
    pub fn covered(&self) -> Mask {
        self.0.iter().fold(0, |acc, &l| acc | l)
    }

    /// Whether the real layers are nonempty, pairwise disjoint and cover `{0..n}`.
    pub fn is_complete(&self, n: usize) -> bool {
        let mut seen: Mask = 0;
        for &layer in self.layers() {
            if layer == 0 || layer & seen != 0 {
                return false;
            }
            seen |= layer;
        }
        self.0[0] == 0 && seen == full_mask(n)
    }
}

impl Default for Layering {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dag_display() {
        let dag = Dag::from_masks(&[0, 0b001, 0b011]);
        assert_eq!(dag.to_string(), "0 <- {}, 1 <- {0}, 2 <- {0, 1}");
        assert_eq!(Dag::empty(2).to_string(), "0 <- {}, 1 <- {}");
    }

    #[test]
    fn test_dag_display_with_names() {
        let dag = Dag::from_masks(&[0, 0b001, 0b011]);
        let names: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dag.display_with_names(&names).to_string(), "A <- {}, B <- {A}, C <- {A, B}");
    }

    #[test]
    fn test_dag_edit() {
        let mut dag = Dag::empty(3);
        dag.add_parent(2, 1);
        dag.add_parent(2, 0);
        dag.add_parent(2, 1);
        dag.set_parents(1, [0]);
        assert_eq!(dag, Dag::from_masks(&[0, 0b001, 0b011]));
        assert_eq!(dag.num_edges(), 3);
        assert_eq!(dag.parents(2), &[0, 1]);
        assert_eq!(dag.parent_mask(2), 0b011);
        assert_eq!(dag.in_degree(2), 2);
    }

    #[test]
    fn test_dag_parents_sorted() {
        let dag = Dag::from_parents(vec![vec![], vec![0], vec![1, 0, 1]]);
        assert_eq!(dag.parents(2), &[0, 1]);
        assert_eq!(dag, Dag::from_masks(&[0, 0b001, 0b011]));
    }

    #[test]
    fn test_dag_acyclic() {
        assert!(Dag::empty(4).is_acyclic());
        assert!(Dag::from_masks(&[0, 0b001, 0b011]).is_acyclic());
        assert!(!Dag::from_masks(&[0b010, 0b001]).is_acyclic());
        assert!(!Dag::from_masks(&[0b001]).is_acyclic());
        assert!(!Dag::from_masks(&[0, 0b100, 0b010]).is_acyclic());
        assert!(!Dag::from_parents(vec![vec![], vec![5]]).is_acyclic());
    }

    #[test]
    fn test_dag_beyond_mask_width() {
        // A chain 0 <- 1 <- ... <- 99, far beyond 32 nodes.
        let n = 100;
        let chain = Dag::from_parents((0..n).map(|i| if i == 0 { vec![] } else { vec![i - 1] }).collect());
        assert!(chain.is_acyclic());
        assert_eq!(chain.num_edges(), n - 1);
        assert_eq!(chain.parents(64), &[63]);
        assert!(chain.to_string().ends_with("99 <- {98}"));

        // Closing the chain into a cycle through high labels is detected.
        let mut cycle = chain.clone();
        cycle.add_parent(0, 99);
        assert!(!cycle.is_acyclic());
    }

    #[test]
    fn test_partition() {
        let mut p = Partition::new();
        p.push(2);
        p.push(1);
        assert_eq!(p.sizes(), &[2, 1]);
        assert_eq!(p.total(), 3);
        assert_eq!(p.num_layers(), 2);
    }

    #[test]
    fn test_layering() {
        let mut l = Layering::new();
        assert_eq!(l.last(), 0);
        assert!(!l.is_complete(3));
        l.push(0b101);
        l.push(0b010);
        assert_eq!(l.layers(), &[0b101, 0b010]);
        assert_eq!(l.as_slice(), &[0, 0b101, 0b010]);
        assert_eq!(l.last(), 0b010);
        assert_eq!(l.covered(), 0b111);
        assert!(l.is_complete(3));
        assert!(!l.is_complete(4));
    }
}
