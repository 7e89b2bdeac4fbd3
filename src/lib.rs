//! # dag-sampler: exact weighted sampling of random DAGs
//!
//! **`dag-sampler`** draws directed acyclic graphs over `n` labeled nodes with
//! probability proportional to a product of per-node weights:
//!
//! ```text
//! P(G) ∝ Π_i w_i(parents of i in G)
//! ```
//!
//! Two weight models are supported:
//!
//! - **Symmetric** ([`symmetric`]): `w_i(S) = w[|S|]` depends only on the number of
//!   parents. Preprocessing is `O(n^3)`, so `n` in the hundreds is fine.
//! - **Nonsymmetric** ([`nonsymmetric`]): `w_i(S)` is arbitrary. Preprocessing
//!   walks all `(subset, superset)` pairs, so `n` stays small (at most 30,
//!   practically far fewer).
//!
//! All arithmetic is done on [`LogProb`][crate::lognum::LogProb] values, which
//! store logarithms, so the astronomically large DAG counts never overflow.
//!
//! ## Basic Usage
//!
//! ```rust
//! use dag_sampler::sampler::Sampler;
//! use dag_sampler::symmetric::SymmetricSampler;
//! use dag_sampler::weights::SymmetricWeights;
//! use rand::SeedableRng;
//!
//! // 1. All DAGs on 4 nodes, equally likely
//! let weights = SymmetricWeights::uniform(4).unwrap();
//!
//! // 2. Preprocess once
//! let sampler = SymmetricSampler::new(weights).unwrap();
//! assert!((sampler.total_weight().to_real() - 543.0).abs() < 1e-6);
//!
//! // 3. Sample as often as needed
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let dag = sampler.sample(&mut rng);
//! assert!(dag.is_acyclic());
//! println!("{}", dag); // e.g. "0 <- {}, 1 <- {0, 3}, 2 <- {}, 3 <- {2}"
//! ```
//!
//! ## Core Components
//!
//! - **[`lognum`]**: log-space numbers.
//! - **[`bits`]** and **[`subtable`]**: bitmask utilities and the `(R, U)` table.
//! - **[`symmetric`]** and **[`nonsymmetric`]**: the two samplers, behind the
//!   [`Sampler`][crate::sampler::Sampler] trait.
//! - **[`io`]**: weight file readers.

pub mod bits;
pub mod dag;
pub mod error;
pub mod io;
pub mod lognum;
pub mod nonsymmetric;
pub mod sampler;
pub mod sampling;
pub mod subtable;
pub mod symmetric;
pub mod weights;
