//! Readers for the weight files.
//!
//! Both formats are sequences of whitespace-separated tokens.
//!
//! Symmetric:
//!
//! ```text
//! n  w_0 w_1 ... w_{n-1}
//! ```
//!
//! where `w_k` is the log-weight of a node with exactly `k` parents.
//!
//! Nonsymmetric:
//!
//! ```text
//! n
//! name score_count
//!     log_score parent_count parent_name...
//!     ...
//! ...
//! ```
//!
//! with one record per node. Parent names may refer to nodes defined later in
//! the file. Parent sets that are not listed have zero weight.

use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use log::{debug, warn};

use crate::bits::Mask;
use crate::error::{Error, Result};
use crate::lognum::LogProb;
use crate::subtable::MAX_NODES;
use crate::weights::{NonsymmetricWeights, SymmetricWeights};

const SYMMETRIC: &str = "symmetric";
const NONSYMMETRIC: &str = "nonsymmetric";

struct Tokens<'a> {
    kind: &'static str,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(kind: &'static str, text: &'a str) -> Self {
        Self {
            kind,
            inner: text.split_whitespace(),
        }
    }

    fn word(&mut self, what: &str) -> Result<&'a str> {
        self.inner
            .next()
            .ok_or_else(|| Error::parse(self.kind, format!("expected {}, found end of input", what)))
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| Error::parse(self.kind, format!("expected {}, found '{}'", what, token)))
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let value: i64 = self.parse(what)?;
        usize::try_from(value).map_err(|_| Error::parse(self.kind, format!("{} must be non-negative, got {}", what, value)))
    }

    fn finish(mut self) {
        if let Some(extra) = self.inner.next() {
            warn!("ignoring trailing input in {} weight file, starting at '{}'", self.kind, extra);
        }
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses symmetric weights from text.
pub fn parse_symmetric_weights(text: &str) -> Result<SymmetricWeights> {
    let mut tokens = Tokens::new(SYMMETRIC, text);

    let n = tokens.count("number of nodes")?;
    if n == 0 {
        return Err(Error::parse(SYMMETRIC, "number of nodes must be positive"));
    }

    let mut weights = Vec::with_capacity(n);
    for k in 0..n {
        let log_weight: f64 = tokens.parse(&format!("log-weight for {} parents", k))?;
        weights.push(LogProb::from_log(log_weight));
    }
    tokens.finish();

    SymmetricWeights::new(weights)
}

/// Reads symmetric weights from a file.
pub fn read_symmetric_weights(path: impl AsRef<Path>) -> Result<SymmetricWeights> {
    let path = path.as_ref();
    debug!("reading symmetric weights from {}", path.display());
    parse_symmetric_weights(&read_to_string(path)?)
}

struct Score<'a> {
    log_score: f64,
    parents: Vec<&'a str>,
}

struct Record<'a> {
    name: &'a str,
    scores: Vec<Score<'a>>,
}

/// Parses nonsymmetric weights from text.
pub fn parse_nonsymmetric_weights(text: &str) -> Result<NonsymmetricWeights> {
    let mut tokens = Tokens::new(NONSYMMETRIC, text);

    let n = tokens.count("number of nodes")?;
    if n == 0 {
        return Err(Error::parse(NONSYMMETRIC, "number of nodes must be positive"));
    }
    if n > MAX_NODES {
        return Err(Error::TooManyNodes { got: n, max: MAX_NODES });
    }

    // First pass: collect the records, so that parents can be named before
    // they are defined.
    let mut records = Vec::with_capacity(n);
    for _ in 0..n {
        let name = tokens.word("node name")?;
        let score_count = tokens.count(&format!("score count of '{}'", name))?;
        let mut scores = Vec::with_capacity(score_count);
        for _ in 0..score_count {
            let log_score: f64 = tokens.parse(&format!("log-score of '{}'", name))?;
            let parent_count = tokens.count(&format!("parent count of '{}'", name))?;
            let parents = (0..parent_count)
                .map(|_| tokens.word(&format!("parent of '{}'", name)))
                .collect::<Result<Vec<_>>>()?;
            scores.push(Score { log_score, parents });
        }
        records.push(Record { name, scores });
    }
    tokens.finish();

    let names: Vec<String> = records.iter().map(|r| r.name.to_string()).collect();
    let mut weights = NonsymmetricWeights::with_names(names).map_err(|e| match e {
        Error::InvalidWeights(message) => Error::parse(NONSYMMETRIC, message),
        other => other,
    })?;

    // Second pass: resolve parent names.
    for (node, record) in records.iter().enumerate() {
        for score in &record.scores {
            let mut parents: Mask = 0;
            for &parent in &score.parents {
                match weights.index_of(parent) {
                    Some(p) if p != node => parents |= 1 << p,
                    Some(_) => {
                        return Err(Error::parse(NONSYMMETRIC, format!("node '{}' lists itself as a parent", record.name)));
                    }
                    None => {
                        return Err(Error::parse(
                            NONSYMMETRIC,
                            format!("node '{}' has unknown parent '{}'", record.name, parent),
                        ));
                    }
                }
            }
            weights
                .set(node, parents, LogProb::from_log(score.log_score))
                .map_err(|e| Error::parse(NONSYMMETRIC, e.to_string()))?;
        }
    }

    Ok(weights)
}

/// Reads nonsymmetric weights from a file.
pub fn read_nonsymmetric_weights(path: impl AsRef<Path>) -> Result<NonsymmetricWeights> {
    let path = path.as_ref();
    debug!("reading nonsymmetric weights from {}", path.display());
    parse_nonsymmetric_weights(&read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symmetric() {
        let w = parse_symmetric_weights("3\n0.0 -1.5\n-inf\n").unwrap();
        assert_eq!(w.num_nodes(), 3);
        assert_eq!(w.get(0), LogProb::one());
        assert_eq!(w.get(1).ln(), -1.5);
        assert!(w.get(2).is_zero());
    }

    #[test]
    fn test_parse_symmetric_errors() {
        for text in ["", "0", "-2 1.0", "abc", "3 0.0 0.0", "2 0.0 x"] {
            let err = parse_symmetric_weights(text).unwrap_err();
            assert!(matches!(err, Error::Parse { kind: "symmetric", .. }), "{:?}: {}", text, err);
        }
    }

    #[test]
    fn test_parse_nonsymmetric() {
        let text = "3
            A 1  0.0 0
            B 2  0.0 1 A   -1.0 0
            C 1  0.5 2 A B
        ";
        let w = parse_nonsymmetric_weights(text).unwrap();
        assert_eq!(w.num_nodes(), 3);
        assert_eq!(w.names(), &["A", "B", "C"]);
        assert_eq!(w.get(0, 0), LogProb::one());
        assert!(w.get(0, 0b010).is_zero());
        assert_eq!(w.get(1, 0b001), LogProb::one());
        assert_eq!(w.get(1, 0).ln(), -1.0);
        assert_eq!(w.get(2, 0b011).ln(), 0.5);
        assert!(w.get(2, 0b001).is_zero());
    }

    #[test]
    fn test_parse_nonsymmetric_forward_reference() {
        let text = "2  X 1 0.0 1 Y  Y 1 0.0 0";
        let w = parse_nonsymmetric_weights(text).unwrap();
        assert_eq!(w.get(0, 0b10), LogProb::one());
    }

    #[test]
    fn test_parse_nonsymmetric_errors() {
        let cases = [
            "0",
            "2 A 0",                  // missing record
            "2 A 0 A 0",              // duplicate name
            "2 A 1 0.0 1 Z B 0",      // unknown parent
            "2 A 1 0.0 1 A B 0",      // self parent
            "2 A 1 0.0 -1 B 0",       // negative parent count
            "2 A -1 B 0",             // negative score count
            "2 A 1 zero 0 B 0",       // bad score
        ];
        for text in cases {
            let err = parse_nonsymmetric_weights(text).unwrap_err();
            assert!(matches!(err, Error::Parse { kind: "nonsymmetric", .. }), "{:?}: {}", text, err);
        }
    }

    #[test]
    fn test_parse_nonsymmetric_too_many_nodes() {
        let err = parse_nonsymmetric_weights("31").unwrap_err();
        assert!(matches!(err, Error::TooManyNodes { got: 31, max: 30 }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_symmetric_weights("/nonexistent/weights.txt").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
