/*!
This crate provides fast implementations of agglomerative
[hierarchical clustering](https://en.wikipedia.org/wiki/Hierarchical_clustering)
on pairwise dissimilarity matrices.

The algorithms in this crate follow Daniel Müllner's 2011 paper,
[Modern hierarchical, agglomerative clustering algorithms](https://arxiv.org/pdf/1109.2378.pdf),
which reduces the naive Θ(N³) clustering procedure to Θ(N²) for every
standard linkage rule: a minimum-spanning-tree algorithm for single
linkage, the nearest-neighbor-chain algorithm for the rules that never
produce inversions, and a lazy priority-queue algorithm for the rest.

# Overview

The most important parts of this crate are as follows:

* [`DistanceMatrix`] holds the pairwise dissimilarities between all
  observations in condensed form.
* [`linkage`] performs hierarchical clustering on a distance matrix.
* [`Rule`] determines the linkage criterion.
* [`Dendrogram`] is a representation of a "stepwise" dendrogram, which
  serves as the output of hierarchical clustering and can be cut into
  flat clusters.

# Example

Cluster a handful of points in the plane by their Euclidean distance,
then cut the dendrogram to recover the obvious groups:

```
use hclust::{linkage, DistanceMatrix, Rule};

let points: [(f64, f64); 5] = [
    (0.0, 0.0),
    (0.1, 0.1),
    (5.0, 5.0),
    (5.1, 5.0),
    (20.0, 20.0),
];
let mat = DistanceMatrix::from_fn(points.len(), |i, j| {
    let (xi, yi) = points[i];
    let (xj, yj) = points[j];
    ((xi - xj) * (xi - xj) + (yi - yj) * (yi - yj)).sqrt()
}).unwrap();

let dend = linkage(&mat, Rule::Average);
// A dendrogram always has `N - 1` steps, where each step merges two
// previous clusters. The last step creates the cluster containing every
// observation.
assert_eq!(dend.len(), points.len() - 1);

// Cutting well below the distance between the groups separates them.
assert_eq!(
    dend.flatten_by_height(1.0),
    vec![vec![0, 1], vec![2, 3], vec![4]],
);
```

Each step of the dendrogram records the labels of the two merged clusters
and their dissimilarity. Singleton clusters are labeled `0..N` after the
observations they contain, and the cluster created by the i-th step is
labeled `N + i`, which matches the convention used by SciPy's
hierarchical clustering module.

# Testing

The testing in this crate is made up of unit tests on the internal data
structures and quickcheck properties that check the consistency between
the various clustering algorithms. That is, quickcheck is used to test
that, given the same inputs, the `mst`, `nnchain`, `generic` and
`primitive` implementations all return the same output.

There are some caveats to this testing strategy:

1. Only the `generic` and `primitive` implementations support all linkage
   rules, which means some rules have worse test coverage.
2. Principally, this testing strategy assumes that at least one of the
   implementations is correct.
3. The various implementations do not specify how ties are handled, which
   occurs whenever the same dissimilarity value appears two or more times
   for distinct pairs of observations. That means there are multiple
   correct dendrograms depending on the input. This case is not tested,
   and instead, all generated matrices are forced to contain distinct
   dissimilarity values.
*/

#![deny(missing_docs)]

use std::str::FromStr;

pub use crate::chain::{nnchain, nnchain_with};
pub use crate::dendrogram::{Dendrogram, Step};
pub use crate::float::Float;
pub use crate::generic::{generic, generic_with};
pub use crate::matrix::DistanceMatrix;
pub use crate::primitive::{primitive, primitive_with};
pub use crate::spanning::{mst, mst_with};

use crate::active::Active;
use crate::queue::NeighborHeap;
use crate::union::UnionFind;

mod active;
mod chain;
mod dendrogram;
mod float;
mod generic;
mod matrix;
mod primitive;
mod queue;
mod rule;
mod spanning;
#[cfg(test)]
mod test;
mod union;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the validated operations in this crate.
///
/// Every variant is a domain validation error: the crate performs no I/O
/// and nothing is retried. Errors surface where user data enters the
/// system, which is the construction and the checked accessors of
/// [`DistanceMatrix`], plus rule-name parsing.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A NaN dissimilarity entered through a metric callback, a condensed
    /// buffer or a checked write.
    #[error("dissimilarity between observations {row} and {column} is NaN")]
    InvalidDissimilarity {
        /// The row index of the offending pair.
        row: usize,
        /// The column index of the offending pair.
        column: usize,
    },
    /// A buffer was passed whose length is not `n * (n - 1) / 2` for any
    /// whole number of observations `n >= 2`, or a matrix of zero
    /// observations was requested.
    #[error(
        "{len} dissimilarities do not form a condensed matrix over two or \
         more observations"
    )]
    InvalidShape {
        /// The offending buffer length.
        len: usize,
    },
    /// An index-based accessor received an observation index outside the
    /// matrix.
    #[error(
        "observation index {index} is out of range for a matrix of \
         {observations} observations"
    )]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The number of observations in the matrix.
        observations: usize,
    },
    /// An attempt was made to store a non-zero dissimilarity on the
    /// diagonal, which is virtual and always zero.
    #[error("the dissimilarity of observation {index} to itself must be zero")]
    DomainViolation {
        /// The diagonal index that was written.
        index: usize,
    },
    /// This error occurs when attempting to parse a rule string that
    /// doesn't correspond to a valid rule.
    #[error("unrecognized linkage rule: '{0}'")]
    InvalidRule(String),
}

/// A linkage rule for computing the dissimilarities between clusters.
///
/// The rule selected dictates how the dissimilarities are computed
/// whenever a new cluster is formed. In particular, when clusters `a` and
/// `b` are merged into a new cluster `ab`, then the pairwise dissimilarity
/// between `ab` and every other cluster `x` is recomputed using the
/// Lance-Williams update formula of the rule.
///
/// Two properties of a rule matter to the clustering machinery, and both
/// are exposed so that dispatch never needs to hard-code rule identities:
///
/// * [`needs_squared_input`](Rule::needs_squared_input) — the rule's
///   formula operates on squared dissimilarities. The engine squares the
///   matrix once before clustering and takes the square root of every
///   recorded dissimilarity afterwards, regardless of what the caller
///   supplied.
/// * [`order_dependent`](Rule::order_dependent) — the rule can merge at a
///   dissimilarity below that of an earlier merge (an inversion), so the
///   recorded merge order is meaningful and must survive relabeling.
///   Order-independent rules are instead relabeled in ascending
///   dissimilarity order, which yields the canonical dendrogram.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rule {
    /// Assigns the minimum dissimilarity between all pairs of
    /// observations, one from each cluster:
    ///
    /// ```text
    /// d(AB, X) = min(d_ax, d_bx)
    /// ```
    Single,
    /// Assigns the maximum dissimilarity between all pairs of
    /// observations, one from each cluster:
    ///
    /// ```text
    /// d(AB, X) = max(d_ax, d_bx)
    /// ```
    Complete,
    /// Assigns the average dissimilarity between all pairs of
    /// observations, one from each cluster, weighting each merged half by
    /// its number of observations:
    ///
    /// ```text
    /// d(AB, X) = (|A| * d_ax + |B| * d_bx) / (|A| + |B|)
    /// ```
    Average,
    /// Assigns the unweighted mean of the two halves' dissimilarities
    /// (also known as WPGMA), regardless of how many observations each
    /// half contains:
    ///
    /// ```text
    /// d(AB, X) = (d_ax + d_bx) / 2
    /// ```
    Weighted,
    /// Assigns the Ward variance-minimizing dissimilarity. Operates on
    /// squared dissimilarities:
    ///
    /// ```text
    /// d²(AB, X) = ((|A| + |X|) * d²_ax + (|B| + |X|) * d²_bx
    ///              - |X| * d²_ab) / (|A| + |B| + |X|)
    /// ```
    Ward,
    /// Assigns the distance between cluster centroids. Operates on
    /// squared dissimilarities and may produce inversions:
    ///
    /// ```text
    /// d²(AB, X) = (|A| * d²_ax + |B| * d²_bx) / (|A| + |B|)
    ///             - |A| * |B| * d²_ab / (|A| + |B|)²
    /// ```
    Centroid,
    /// Assigns the distance to the midpoint of the two merged clusters
    /// (also known as WPGMC). Operates on squared dissimilarities and may
    /// produce inversions:
    ///
    /// ```text
    /// d²(AB, X) = (d²_ax + d²_bx) / 2 - d²_ab / 4
    /// ```
    Median,
}

impl Rule {
    /// Convert this rule into a nearest-neighbor-chain rule.
    ///
    /// More specifically, if this rule is one that the `nnchain` algorithm
    /// can compute, then this returns the corresponding [`ChainRule`]
    /// value. Otherwise, this returns `None`.
    pub fn into_chain_rule(self) -> Option<ChainRule> {
        match self {
            Rule::Single => Some(ChainRule::Single),
            Rule::Complete => Some(ChainRule::Complete),
            Rule::Average => Some(ChainRule::Average),
            Rule::Weighted => Some(ChainRule::Weighted),
            Rule::Ward => Some(ChainRule::Ward),
            Rule::Centroid | Rule::Median => None,
        }
    }

    /// Returns true if and only if the merge order produced by this rule
    /// is meaningful and must be preserved by relabeling.
    ///
    /// This is the case for the rules that can produce inversions, i.e.
    /// merges at a smaller dissimilarity than an earlier merge.
    pub fn order_dependent(&self) -> bool {
        matches!(*self, Rule::Centroid | Rule::Median)
    }

    /// Returns true if and only if this rule computes dissimilarities
    /// between clusters on the squares of dissimilarities.
    pub fn needs_squared_input(&self) -> bool {
        matches!(*self, Rule::Ward | Rule::Centroid | Rule::Median)
    }

    /// Square the given matrix if and only if this rule operates on
    /// squared dissimilarities.
    fn square<T: Float>(&self, matrix: &mut DistanceMatrix<T>) {
        if self.needs_squared_input() {
            matrix.map_in_place(|x| x * x);
        }
    }

    /// Take the square root of each step-wise dissimilarity in the given
    /// dendrogram if this rule operates on squared dissimilarities.
    fn sqrt<T: Float>(&self, dend: &mut Dendrogram<T>) {
        if self.needs_squared_input() {
            for step in dend.steps_mut() {
                step.dissimilarity = step.dissimilarity.sqrt();
            }
        }
    }
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rule> {
        match s {
            "single" => Ok(Rule::Single),
            "complete" => Ok(Rule::Complete),
            "average" => Ok(Rule::Average),
            "weighted" => Ok(Rule::Weighted),
            "ward" => Ok(Rule::Ward),
            "centroid" => Ok(Rule::Centroid),
            "median" => Ok(Rule::Median),
            _ => Err(Error::InvalidRule(s.to_string())),
        }
    }
}

/// A linkage rule that the `nnchain` algorithm can compute.
///
/// The nearest-neighbor-chain algorithm, or [`nnchain`], performs
/// hierarchical clustering using a specialized algorithm that can only
/// compute linkage for rules that do not produce inversions in the final
/// dendrogram. As a result, the `nnchain` algorithm cannot be used with
/// the `Centroid` or `Median` rules. `ChainRule` identifies the subset of
/// rules that can be used with `nnchain`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChainRule {
    /// See [`Rule::Single`].
    Single,
    /// See [`Rule::Complete`].
    Complete,
    /// See [`Rule::Average`].
    Average,
    /// See [`Rule::Weighted`].
    Weighted,
    /// See [`Rule::Ward`].
    Ward,
}

impl ChainRule {
    /// Convert this `nnchain` rule into a general purpose linkage rule.
    pub fn into_rule(self) -> Rule {
        match self {
            ChainRule::Single => Rule::Single,
            ChainRule::Complete => Rule::Complete,
            ChainRule::Average => Rule::Average,
            ChainRule::Weighted => Rule::Weighted,
            ChainRule::Ward => Rule::Ward,
        }
    }

    /// Square the given matrix if and only if this rule operates on
    /// squared dissimilarities.
    fn square<T: Float>(&self, matrix: &mut DistanceMatrix<T>) {
        self.into_rule().square(matrix);
    }

    /// Take the square root of each step-wise dissimilarity in the given
    /// dendrogram if this rule operates on squared dissimilarities.
    fn sqrt<T: Float>(&self, dend: &mut Dendrogram<T>) {
        self.into_rule().sqrt(dend);
    }
}

impl FromStr for ChainRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<ChainRule> {
        match s {
            "single" => Ok(ChainRule::Single),
            "complete" => Ok(ChainRule::Complete),
            "average" => Ok(ChainRule::Average),
            "weighted" => Ok(ChainRule::Weighted),
            "ward" => Ok(ChainRule::Ward),
            _ => Err(Error::InvalidRule(s.to_string())),
        }
    }
}

/// Return a hierarchical clustering of observations given their pairwise
/// dissimilarities.
///
/// This selects the fastest algorithm for the rule requested: the
/// minimum-spanning-tree algorithm for `Single`, the
/// nearest-neighbor-chain algorithm for `Complete`, `Average`, `Weighted`
/// and `Ward`, and the generic priority-queue algorithm for `Centroid`
/// and `Median`.
///
/// The matrix is cloned, because the clustering algorithms consume their
/// input: use [`linkage_in_place`] to spend the caller's matrix instead
/// and skip the copy.
///
/// The return value is a [`Dendrogram`], which encodes the hierarchical
/// clustering as a sequence of `observations - 1` steps, where each step
/// corresponds to the creation of a cluster by merging exactly two
/// previous clusters. The very last cluster created contains all
/// observations. A matrix over a single observation yields an empty
/// dendrogram.
pub fn linkage<T: Float>(
    matrix: &DistanceMatrix<T>,
    rule: Rule,
) -> Dendrogram<T> {
    let mut matrix = matrix.clone();
    linkage_in_place(&mut matrix, rule)
}

/// Like [`linkage`], but reuses the caller's matrix as scratch space.
///
/// The cells of the matrix are overwritten with intermediate cluster
/// dissimilarities as merging progresses; after this returns, the matrix
/// contents are meaningless (although still structurally valid).
pub fn linkage_in_place<T: Float>(
    matrix: &mut DistanceMatrix<T>,
    rule: Rule,
) -> Dendrogram<T> {
    let mut state = LinkageState::new();
    let mut steps = Dendrogram::new(matrix.observations());
    linkage_with(&mut state, matrix, rule, &mut steps);
    steps
}

/// Like [`linkage_in_place`], but amortizes allocation.
///
/// The `linkage` function is more ergonomic to use, but also potentially
/// more costly. Therefore, `linkage_with` exposes two key points for
/// amortizing allocation.
///
/// Firstly, [`LinkageState`] corresponds to internal mutable scratch
/// space used by the clustering algorithms. It can be reused in
/// subsequent calls to `linkage_with` (or any of the other `with`
/// clustering functions).
///
/// Secondly, the caller must provide a [`Dendrogram`] that is mutated in
/// place. This is in contrast to `linkage` where a dendrogram is created
/// and returned.
pub fn linkage_with<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    rule: Rule,
    steps: &mut Dendrogram<T>,
) {
    if let Rule::Single = rule {
        mst_with(state, matrix, steps);
    } else if let Some(rule) = rule.into_chain_rule() {
        nnchain_with(state, matrix, rule, steps);
    } else {
        generic_with(state, matrix, rule, steps);
    }
}

/// Mutable scratch space used by the linkage algorithms.
///
/// `LinkageState` is an opaque representation of mutable scratch space
/// used by the linkage algorithms. It is provided only for callers who
/// wish to amortize allocation using the `with` variants of the
/// clustering functions. This may be useful when your requirements call
/// for rapidly running hierarchical clustering on small dissimilarity
/// matrices.
///
/// The memory used by `LinkageState` is proportional to the number of
/// observations being clustered.
///
/// The `T` type parameter refers to the type of dissimilarity used in the
/// pairwise matrix. In practice, `T` is a floating point type.
#[derive(Debug, Default)]
pub struct LinkageState<T> {
    /// Maps a cluster index to the size of that cluster.
    ///
    /// This mapping changes as clustering progresses. Namely, if `a` and
    /// `b` are clusters with `a < b` and they are merged, then `a` is no
    /// longer a valid cluster index and `b` now corresponds to the new
    /// cluster formed by merging `a` and `b`.
    sizes: Vec<usize>,
    /// All active clusters in the dissimilarity matrix.
    ///
    /// When two clusters are merged, one of them is deactivated while the
    /// other morphs to represent the merged cluster. This provides
    /// efficient iteration over all active clusters.
    active: Active,
    /// A map from observation index to the minimal edge connecting
    /// another observation that is not yet in the minimum spanning tree.
    ///
    /// This is only used in the MST algorithm.
    min_dists: Vec<T>,
    /// A union-find set for merging clusters.
    ///
    /// This is used for assigning labels to the dendrogram.
    set: UnionFind,
    /// A nearest-neighbor chain.
    ///
    /// This is only used in the NN-chain algorithm.
    chain: Vec<usize>,
    /// A priority queue containing nearest-neighbor dissimilarities.
    ///
    /// This is only used in the generic algorithm.
    queue: NeighborHeap<T>,
    /// A nearest neighbor candidate for each cluster.
    ///
    /// This is only used in the generic algorithm.
    nearest: Vec<usize>,
}

impl<T: Float> LinkageState<T> {
    /// Create a new mutable scratch space for use in the `with` variants
    /// of the clustering functions.
    ///
    /// The clustering functions will automatically resize the scratch
    /// space as needed based on the number of observations being
    /// clustered.
    pub fn new() -> LinkageState<T> {
        LinkageState {
            sizes: vec![],
            active: Active::new(),
            min_dists: vec![],
            set: UnionFind::new(),
            chain: vec![],
            queue: NeighborHeap::new(),
            nearest: vec![],
        }
    }

    /// Clear the scratch space and allocate enough room for `size`
    /// observations.
    fn reset(&mut self, size: usize) {
        self.sizes.clear();
        self.sizes.resize(size, 1);

        self.active.reset(size);

        self.min_dists.clear();
        self.min_dists.resize(size, T::infinity());

        self.set.reset(size);

        self.chain.clear();

        self.queue.reset(size);

        self.nearest.clear();
        self.nearest.resize(size, 0);
    }

    /// Merge `cluster_a` and `cluster_b` with the given `dissimilarity`
    /// into the given dendrogram.
    ///
    /// The smaller index leaves the active set; the larger one now stands
    /// for the merged cluster.
    fn merge(
        &mut self,
        dend: &mut Dendrogram<T>,
        cluster_a: usize,
        cluster_b: usize,
        dissimilarity: T,
    ) {
        self.sizes[cluster_b] = self.sizes[cluster_a] + self.sizes[cluster_b];
        self.active.remove(cluster_a);
        dend.push(Step::new(cluster_a, cluster_b, dissimilarity));
    }
}
