use std::mem;
use std::ops;

use crate::float::Float;

/// A step-wise dendrogram that represents a hierarchical clustering as a
/// binary tree.
///
/// A dendrogram consists of a series of `N - 1` steps, where `N` is the
/// number of observations that were clustered. Each step corresponds to a
/// merge between two other clusters (where a cluster might consist of one
/// or more observations). Each step includes the labels for the pair of
/// clusters that were merged and the dissimilarity between them.
///
/// The labels of clusters are assigned as follows:
///
/// 1. A cluster that corresponds to a single observation is assigned a
///    label that corresponds to the given observation's index in the
///    pairwise dissimilarity matrix.
/// 2. A cluster with more than one observation has the label `N + i`,
///    where `N` is the total number of observations and `i` corresponds to
///    the `i`th step in which the cluster was created. So the very first
///    step in a dendrogram creates a cluster with the label `N` and the
///    last step creates a cluster with the label `(N + N - 1) - 1`.
///
/// This labeling scheme corresponds to the same labeling scheme used by
/// SciPy.
///
/// Two dendrograms compare equal when their observation counts match and
/// every corresponding step has an identical cluster pair and
/// dissimilarities within `1e-15`. Use
/// [`eq_with_epsilon`](Dendrogram::eq_with_epsilon) to compare with a
/// different tolerance.
///
/// The type parameter `T` refers to the type of dissimilarity used in the
/// steps. In practice, `T` is a floating point type.
#[derive(Clone, Debug)]
pub struct Dendrogram<T> {
    steps: Vec<Step<T>>,
    observations: usize,
}

/// A single merge step in a dendrogram.
///
/// A step always corresponds to a merge between two clusters, where each
/// cluster has at least one observation. Each step itself corresponds to a
/// new cluster containing the observations of the merged clusters.
///
/// By convention, the smaller label is assigned to `cluster_a`.
///
/// The type parameter `T` refers to the type of dissimilarity used. In
/// practice, `T` is a floating point type.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<T> {
    /// The label corresponding to the first cluster.
    ///
    /// The algorithm for labeling clusters is documented on
    /// [`Dendrogram`].
    pub cluster_a: usize,
    /// The label corresponding to the second cluster.
    ///
    /// The algorithm for labeling clusters is documented on
    /// [`Dendrogram`].
    pub cluster_b: usize,
    /// The dissimilarity between `cluster_a` and `cluster_b`.
    ///
    /// If both `cluster_a` and `cluster_b` correspond to singleton
    /// clusters, then this dissimilarity is equivalent to the pairwise
    /// dissimilarity between the clusters' corresponding observations.
    /// Otherwise, the dissimilarity is computed according to the linkage
    /// rule used.
    pub dissimilarity: T,
}

impl<T> Dendrogram<T> {
    /// Return a new dendrogram with space for the given number of
    /// observations.
    pub fn new(observations: usize) -> Dendrogram<T> {
        Dendrogram {
            steps: Vec::with_capacity(observations.saturating_sub(1)),
            observations,
        }
    }

    /// Clear this dendrogram and ensure there is space for the given
    /// number of observations.
    ///
    /// This method is useful for reusing a dendrogram's allocation.
    ///
    /// Note that this method does not need to be called before passing it
    /// to one of the clustering functions. The clustering functions will
    /// reset the dendrogram for you.
    pub fn reset(&mut self, observations: usize) {
        self.steps.clear();
        self.observations = observations;
    }

    /// Push a new step on to this dendrogram.
    ///
    /// # Panics
    ///
    /// This method panics if the dendrogram already has `N - 1` steps,
    /// where `N` is the number of observations supported by this
    /// dendrogram.
    pub fn push(&mut self, step: Step<T>) {
        assert!(self.len() < self.observations().saturating_sub(1));
        self.steps.push(step);
    }

    /// Returns the steps in the dendrogram.
    pub fn steps(&self) -> &[Step<T>] {
        &self.steps
    }

    /// Return a mutable slice of the steps in this dendrogram.
    pub fn steps_mut(&mut self) -> &mut [Step<T>] {
        &mut self.steps
    }

    /// Return the number of steps in this dendrogram.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return true if and only if this dendrogram has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Return the number of observations that this dendrogram supports.
    pub fn observations(&self) -> usize {
        self.observations
    }
}

impl<T: Float> Dendrogram<T> {
    /// Compare two dendrograms for approximate equality.
    ///
    /// Approximate equality in this case refers to the dissimilarities in
    /// each step. In particular, two dissimilarities are considered equal
    /// if and only if the absolute value of their difference is less than
    /// or equal to the given `epsilon` value.
    pub fn eq_with_epsilon(&self, other: &Dendrogram<T>, epsilon: T) -> bool {
        if self.observations != other.observations {
            return false;
        }
        if self.len() != other.len() {
            return false;
        }
        for (step1, step2) in self.steps().iter().zip(other.steps()) {
            if !step1.eq_with_epsilon(step2, epsilon) {
                return false;
            }
        }
        true
    }

    /// Cut this dendrogram at the given height and return the resulting
    /// flat clusters as groups of original observation indices.
    ///
    /// Two observations share a group exactly when their cophenetic
    /// distance is at most `height`. Each group is sorted ascending and
    /// the groups are ordered by their smallest member.
    ///
    /// The dendrogram must carry canonical labels, which is what the
    /// clustering functions produce.
    ///
    /// # Example
    ///
    /// ```
    /// use hclust::{linkage, DistanceMatrix, Rule};
    ///
    /// let mat = DistanceMatrix::from_condensed(
    ///     vec![0.5, 3.0, 2.0, 3.5, 2.5, 1.0],
    /// ).unwrap();
    /// let dend = linkage(&mat, Rule::Single);
    /// assert_eq!(dend.flatten_by_height(1.5), vec![vec![0, 1], vec![2, 3]]);
    /// ```
    pub fn flatten_by_height(&self, height: T) -> Vec<Vec<usize>> {
        self.flatten_steps(|_, step| step.dissimilarity <= height)
    }

    /// Cut this dendrogram so that at most `count` flat clusters remain
    /// and return them as groups of original observation indices.
    ///
    /// The last `count - 1` recorded merges are undone; asking for zero
    /// clusters behaves like asking for one, and asking for at least as
    /// many clusters as observations yields all singletons. Each group is
    /// sorted ascending and the groups are ordered by their smallest
    /// member.
    ///
    /// The dendrogram must carry canonical labels, which is what the
    /// clustering functions produce.
    pub fn flatten_by_count(&self, count: usize) -> Vec<Vec<usize>> {
        let merges = self.observations.saturating_sub(count.max(1));
        self.flatten_steps(|i, _| i < merges)
    }

    /// Replay the steps selected by `apply` and collect the surviving
    /// groups.
    fn flatten_steps<F>(&self, mut apply: F) -> Vec<Vec<usize>>
    where
        F: FnMut(usize, &Step<T>) -> bool,
    {
        let observations = self.observations;
        let mut clusters: Vec<Option<Vec<usize>>> =
            (0..observations).map(|i| Some(vec![i])).collect();
        clusters.resize_with(observations + self.steps.len(), || None);

        for (i, step) in self.steps.iter().enumerate() {
            if !apply(i, step) {
                continue;
            }
            let group_a = clusters[step.cluster_a].take();
            let group_b = clusters[step.cluster_b].take();
            match (group_a, group_b) {
                (Some(mut group_a), Some(group_b)) => {
                    group_a.extend(group_b);
                    clusters[observations + i] = Some(group_a);
                }
                // A merge whose child was itself skipped (possible when an
                // order-dependent rule inverts) cannot apply; put back
                // whatever was there.
                (group_a, group_b) => {
                    clusters[step.cluster_a] = group_a;
                    clusters[step.cluster_b] = group_b;
                }
            }
        }

        let mut groups: Vec<Vec<usize>> =
            clusters.into_iter().flatten().collect();
        for group in groups.iter_mut() {
            group.sort_unstable();
        }
        groups.sort_unstable_by_key(|group| group[0]);
        groups
    }
}

impl<T: Float> PartialEq for Dendrogram<T> {
    fn eq(&self, other: &Dendrogram<T>) -> bool {
        self.eq_with_epsilon(other, T::from_f64(1e-15))
    }
}

impl<T> ops::Index<usize> for Dendrogram<T> {
    type Output = Step<T>;
    fn index(&self, i: usize) -> &Step<T> {
        &self.steps[i]
    }
}

impl<T> ops::IndexMut<usize> for Dendrogram<T> {
    fn index_mut(&mut self, i: usize) -> &mut Step<T> {
        &mut self.steps[i]
    }
}

impl<T> Step<T> {
    /// Create a new step that can be added to a dendrogram.
    ///
    /// Note that the cluster labels given are normalized such that the
    /// smallest label is always assigned to `cluster_a`.
    pub fn new(
        mut cluster_a: usize,
        mut cluster_b: usize,
        dissimilarity: T,
    ) -> Step<T> {
        if cluster_b < cluster_a {
            mem::swap(&mut cluster_a, &mut cluster_b);
        }
        Step { cluster_a, cluster_b, dissimilarity }
    }

    /// Set the cluster labels on this step.
    ///
    /// Note that the cluster labels given are normalized such that the
    /// smallest label is always assigned to `cluster_a`.
    pub fn set_clusters(&mut self, mut cluster_a: usize, mut cluster_b: usize) {
        if cluster_b < cluster_a {
            mem::swap(&mut cluster_a, &mut cluster_b);
        }
        self.cluster_a = cluster_a;
        self.cluster_b = cluster_b;
    }
}

impl<T: Float> Step<T> {
    /// Compare two steps for approximate equality.
    ///
    /// Approximate equality in this case refers to the dissimilarity in
    /// each step. In particular, two dissimilarities are considered equal
    /// if and only if the absolute value of their difference is less than
    /// or equal to the given `epsilon` value.
    pub fn eq_with_epsilon(&self, other: &Step<T>, epsilon: T) -> bool {
        (self.cluster_a, self.cluster_b) == (other.cluster_a, other.cluster_b)
            && (self.dissimilarity - other.dissimilarity).abs() <= epsilon
    }
}
