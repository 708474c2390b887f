use crate::dendrogram::Dendrogram;

/// A union-find over cluster labels, used to rewrite the raw merge steps of
/// a dendrogram into canonical labels.
///
/// For `n` observations there are `n + n - 1` possible labels: the
/// singletons `0..n` and one label per merge. A label whose parent is
/// itself is a root; unioning two distinct roots mints the next label in
/// sequence, so the i-th union creates label `n + i`.
#[derive(Clone, Debug)]
pub struct UnionFind {
    /// A map from cluster label to its cluster's parent.
    ///
    /// When a cluster label is mapped to itself, then it is considered a
    /// root.
    parents: Vec<usize>,
    /// The next cluster label to mint on the next union.
    next_label: usize,
}

impl Default for UnionFind {
    fn default() -> UnionFind {
        UnionFind::new()
    }
}

impl UnionFind {
    /// Create a new empty set.
    pub fn new() -> UnionFind {
        UnionFind::with_len(0)
    }

    /// Create a new set that can merge clusters for exactly `len`
    /// observations.
    pub fn with_len(len: usize) -> UnionFind {
        let size = if len == 0 { 0 } else { 2 * len - 1 };
        UnionFind { parents: (0..size).collect(), next_label: len }
    }

    /// Clear this allocation and resize it as appropriate to support `len`
    /// observations.
    pub fn reset(&mut self, len: usize) {
        let size = if len == 0 { 0 } else { 2 * len - 1 };
        self.next_label = len;
        self.parents.resize(size, 0);
        for (label, parent) in self.parents.iter_mut().enumerate() {
            *parent = label;
        }
    }

    /// Union the two clusters represented by the given root labels and
    /// return the freshly minted label of the merged cluster.
    ///
    /// If the two clusters have already been merged, then this is a no-op
    /// and no label is minted.
    pub fn union(&mut self, cluster_a: usize, cluster_b: usize) -> Option<usize> {
        if self.find(cluster_a) == self.find(cluster_b) {
            return None;
        }

        assert!(self.next_label < self.parents.len());
        let label = self.next_label;
        self.parents[cluster_a] = label;
        self.parents[cluster_b] = label;
        self.next_label += 1;
        Some(label)
    }

    /// Return the root cluster label containing the cluster given.
    pub fn find(&mut self, mut cluster: usize) -> usize {
        // Find the root of this cluster; the root is
        // the current label of the cluster.
        let mut root = cluster;
        while let Some(parent) = self.parent(root) {
            root = parent;
        }
        // To speed up subsequent calls to `find`, we
        // set the parent of this cluster and all of its
        // ancestors up to `root`.
        while let Some(parent) = self.parent(cluster) {
            self.parents[cluster] = root;
            cluster = parent;
        }
        root
    }

    /// Return the parent of the given cluster, if one exists. If the given
    /// cluster is a root, then `None` is returned.
    fn parent(&self, cluster: usize) -> Option<usize> {
        let parent = self.parents[cluster];
        if parent == cluster {
            None
        } else {
            Some(parent)
        }
    }

    /// Rewrite the cluster labels in each step of a complete dendrogram so
    /// that singletons keep the labels `0..n` and the i-th emitted merge
    /// creates the label `n + i`.
    ///
    /// When `ordered` is true, the steps are first sorted by ascending
    /// dissimilarity, which yields the canonical dendrogram for the
    /// order-independent linkage rules. Order-dependent rules must pass
    /// false so that the recorded merge order survives.
    pub fn relabel<T: PartialOrd>(
        &mut self,
        dendrogram: &mut Dendrogram<T>,
        ordered: bool,
    ) {
        self.reset(dendrogram.observations());
        if ordered {
            dendrogram.steps_mut().sort_by(|step1, step2| {
                // Floats only order partially because of NaN. A NaN
                // dissimilarity between two clusters indicates a bug
                // somewhere, so fail loudly rather than letting it
                // migrate through the dendrogram silently.
                step1
                    .dissimilarity
                    .partial_cmp(&step2.dissimilarity)
                    .expect("NaNs not allowed in dendrogram")
            });
        }
        for i in 0..dendrogram.len() {
            let cluster_a = self.find(dendrogram[i].cluster_a);
            let cluster_b = self.find(dendrogram[i].cluster_b);
            self.union(cluster_a, cluster_b);
            dendrogram[i].set_clusters(cluster_a, cluster_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UnionFind;
    use crate::dendrogram::{Dendrogram, Step};

    #[test]
    fn trivial_find() {
        let mut set = UnionFind::with_len(5);
        // In the trivial set, each member is its own cluster.
        for i in 0..5 {
            assert_eq!(i, set.find(i));
        }
    }

    #[test]
    fn union_mints_labels_in_sequence() {
        let mut set = UnionFind::with_len(5);

        assert_eq!(set.union(1, 3), Some(5));
        assert_eq!(0, set.find(0));
        assert_eq!(5, set.find(1));
        assert_eq!(2, set.find(2));
        assert_eq!(5, set.find(3));
        assert_eq!(4, set.find(4));
        assert_eq!(5, set.find(5));

        assert_eq!(set.union(5, 2), Some(6));
        assert_eq!(6, set.find(1));
        assert_eq!(6, set.find(2));
        assert_eq!(6, set.find(3));
        assert_eq!(6, set.find(5));
        assert_eq!(6, set.find(6));

        assert_eq!(set.union(0, 4), Some(7));
        assert_eq!(7, set.find(0));
        assert_eq!(7, set.find(4));
        assert_eq!(7, set.find(7));

        assert_eq!(set.union(6, 7), Some(8));
        for label in 0..=8 {
            assert_eq!(8, set.find(label));
        }
    }

    #[test]
    fn union_is_idempotent() {
        let mut set = UnionFind::with_len(5);

        set.union(1, 3);
        set.union(5, 2);
        // `1` is already in the cluster `5`, so do a no-op union.
        assert_eq!(set.union(5, 1), None);
        set.union(0, 4);
        set.union(6, 7);

        // The set is now full, so everything should be in the same cluster.
        for label in 0..=8 {
            assert_eq!(8, set.find(label));
        }

        // Union two clusters already in the same cluster when the set is
        // full.
        assert_eq!(set.union(1, 4), None);
        for label in 0..=8 {
            assert_eq!(8, set.find(label));
        }
    }

    #[test]
    fn relabel_unsorted() {
        let mut dend = Dendrogram::new(5);
        dend.push(Step::new(1, 3, 0.01));
        dend.push(Step::new(1, 2, 0.02));
        dend.push(Step::new(0, 4, 0.015));
        dend.push(Step::new(1, 4, 0.03));

        let mut set = UnionFind::new();
        set.relabel(&mut dend, false);

        assert_eq!(
            dend.steps(),
            &[
                Step::new(1, 3, 0.01),
                Step::new(2, 5, 0.02),
                Step::new(0, 4, 0.015),
                Step::new(6, 7, 0.03),
            ]
        );
    }

    #[test]
    fn relabel_sorted() {
        let mut dend = Dendrogram::new(5);
        dend.push(Step::new(1, 3, 0.01));
        dend.push(Step::new(1, 2, 0.02));
        dend.push(Step::new(0, 4, 0.015));
        dend.push(Step::new(1, 4, 0.03));

        let mut set = UnionFind::new();
        set.relabel(&mut dend, true);

        assert_eq!(
            dend.steps(),
            &[
                Step::new(1, 3, 0.01),
                Step::new(0, 4, 0.015),
                Step::new(2, 5, 0.02),
                Step::new(6, 7, 0.03),
            ]
        );
    }

    #[test]
    fn relabel_is_idempotent() {
        let mut dend = Dendrogram::new(5);
        dend.push(Step::new(1, 3, 0.01));
        dend.push(Step::new(1, 2, 0.02));
        dend.push(Step::new(0, 4, 0.015));
        dend.push(Step::new(1, 4, 0.03));

        let mut set = UnionFind::new();
        set.relabel(&mut dend, true);
        let canonical: Vec<_> = dend.steps().to_vec();

        set.relabel(&mut dend, true);
        assert_eq!(dend.steps(), &*canonical);
    }
}
