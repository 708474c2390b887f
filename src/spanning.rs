use crate::dendrogram::Dendrogram;
use crate::float::Float;
use crate::matrix::DistanceMatrix;
use crate::LinkageState;

/// Perform hierarchical clustering using the minimum spanning tree
/// algorithm as described in Müllner's paper.
///
/// This computes single linkage only, by growing a minimum spanning tree
/// one cluster at a time. Unlike the other algorithms, it never writes to
/// the matrix.
///
/// In general, one should prefer to use [`linkage`](crate::linkage), since
/// it tries to pick the fastest algorithm depending on the rule supplied.
pub fn mst<T: Float>(matrix: &DistanceMatrix<T>) -> Dendrogram<T> {
    let mut state = LinkageState::new();
    let mut steps = Dendrogram::new(matrix.observations());
    mst_with(&mut state, matrix, &mut steps);
    steps
}

/// Like [`mst`], but amortizes allocation.
///
/// See [`linkage_with`](crate::linkage_with) for details.
#[inline(never)]
pub fn mst_with<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &DistanceMatrix<T>,
    steps: &mut Dendrogram<T>,
) {
    steps.reset(matrix.observations());
    if matrix.observations() < 2 {
        return;
    }
    state.reset(matrix.observations());

    let mut cluster = 0;
    state.active.remove(cluster);

    for _ in 0..matrix.observations() - 1 {
        // One scan folds both halves of the step together: every
        // remaining cluster's cheapest edge into the growing tree is
        // refreshed against the newest member, and the smallest refreshed
        // edge picks the cluster to absorb next.
        let (active, min_dists) = (&state.active, &mut state.min_dists);
        let (nearest, dissimilarity) = active
            .nearest_to(cluster, |x| {
                let edge = if x < cluster {
                    matrix[[x, cluster]]
                } else {
                    matrix[[cluster, x]]
                };
                let slot = &mut min_dists[x];
                if edge < *slot {
                    *slot = edge;
                }
                *slot
            })
            .expect("at least one active cluster");
        state.merge(steps, nearest, cluster, dissimilarity);
        cluster = nearest;
    }
    state.set.relabel(steps, true);
}

#[cfg(test)]
mod tests {
    use super::mst;
    use crate::test::DistinctMatrix;
    use crate::{generic, primitive, Rule};

    quickcheck::quickcheck! {
        fn prop_mst_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Single);
            let dend_mst = mst(&mat.matrix());
            dend_prim == dend_mst
        }

        fn prop_mst_generic(mat: DistinctMatrix) -> bool {
            let dend_generic = generic(&mut mat.matrix(), Rule::Single);
            let dend_mst = mst(&mat.matrix());
            dend_generic == dend_mst
        }
    }
}
