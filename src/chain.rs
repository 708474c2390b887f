use std::mem;

use crate::dendrogram::Dendrogram;
use crate::float::Float;
use crate::matrix::DistanceMatrix;
use crate::rule;
use crate::{ChainRule, LinkageState};

/// Perform hierarchical clustering using the "nearest neighbor chain"
/// algorithm as described in Müllner's paper.
///
/// The algorithm repeatedly follows nearest-neighbor links until it finds
/// a pair of clusters that are each other's nearest neighbor, merges them,
/// and rewrites the matrix in place with the rule's update formula. It
/// covers exactly the rules that never produce inversions, which is what
/// [`ChainRule`] encodes.
///
/// In general, one should prefer to use [`linkage`](crate::linkage), since
/// it tries to pick the fastest algorithm depending on the rule supplied.
pub fn nnchain<T: Float>(
    matrix: &mut DistanceMatrix<T>,
    rule: ChainRule,
) -> Dendrogram<T> {
    let mut state = LinkageState::new();
    let mut steps = Dendrogram::new(matrix.observations());
    nnchain_with(&mut state, matrix, rule, &mut steps);
    steps
}

/// Like [`nnchain`], but amortizes allocation.
///
/// See [`linkage_with`](crate::linkage_with) for details.
#[inline(never)]
pub fn nnchain_with<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    rule: ChainRule,
    steps: &mut Dendrogram<T>,
) {
    rule.square(matrix);

    steps.reset(matrix.observations());
    if matrix.observations() < 2 {
        return;
    }
    state.reset(matrix.observations());
    let (mut a, mut b, mut min);

    for _ in 0..matrix.observations() - 1 {
        if state.chain.len() < 4 {
            // Start a fresh chain at the smallest active cluster and aim
            // it at that cluster's nearest neighbor. Since the chain head
            // is the smallest live index, every candidate sits above it.
            a = state.active.first().expect("at least one active cluster");
            state.chain.clear();
            state.chain.push(a);

            let (nearest, dist) = state
                .active
                .nearest_to(a, |x| matrix[[a, x]])
                .expect("at least two active clusters");
            b = nearest;
            min = dist;
        } else {
            // The previous merge consumed the chain's reciprocal tail;
            // resume from what is left. All of these unwraps are
            // guaranteed to succeed because the chain has at least 4
            // elements.
            state.chain.pop().unwrap();
            state.chain.pop().unwrap();
            b = state.chain.pop().unwrap();
            a = state.chain[state.chain.len() - 1];

            min = if a < b { matrix[[a, b]] } else { matrix[[b, a]] };
        }
        loop {
            state.chain.push(b);
            // Seeding the scan with the dissimilarity of the incoming
            // chain edge and comparing strictly keeps equal
            // dissimilarities from walking the chain in circles.
            for x in state.active.range(..b) {
                if matrix[[x, b]] < min {
                    min = matrix[[x, b]];
                    a = x;
                }
            }
            for x in state.active.range(b..).skip(1) {
                if matrix[[b, x]] < min {
                    min = matrix[[b, x]];
                    a = x;
                }
            }
            b = a;
            a = state.chain[state.chain.len() - 1];
            if b == state.chain[state.chain.len() - 2] {
                break;
            }
        }
        if a > b {
            mem::swap(&mut a, &mut b);
        }
        match rule {
            ChainRule::Single => single(state, matrix, a, b),
            ChainRule::Complete => complete(state, matrix, a, b),
            ChainRule::Average => average(state, matrix, a, b),
            ChainRule::Weighted => weighted(state, matrix, a, b),
            ChainRule::Ward => ward(state, matrix, a, b),
        }
        state.merge(steps, a, b, min);
    }
    state.set.relabel(steps, true);
    rule.sqrt(steps);
}

#[inline]
fn single<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    for x in state.active.range(..a) {
        rule::single(matrix[[x, a]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(a..b).skip(1) {
        rule::single(matrix[[a, x]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(b..).skip(1) {
        rule::single(matrix[[a, x]], &mut matrix[[b, x]]);
    }
}

#[inline]
fn complete<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    for x in state.active.range(..a) {
        rule::complete(matrix[[x, a]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(a..b).skip(1) {
        rule::complete(matrix[[a, x]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(b..).skip(1) {
        rule::complete(matrix[[a, x]], &mut matrix[[b, x]]);
    }
}

#[inline]
fn average<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let (size_a, size_b) = (state.sizes[a], state.sizes[b]);

    for x in state.active.range(..a) {
        rule::average(matrix[[x, a]], &mut matrix[[x, b]], size_a, size_b);
    }
    for x in state.active.range(a..b).skip(1) {
        rule::average(matrix[[a, x]], &mut matrix[[x, b]], size_a, size_b);
    }
    for x in state.active.range(b..).skip(1) {
        rule::average(matrix[[a, x]], &mut matrix[[b, x]], size_a, size_b);
    }
}

#[inline]
fn weighted<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    for x in state.active.range(..a) {
        rule::weighted(matrix[[x, a]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(a..b).skip(1) {
        rule::weighted(matrix[[a, x]], &mut matrix[[x, b]]);
    }
    for x in state.active.range(b..).skip(1) {
        rule::weighted(matrix[[a, x]], &mut matrix[[b, x]]);
    }
}

#[inline]
fn ward<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let dist = matrix[[a, b]];
    let (size_a, size_b) = (state.sizes[a], state.sizes[b]);

    for x in state.active.range(..a) {
        rule::ward(
            matrix[[x, a]],
            &mut matrix[[x, b]],
            dist,
            size_a,
            size_b,
            state.sizes[x],
        );
    }
    for x in state.active.range(a..b).skip(1) {
        rule::ward(
            matrix[[a, x]],
            &mut matrix[[x, b]],
            dist,
            size_a,
            size_b,
            state.sizes[x],
        );
    }
    for x in state.active.range(b..).skip(1) {
        rule::ward(
            matrix[[a, x]],
            &mut matrix[[b, x]],
            dist,
            size_a,
            size_b,
            state.sizes[x],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::nnchain;
    use crate::test::DistinctMatrix;
    use crate::{primitive, ChainRule, Rule};

    quickcheck::quickcheck! {
        fn prop_nnchain_single_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Single);
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Single);
            dend_prim == dend_nnchain
        }

        fn prop_nnchain_complete_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Complete);
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Complete);
            dend_prim == dend_nnchain
        }

        fn prop_nnchain_average_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Average);
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Average);
            dend_prim.eq_with_epsilon(&dend_nnchain, 0.0000000001)
        }

        fn prop_nnchain_weighted_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Weighted);
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Weighted);
            dend_prim.eq_with_epsilon(&dend_nnchain, 0.0000000001)
        }

        fn prop_nnchain_ward_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Ward);
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Ward);
            dend_prim.eq_with_epsilon(&dend_nnchain, 0.0000000001)
        }
    }
}
