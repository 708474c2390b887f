use crate::dendrogram::Dendrogram;
use crate::float::Float;
use crate::matrix::DistanceMatrix;
use crate::rule;
use crate::{LinkageState, Rule};

/// Perform hierarchical clustering using Müllner's "generic" algorithm.
///
/// This is the only sub-cubic algorithm that supports every linkage rule,
/// including the order-dependent `Centroid` and `Median` rules, whose
/// dendrograms may contain inversions.
///
/// The algorithm keeps a candidate nearest neighbor for every cluster in a
/// priority queue. The queued dissimilarities are underestimates: a merge
/// can only raise the true dissimilarity relative to the cached value, so
/// a stale entry is detected and repaired when it reaches the top of the
/// queue. Repairing eagerly instead would cost a linear scan per neighbor
/// per merge and forfeit the Θ(N²) best case.
///
/// In general, one should prefer to use [`linkage`](crate::linkage), since
/// it tries to pick the fastest algorithm depending on the rule supplied.
pub fn generic<T: Float>(
    matrix: &mut DistanceMatrix<T>,
    rule: Rule,
) -> Dendrogram<T> {
    let mut state = LinkageState::new();
    let mut steps = Dendrogram::new(matrix.observations());
    generic_with(&mut state, matrix, rule, &mut steps);
    steps
}

/// Like [`generic`], but amortizes allocation.
///
/// See [`linkage_with`](crate::linkage_with) for details.
#[inline(never)]
pub fn generic_with<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    rule: Rule,
    steps: &mut Dendrogram<T>,
) {
    rule.square(matrix);

    steps.reset(matrix.observations());
    if matrix.observations() < 2 {
        return;
    }
    state.reset(matrix.observations());

    {
        // For each cluster `row`, find its nearest neighbor among the
        // clusters above it and record it in our heap. The last cluster
        // has nothing above it and keeps an infinite priority.
        let nearest = &mut state.nearest;
        state.queue.heapify(|dists| {
            for row in 0..matrix.observations() - 1 {
                let (mut min, mut min_dist) = (row + 1, matrix[[row, row + 1]]);
                for col in row + 2..matrix.observations() {
                    if matrix[[row, col]] < min_dist {
                        min = col;
                        min_dist = matrix[[row, col]];
                    }
                }
                dists[row] = min_dist;
                nearest[row] = min;
            }
        });
    }
    for _ in 0..matrix.observations() - 1 {
        loop {
            // `a` is our candidate cluster to merge next. Ideally,
            // state.nearest[a] tells us which cluster to merge it with,
            // but it could be wrong. It is wrong precisely when the
            // cached priority of `a` is less than the dissimilarity to
            // its recorded neighbor. In that case, rescan the clusters
            // above `a` to find its actual nearest neighbor.
            let a = state.queue.peek().unwrap();
            if matrix[[a, state.nearest[a]]] == *state.queue.priority(a) {
                break;
            }

            let mut min = T::max_value();
            for x in state.active.range(a..).skip(1) {
                if matrix[[a, x]] < min {
                    min = matrix[[a, x]];
                    state.nearest[a] = x;
                }
            }
            state.queue.set_priority(a, min);
        }

        let a = state.queue.pop().unwrap();
        let b = state.nearest[a];
        let dist = matrix[[a, b]];
        match rule {
            Rule::Single => single(state, matrix, a, b),
            Rule::Complete => complete(state, matrix, a, b),
            Rule::Average => average(state, matrix, a, b),
            Rule::Weighted => weighted(state, matrix, a, b),
            Rule::Ward => ward(state, matrix, a, b),
            Rule::Centroid => centroid(state, matrix, a, b),
            Rule::Median => median(state, matrix, a, b),
        }
        state.merge(steps, a, b, dist);
    }
    state.set.relabel(steps, !rule.order_dependent());
    rule.sqrt(steps);
}

#[inline]
fn single<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;

    for x in state.active.range(..a) {
        rule::single(matrix[[x, a]], &mut matrix[[x, b]]);
        if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
    }
    for x in state.active.range(a..b).skip(1) {
        rule::single(matrix[[a, x]], &mut matrix[[x, b]]);
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::single(matrix[[a, x]], &mut matrix[[b, x]]);
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[inline]
fn complete<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;

    // Complete linkage can only grow dissimilarities, and a cached
    // priority is an underestimate of the true value, so no priority can
    // ever need lowering here. Only the nearest pointers to the vanishing
    // cluster need retargeting.
    for x in state.active.range(..a) {
        rule::complete(matrix[[x, a]], &mut matrix[[x, b]]);
        if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
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
    let ab = b;
    let (size_a, size_b) = (state.sizes[a], state.sizes[b]);

    for x in state.active.range(..a) {
        rule::average(matrix[[x, a]], &mut matrix[[x, b]], size_a, size_b);
        if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
    }
    for x in state.active.range(a..b).skip(1) {
        rule::average(matrix[[a, x]], &mut matrix[[x, b]], size_a, size_b);
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::average(matrix[[a, x]], &mut matrix[[b, x]], size_a, size_b);
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[inline]
fn weighted<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;

    for x in state.active.range(..a) {
        rule::weighted(matrix[[x, a]], &mut matrix[[x, b]]);
        if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
    }
    for x in state.active.range(a..b).skip(1) {
        rule::weighted(matrix[[a, x]], &mut matrix[[x, b]]);
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::weighted(matrix[[a, x]], &mut matrix[[b, x]]);
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[inline]
fn ward<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;
    let (size_a, size_b) = (state.sizes[a], state.sizes[b]);
    let dist = matrix[[a, b]];

    for x in state.active.range(..a) {
        rule::ward(
            matrix[[x, a]],
            &mut matrix[[x, b]],
            dist,
            size_a,
            size_b,
            state.sizes[x],
        );
        if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
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
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::ward(
            matrix[[a, x]],
            &mut matrix[[b, x]],
            dist,
            size_a,
            size_b,
            state.sizes[x],
        );
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[inline]
fn centroid<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;
    let (size_a, size_b) = (state.sizes[a], state.sizes[b]);
    let dist = matrix[[a, b]];

    // Centroid linkage can produce dissimilarities below anything cached,
    // so even clusters before `a` may need their priority lowered, not
    // just their nearest pointer retargeted.
    for x in state.active.range(..a) {
        rule::centroid(matrix[[x, a]], &mut matrix[[x, b]], dist, size_a, size_b);
        if &matrix[[x, b]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, b]]);
            state.nearest[x] = ab;
        } else if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
    }
    for x in state.active.range(a..b).skip(1) {
        rule::centroid(matrix[[a, x]], &mut matrix[[x, b]], dist, size_a, size_b);
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::centroid(matrix[[a, x]], &mut matrix[[b, x]], dist, size_a, size_b);
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[inline]
fn median<T: Float>(
    state: &mut LinkageState<T>,
    matrix: &mut DistanceMatrix<T>,
    a: usize,
    b: usize,
) {
    let ab = b;
    let dist = matrix[[a, b]];

    for x in state.active.range(..a) {
        rule::median(matrix[[x, a]], &mut matrix[[x, b]], dist);
        if &matrix[[x, b]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, b]]);
            state.nearest[x] = ab;
        } else if state.nearest[x] == a {
            state.nearest[x] = ab;
        }
    }
    for x in state.active.range(a..b).skip(1) {
        rule::median(matrix[[a, x]], &mut matrix[[x, b]], dist);
        if &matrix[[x, ab]] < state.queue.priority(x) {
            state.queue.set_priority(x, matrix[[x, ab]]);
            state.nearest[x] = ab;
        }
    }
    let mut min = *state.queue.priority(b);
    for x in state.active.range(b..).skip(1) {
        rule::median(matrix[[a, x]], &mut matrix[[b, x]], dist);
        if matrix[[ab, x]] < min {
            state.queue.set_priority(b, matrix[[ab, x]]);
            state.nearest[b] = x;
            min = matrix[[ab, x]];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generic;
    use crate::test::DistinctMatrix;
    use crate::{nnchain, primitive, ChainRule, Rule};

    quickcheck::quickcheck! {
        fn prop_generic_single_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Single);
            let dend_generic = generic(&mut mat.matrix(), Rule::Single);
            dend_prim == dend_generic
        }

        fn prop_generic_complete_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Complete);
            let dend_generic = generic(&mut mat.matrix(), Rule::Complete);
            dend_prim == dend_generic
        }

        fn prop_generic_average_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Average);
            let dend_generic = generic(&mut mat.matrix(), Rule::Average);
            dend_prim == dend_generic
        }

        fn prop_generic_weighted_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Weighted);
            let dend_generic = generic(&mut mat.matrix(), Rule::Weighted);
            dend_prim == dend_generic
        }

        fn prop_generic_ward_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Ward);
            let dend_generic = generic(&mut mat.matrix(), Rule::Ward);
            dend_prim == dend_generic
        }

        fn prop_generic_centroid_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Centroid);
            let dend_generic = generic(&mut mat.matrix(), Rule::Centroid);
            dend_prim.eq_with_epsilon(&dend_generic, 0.0000000001)
        }

        fn prop_generic_median_primitive(mat: DistinctMatrix) -> bool {
            let dend_prim = primitive(&mut mat.matrix(), Rule::Median);
            let dend_generic = generic(&mut mat.matrix(), Rule::Median);
            dend_prim.eq_with_epsilon(&dend_generic, 0.0000000001)
        }

        fn prop_generic_single_nnchain(mat: DistinctMatrix) -> bool {
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Single);
            let dend_generic = generic(&mut mat.matrix(), Rule::Single);
            dend_nnchain == dend_generic
        }

        fn prop_generic_complete_nnchain(mat: DistinctMatrix) -> bool {
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Complete);
            let dend_generic = generic(&mut mat.matrix(), Rule::Complete);
            dend_nnchain == dend_generic
        }

        fn prop_generic_average_nnchain(mat: DistinctMatrix) -> bool {
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Average);
            let dend_generic = generic(&mut mat.matrix(), Rule::Average);
            dend_nnchain.eq_with_epsilon(&dend_generic, 0.0000000001)
        }

        fn prop_generic_weighted_nnchain(mat: DistinctMatrix) -> bool {
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Weighted);
            let dend_generic = generic(&mut mat.matrix(), Rule::Weighted);
            dend_nnchain.eq_with_epsilon(&dend_generic, 0.0000000001)
        }

        fn prop_generic_ward_nnchain(mat: DistinctMatrix) -> bool {
            let dend_nnchain = nnchain(&mut mat.matrix(), ChainRule::Ward);
            let dend_generic = generic(&mut mat.matrix(), Rule::Ward);
            dend_nnchain.eq_with_epsilon(&dend_generic, 0.0000000001)
        }
    }
}
