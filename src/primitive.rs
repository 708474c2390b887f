use crate::active::Active;
use crate::dendrogram::Dendrogram;
use crate::float::Float;
use crate::matrix::DistanceMatrix;
use crate::rule;
use crate::{LinkageState, Rule};

/// Perform hierarchical clustering using the "primitive" algorithm as
/// described in Müllner's paper.
///
/// Note that this implementation is the "naive" implementation of
/// hierarchical clustering, and is therefore terribly slow: every merge
/// rescans the entire matrix for the closest pair. Its value is as an
/// obviously-correct reference that the fast algorithms are tested
/// against. Use [`linkage`](crate::linkage) instead to have the
/// appropriate algorithm chosen for you.
pub fn primitive<T: Float>(
    matrix: &mut DistanceMatrix<T>,
    rule: Rule,
) -> Dendrogram<T> {
    let mut state = LinkageState::new();
    let mut steps = Dendrogram::new(matrix.observations());
    primitive_with(&mut state, matrix, rule, &mut steps);
    steps
}

/// Like [`primitive`], but amortizes allocation.
///
/// See [`linkage_with`](crate::linkage_with) for details.
///
/// Note that this implementation is the "naive" implementation of
/// hierarchical clustering, and is therefore terribly slow.
#[inline(never)]
pub fn primitive_with<T: Float>(
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

    for _ in 0..matrix.observations() - 1 {
        let (a, b, dist) = argmin(matrix, &state.active).unwrap();
        let (size_a, size_b) = (state.sizes[a], state.sizes[b]);

        match rule {
            Rule::Single => {
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
            Rule::Complete => {
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
            Rule::Average => {
                for x in state.active.range(..a) {
                    rule::average(
                        matrix[[x, a]],
                        &mut matrix[[x, b]],
                        size_a,
                        size_b,
                    );
                }
                for x in state.active.range(a..b).skip(1) {
                    rule::average(
                        matrix[[a, x]],
                        &mut matrix[[x, b]],
                        size_a,
                        size_b,
                    );
                }
                for x in state.active.range(b..).skip(1) {
                    rule::average(
                        matrix[[a, x]],
                        &mut matrix[[b, x]],
                        size_a,
                        size_b,
                    );
                }
            }
            Rule::Weighted => {
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
            Rule::Ward => {
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
            Rule::Centroid => {
                for x in state.active.range(..a) {
                    rule::centroid(
                        matrix[[x, a]],
                        &mut matrix[[x, b]],
                        dist,
                        size_a,
                        size_b,
                    );
                }
                for x in state.active.range(a..b).skip(1) {
                    rule::centroid(
                        matrix[[a, x]],
                        &mut matrix[[x, b]],
                        dist,
                        size_a,
                        size_b,
                    );
                }
                for x in state.active.range(b..).skip(1) {
                    rule::centroid(
                        matrix[[a, x]],
                        &mut matrix[[b, x]],
                        dist,
                        size_a,
                        size_b,
                    );
                }
            }
            Rule::Median => {
                for x in state.active.range(..a) {
                    rule::median(matrix[[x, a]], &mut matrix[[x, b]], dist);
                }
                for x in state.active.range(a..b).skip(1) {
                    rule::median(matrix[[a, x]], &mut matrix[[x, b]], dist);
                }
                for x in state.active.range(b..).skip(1) {
                    rule::median(matrix[[a, x]], &mut matrix[[b, x]], dist);
                }
            }
        }
        state.merge(steps, a, b, dist);
    }
    state.set.relabel(steps, !rule.order_dependent());
    rule.sqrt(steps);
}

/// Find the pair of active clusters with the smallest dissimilarity.
#[inline(never)]
fn argmin<T: Float>(
    matrix: &DistanceMatrix<T>,
    active: &Active,
) -> Option<(usize, usize, T)> {
    // A natural representation for min is Option<_>, but this requires
    // an additional comparison in the inner loop to check for None.
    // Instead, we use the first active cell in the matrix as our initial
    // minimum.
    let mut min = match active.iter().next() {
        None => return None,
        Some(row) => match active.range(row..).nth(1) {
            None => return None,
            Some(col) => (row, col, matrix[[row, col]]),
        },
    };
    for row in active.iter() {
        for col in active.range(row..).skip(1) {
            let value = matrix[[row, col]];
            if value < min.2 {
                min = (row, col, value);
            }
        }
    }
    Some(min)
}
