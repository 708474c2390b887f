use std::collections::BTreeSet;

use quickcheck::{Arbitrary, Gen};
use rand::Rng;

use crate::matrix::DistanceMatrix;

lazy_static::lazy_static! {
    /// Ten points in three well separated groups, with enough internal
    /// structure that cutting their dendrograms at different heights and
    /// counts produces distinct partitions: `{0, 3, 6, 7, 9}` around the
    /// origin (pairs `0-7` and `3-9` sit close together, `6` hangs off to
    /// the side), `{1, 5, 8}` near `x = 10` and the pair `{2, 4}` far out
    /// in the third quadrant.
    pub static ref POINTS_3D: Vec<[f64; 3]> = vec![
        [0.0, 0.0, 0.0],    // 0
        [10.0, 0.0, 0.0],   // 1
        [-18.0, -5.0, 0.0], // 2
        [0.0, 3.05, 0.0],   // 3
        [-18.0, -5.0, 1.6], // 4
        [10.0, 1.1, 0.0],   // 5
        [-2.4, 1.2, 0.0],   // 6
        [1.0, 0.0, 0.0],    // 7
        [11.3, 0.6, 0.0],   // 8
        [0.0, 3.05, 1.2],   // 9
    ];
}

/// Build the pairwise Euclidean distance matrix of the given points.
pub fn euclidean_matrix(points: &[[f64; 3]]) -> DistanceMatrix<f64> {
    DistanceMatrix::from_fn(points.len(), |i, j| {
        points[i]
            .iter()
            .zip(points[j].iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    })
    .unwrap()
}

/// A reflexive pairwise dissimilarity matrix where every dissimilarity is
/// unique.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct DistinctMatrix {
    matrix: Vec<f64>,
    len: usize,
}

impl DistinctMatrix {
    /// Create a new matrix from an arbitrary sequence of floating point
    /// numbers. If the given sequence has too many numbers, then it is
    /// truncated to an appropriate length such that it is a reflexive
    /// pairwise dissimilarity matrix.
    ///
    /// Also, any NaN values in the matrix are replaced with `0`.
    pub fn new(mut mat: Vec<f64>) -> DistinctMatrix {
        make_distinct(&mut mat);

        if !mat.is_empty() {
            let mut n = observations(mat.len());
            let mut should = (n * (n - 1)) / 2;
            while should > mat.len() {
                n -= 1;
                should = (n * (n - 1)) / 2;
            }
            mat.truncate(should);

            // Forcefully avoid NaN values. This is consistent with the
            // public API precondition that NaN values aren't permitted.
            for v in &mut mat {
                if v.is_nan() {
                    *v = 0.0;
                }
            }
        }

        let n = observations(mat.len());
        DistinctMatrix { matrix: mat, len: n }
    }

    /// Return a fresh copy of the pairwise dissimilarity matrix.
    pub fn matrix(&self) -> DistanceMatrix<f64> {
        DistanceMatrix::from_parts(self.len, self.matrix.clone())
    }
}

impl Arbitrary for DistinctMatrix {
    fn arbitrary(_g: &mut Gen) -> DistinctMatrix {
        let mut rng = rand::thread_rng();
        let size = rng.gen_range(0..30);
        let mut dis = vec![];
        for i in 0..size {
            for _ in i + 1..size {
                dis.push(rng.gen_range(-0.5..=0.5));
            }
        }
        DistinctMatrix::new(dis)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = DistinctMatrix>> {
        Box::new(self.matrix.shrink().map(DistinctMatrix::new))
    }
}

/// Mutate `xs` in place such that all of its elements are distinct.
///
/// This will never change the length of `xs` but may change the values of
/// elements in `xs` that are duplicates of other values.
fn make_distinct(xs: &mut Vec<f64>) {
    use std::cmp::Ordering;

    /// NonNanF64 is a wrapper type for floating point types that always
    /// panics during a comparison if the underlying float is a NaN. This
    /// permits us to use floating point numbers as keys in a BTreeSet.
    #[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
    struct NonNanF64(f64);

    impl Eq for NonNanF64 {}

    impl Ord for NonNanF64 {
        fn cmp(&self, other: &NonNanF64) -> Ordering {
            self.0.partial_cmp(&other.0).unwrap()
        }
    }

    if xs.is_empty() {
        return;
    }
    // Get the first unique value by adding `1.0` to the max of `xs`.
    let mut next =
        1.0 + xs.iter().fold(xs[0], |a, &b| if a > b { a } else { b });
    let mut seen = BTreeSet::new();
    for i in 0..xs.len() {
        let x = NonNanF64(xs[i]);
        if !seen.contains(&x) {
            seen.insert(x);
            continue;
        }
        xs[i] = next;
        next += 1.0;
    }
}

/// Return an upper bound on the expected number of observations for a
/// given condensed matrix size.
///
/// Note that the size may be invalid. For example, a condensed matrix of
/// size `2` isn't valid.
fn observations(condensed_matrix_size: usize) -> usize {
    ((condensed_matrix_size as f64) * 2.0).sqrt().ceil() as usize
}
