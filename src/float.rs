mod private {
    /// The `Sealed` trait stops crates other than hclust from implementing
    /// any traits that use it.
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A trait for the floating point types that can act as dissimilarities.
///
/// Most of the floating point surface comes from `num_traits::Float`; this
/// trait only adds the conversions the Lance-Williams update formulas need
/// (cluster sizes and rational constants).
///
/// This trait is sealed. Callers therefore can not implement it. It is only
/// implemented for the `f32` and `f64` types.
pub trait Float: self::private::Sealed + num_traits::Float {
    /// Convert a cluster size into this float type.
    fn from_usize(v: usize) -> Self;
    /// Convert an `f64` constant into this float type.
    fn from_f64(v: f64) -> Self;
}

impl Float for f32 {
    fn from_usize(v: usize) -> f32 {
        v as f32
    }

    fn from_f64(v: f64) -> f32 {
        v as f32
    }
}

impl Float for f64 {
    fn from_usize(v: usize) -> f64 {
        v as f64
    }

    fn from_f64(v: f64) -> f64 {
        v
    }
}
