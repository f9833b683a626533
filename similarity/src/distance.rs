use pulp::{Arch, Simd, WithSimd};

/// Sentinel returned by every kernel below when the two inputs do not share
/// a dimension. Matches the source lineage's `-1.0` return rather than
/// panicking, since callers (the HTTP adapter) need to turn a mismatch into
/// a 400 response instead of crashing the process.
pub const DIMENSION_MISMATCH_SENTINEL: f32 = -1.0;

struct Magnitude<'a> {
    first: &'a [f32],
    second: &'a [f32],
}

impl WithSimd for Magnitude<'_> {
    type Output = f32;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let (first_head, first_tail) = S::as_simd_f32s(self.first);
        let (second_head, second_tail) = S::as_simd_f32s(self.second);

        let mut mag_first = simd.splat_f32s(0.0);
        let mut mag_second = simd.splat_f32s(0.0);

        for (&chunk_first, &chunk_second) in first_head.iter().zip(second_head) {
            mag_first = simd.mul_add_f32s(chunk_first, chunk_first, mag_first);
            mag_second = simd.mul_add_f32s(chunk_second, chunk_second, mag_second);
        }

        let mag_first = simd.reduce_sum_f32s(mag_first);
        let mag_second = simd.reduce_sum_f32s(mag_second);

        let mut scalar_mag_first = 0.0;
        let mut scalar_mag_second = 0.0;

        for (&x, &y) in first_tail.iter().zip(second_tail) {
            scalar_mag_first += x * x;
            scalar_mag_second += y * y;
        }
        let mag_first = mag_first + scalar_mag_first;
        let mag_second = mag_second + scalar_mag_second;

        mag_first.sqrt() * mag_second.sqrt()
    }
}

/// Cosine similarity: the cosine of the angle between two vectors, in
/// `[-1, 1]`. Scale-invariant: only direction matters, not magnitude.
///
/// Returns [`DIMENSION_MISMATCH_SENTINEL`] instead of panicking when the
/// two slices differ in length. If either vector has zero norm the result
/// is `NaN` (`0.0 / 0.0`), which is an accepted, documented outcome rather
/// than a special case.
#[tracing::instrument(skip_all)]
pub fn cosine_similarity(first: &[f32], second: &[f32]) -> f32 {
    if first.len() != second.len() {
        return DIMENSION_MISMATCH_SENTINEL;
    }

    let dot = dot_product(first, second);

    let arch = Arch::new();
    let magnitude = arch.dispatch(Magnitude { first, second });

    dot / magnitude
}

struct DotProduct<'a> {
    first: &'a [f32],
    second: &'a [f32],
}

impl WithSimd for DotProduct<'_> {
    type Output = f32;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let (first_head, first_tail) = S::as_simd_f32s(self.first);
        let (second_head, second_tail) = S::as_simd_f32s(self.second);

        let mut sum_of_points = simd.splat_f32s(0.0);

        for (&chunk_first, &chunk_second) in first_head.iter().zip(second_head) {
            sum_of_points = simd.mul_add_f32s(chunk_first, chunk_second, sum_of_points);
        }

        let mut dot_product = simd.reduce_sum_f32s(sum_of_points);

        dot_product += first_tail
            .iter()
            .zip(second_tail)
            .map(|(&x, &y)| x * y)
            .sum::<f32>();
        dot_product
    }
}

/// Dot product (scalar product) of two equal-length vectors.
///
/// Returns [`DIMENSION_MISMATCH_SENTINEL`] instead of panicking on a
/// length mismatch.
#[tracing::instrument(skip_all)]
pub fn dot_product(first: &[f32], second: &[f32]) -> f32 {
    if first.len() != second.len() {
        return DIMENSION_MISMATCH_SENTINEL;
    }

    let arch = Arch::new();
    arch.dispatch(DotProduct { first, second })
}

struct EuclideanDistance<'a> {
    first: &'a [f32],
    second: &'a [f32],
}

impl WithSimd for EuclideanDistance<'_> {
    type Output = f32;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let (first_head, first_tail) = S::as_simd_f32s(self.first);
        let (second_head, second_tail) = S::as_simd_f32s(self.second);

        let mut sum_of_squares = simd.splat_f32s(0.0);

        for (&cord_first, &cord_second) in first_head.iter().zip(second_head) {
            let diff = simd.sub_f32s(cord_first, cord_second);
            sum_of_squares = simd.mul_add_f32s(diff, diff, sum_of_squares);
        }

        let mut total = simd.reduce_sum_f32s(sum_of_squares);

        total += first_tail
            .iter()
            .zip(second_tail)
            .map(|(&x, &y)| {
                let diff = x - y;
                diff * diff
            })
            .sum::<f32>();

        total.sqrt()
    }
}

/// Euclidean (straight-line) distance between two equal-length vectors.
///
/// Returns [`DIMENSION_MISMATCH_SENTINEL`] instead of panicking on a
/// length mismatch.
#[tracing::instrument(skip_all)]
pub fn euclidean_distance(first: &[f32], second: &[f32]) -> f32 {
    if first.len() != second.len() {
        return DIMENSION_MISMATCH_SENTINEL;
    }

    let arch = Arch::new();
    arch.dispatch(EuclideanDistance { first, second })
}

/// Squared Euclidean distance (no final `sqrt`) - what the KD-tree uses
/// internally, since relative ordering of distances doesn't need the root.
///
/// Unlike the public kernels above, this is only ever called by the tree
/// with vectors it already knows share the tree's dimension, so it panics
/// rather than returning a sentinel - a mismatch here is a bug in the
/// caller, not bad input from the wire.
#[inline]
pub fn squared_euclidean_distance(first: &[f32], second: &[f32]) -> f32 {
    debug_assert_eq!(first.len(), second.len());

    first
        .iter()
        .zip(second.iter())
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}
