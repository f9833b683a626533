pub mod distance;
pub mod error;
pub mod kdtree;

pub use kdtree::KdTree;

/// The three pairwise similarity/distance measures the store can compare
/// records with. Mirrors the HTTP adapter's `/compare/*` routes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum LinearAlgorithm {
    EuclideanDistance,
    CosineSimilarity,
    DotProductSimilarity,
}

/// A kernel function pointer, selected at runtime by [`LinearAlgorithm`].
pub type DistanceFn = fn(&[f32], &[f32]) -> f32;

impl From<LinearAlgorithm> for DistanceFn {
    fn from(value: LinearAlgorithm) -> DistanceFn {
        match value {
            LinearAlgorithm::CosineSimilarity => distance::cosine_similarity,
            LinearAlgorithm::EuclideanDistance => distance::euclidean_distance,
            LinearAlgorithm::DotProductSimilarity => distance::dot_product,
        }
    }
}
