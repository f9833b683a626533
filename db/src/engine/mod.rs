pub mod persistence;
pub mod store;

pub use store::{VectorRecord, VectorStore};
