//! Color quantization with k-means clustering.
//!
//! [`kmeans::KMeans`] partitions a list of vectors into `k` groups with Lloyd's algorithm.
//! [`quantize`] uses it to reduce an RGBA image to a palette of `k` colors.

pub mod distance;
pub mod error;
pub mod kmeans;
pub mod quantize;
pub mod sampling;

pub use error::{Error, Result};
pub use kmeans::{ClusteringResult, KMeans};
