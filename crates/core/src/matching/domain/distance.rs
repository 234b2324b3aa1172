use thiserror::Error;

use crate::shared::embedding::Embedding;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("embedding dimension mismatch: {left} vs {right}")]
pub struct DimensionMismatch {
    pub left: usize,
    pub right: usize,
}

/// Euclidean distance between two embeddings, accumulated in `f64`.
///
/// This is the metric the tolerance threshold is calibrated against.
pub fn euclidean_distance(a: &Embedding, b: &Embedding) -> Result<f64, DimensionMismatch> {
    if a.dimension() != b.dimension() {
        return Err(DimensionMismatch {
            left: a.dimension(),
            right: b.dimension(),
        });
    }
    let sum: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}
