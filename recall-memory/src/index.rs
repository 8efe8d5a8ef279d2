//! Exact squared-L2 vector index
//!
//! Append-only, brute-force nearest-neighbour search over contiguous storage.
//! Not internally synchronised; callers serialise inserts against searches.

use serde::{Deserialize, Serialize};

use crate::embedding::l2_squared;
use crate::error::{MemoryError, Result};

/// Flat (exhaustive) L2 index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatIndex {
    /// Fixed by the first insert; zero while empty
    dimension: usize,
    /// Row-major vectors, `dimension` floats per position
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Index dimension, `None` before the first insert
    pub fn dimension(&self) -> Option<usize> {
        (self.dimension > 0).then_some(self.dimension)
    }

    /// Check a vector against the index dimension without inserting it
    pub fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: 0,
            });
        }
        if self.dimension != 0 && vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Append a vector and return its position
    pub fn insert(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        if self.dimension == 0 {
            self.dimension = vector.len();
        }
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    /// Vector stored at `position`
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Drop every position at or past `len`
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.data.truncate(len * self.dimension);
        }
        if self.data.is_empty() {
            self.dimension = 0;
        }
    }

    /// Up to `k` nearest positions, ascending by distance, ties by position
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, l2_squared(query, row)))
            .collect();

        let by_distance =
            |a: &(usize, f32), b: &(usize, f32)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_by(by_distance);
        Ok(scored)
    }

    /// Serialize to the binary blob format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from the binary blob format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let index: FlatIndex = bincode::deserialize(bytes)?;
        let ragged = match index.dimension {
            0 => !index.data.is_empty(),
            dim => index.data.len() % dim != 0,
        };
        if ragged {
            return Err(MemoryError::corrupted(format!(
                "index blob holds {} floats, not a multiple of dimension {}",
                index.data.len(),
                index.dimension
            )));
        }
        Ok(index)
    }
}
