//! In-memory vector index
//!
//! Brute-force similarity over every point in the collection. Suitable
//! for development and tests; production deployments use the Qdrant
//! adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{VectorError, VectorResult};
use super::VectorIndex;
use crate::core::types::{IndexPoint, ScoredPoint};

/// Distance metric for vector similarity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Distance {
    /// Cosine similarity (normalized dot product)
    #[default]
    Cosine,
    /// Euclidean distance (L2), mapped to `1 / (1 + d)`
    Euclidean,
    /// Dot product (inner product)
    Dot,
}

impl Distance {
    fn similarity(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::Cosine => cosine_similarity(a, b),
            Distance::Euclidean => {
                let distance: f32 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + distance)
            }
            Distance::Dot => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        }
    }
}

/// Returns a value between -1 and 1, where 1 means identical direction
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[derive(Debug)]
struct Collection {
    dimension: u64,
    /// Insertion order; ties in score keep this order
    points: Vec<IndexPoint>,
    /// Point id to its slot in `points`
    positions: HashMap<Uuid, usize>,
}

impl Collection {
    fn check_dimension(&self, vector: &[f32]) -> VectorResult<()> {
        let actual = vector.len() as u64;
        if actual != self.dimension {
            return Err(VectorError::InvalidDimension {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }

    fn insert_or_replace(&mut self, point: IndexPoint) {
        match self.positions.get(&point.id) {
            Some(&slot) => self.points[slot] = point,
            None => {
                self.positions.insert(point.id, self.points.len());
                self.points.push(point);
            }
        }
    }
}

/// Vector index held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    distance: Distance,
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryVectorIndex {
    /// Create an empty index using cosine similarity
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Number of points stored in `collection` (0 if it does not exist)
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    /// Snapshot of every point in `collection`, in insertion order
    pub async fn points(&self, collection: &str) -> Vec<IndexPoint> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> VectorResult<()> {
        let mut collections = self.collections.write().await;

        if let Some(existing) = collections.get(collection) {
            if existing.dimension != dimension {
                return Err(VectorError::InvalidDimension {
                    expected: existing.dimension,
                    actual: dimension,
                });
            }
            debug!("Collection '{}' already exists", collection);
            return Ok(());
        }

        collections.insert(
            collection.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
                positions: HashMap::new(),
            },
        );
        info!(
            "Created collection '{}' with vector size {}",
            collection, dimension
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorError::CollectionNotFound {
                name: collection.to_string(),
            })?;

        // Validate the whole batch before touching the collection
        for point in &points {
            target.check_dimension(&point.vector)?;
        }

        let count = points.len();
        for point in points {
            target.insert_or_replace(point);
        }

        debug!("Upserted {} points into '{}'", count, collection);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorError::CollectionNotFound {
                name: collection.to_string(),
            })?;
        target.check_dimension(vector)?;

        let mut scored: Vec<(f32, &IndexPoint)> = target
            .points
            .iter()
            .map(|p| (self.distance.similarity(vector, &p.vector), p))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<ScoredPoint> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, p)| ScoredPoint {
                id: p.id,
                score,
                payload: p.payload.clone(),
            })
            .collect();

        debug!(
            "Search in '{}' returned {} results (top_k: {})",
            collection,
            results.len(),
            top_k
        );
        Ok(results)
    }
}
