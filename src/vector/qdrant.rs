//! Qdrant adapter
//!
//! Maps [`IndexPoint`]s onto Qdrant points with the payload keys
//! `filename`, `content`, `page_number` and `chunk_index`.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::client::{Payload, QdrantClient};
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config, CreateCollection,
    Distance as QdrantDistance, PointId, PointStruct, SearchPoints, Value, VectorParams,
    VectorsConfig,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{VectorError, VectorResult};
use super::VectorIndex;
use crate::core::types::{IndexPoint, PointPayload, ScoredPoint};

/// Vector index backed by a Qdrant server
pub struct QdrantIndex {
    client: QdrantClient,
}

impl QdrantIndex {
    /// Connect to the Qdrant gRPC endpoint at `url`
    pub fn connect(url: &str) -> VectorResult<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(|e| VectorError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        info!("Connected to Qdrant at {}", url);
        Ok(Self { client })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> VectorResult<()> {
        let exists = self
            .client
            .has_collection(collection)
            .await
            .map_err(|e| VectorError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        if exists {
            debug!("Collection '{}' already exists", collection);
            return Ok(());
        }

        self.client
            .create_collection(&CreateCollection {
                collection_name: collection.to_string(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: dimension,
                        distance: QdrantDistance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorError::CollectionCreationFailed {
                reason: e.to_string(),
            })?;

        info!(
            "Created collection '{}' with vector size {}",
            collection, dimension
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> VectorResult<()> {
        let count = points.len();
        let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();

        self.client
            .upsert_points_blocking(collection, None, points, None)
            .await
            .map_err(|e| VectorError::UpsertFailed {
                reason: e.to_string(),
            })?;

        debug!("Upserted {} points into '{}'", count, collection);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: collection.to_string(),
                vector: vector.to_vec(),
                limit: top_k as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorError::SearchFailed {
                reason: e.to_string(),
            })?;

        response
            .result
            .into_iter()
            .map(|hit| {
                Ok(ScoredPoint {
                    id: point_uuid(hit.id),
                    score: hit.score,
                    payload: read_payload(hit.payload)?,
                })
            })
            .collect()
    }
}

fn to_point_struct(point: IndexPoint) -> PointStruct {
    let mut payload = Payload::new();
    payload.insert("filename", point.payload.filename);
    payload.insert("content", point.payload.content);
    payload.insert("page_number", i64::from(point.payload.page_number));
    payload.insert("chunk_index", point.payload.chunk_index as i64);

    PointStruct::new(point.id.to_string(), point.vector, payload)
}

fn point_uuid(id: Option<PointId>) -> Uuid {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(s)) => Uuid::parse_str(&s).unwrap_or_default(),
        Some(PointIdOptions::Num(n)) => Uuid::from_u128(u128::from(n)),
        None => Uuid::nil(),
    }
}

fn read_payload(mut payload: HashMap<String, Value>) -> VectorResult<PointPayload> {
    let mut take_str = |key: &str| match payload.remove(key).and_then(|v| v.kind) {
        Some(Kind::StringValue(s)) => Ok(s),
        _ => Err(VectorError::MalformedPayload {
            reason: format!("missing string field '{}'", key),
        }),
    };
    let filename = take_str("filename")?;
    let content = take_str("content")?;

    let mut take_int = |key: &str| match payload.remove(key).and_then(|v| v.kind) {
        Some(Kind::IntegerValue(n)) => n,
        Some(Kind::DoubleValue(f)) => f as i64,
        _ => 0,
    };
    let page_number = take_int("page_number");
    let chunk_index = take_int("chunk_index");

    Ok(PointPayload {
        filename,
        content,
        page_number: page_number as i32,
        chunk_index: chunk_index.max(0) as usize,
    })
}
