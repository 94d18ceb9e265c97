use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::errors::StoreResult;
use crate::model::Rating;

/// Running rating aggregates keyed by laptop id
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Record `score` for `laptop_id` and return the updated aggregate.
    async fn add(&self, laptop_id: &str, score: f64) -> StoreResult<Rating>;
}

/// Every add mutates, so a plain mutex guards the map.
#[derive(Default)]
pub struct InMemoryRatingStore {
    ratings: Mutex<HashMap<String, Rating>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn add(&self, laptop_id: &str, score: f64) -> StoreResult<Rating> {
        let mut ratings = self.ratings.lock().await;
        let rating = ratings.entry(laptop_id.to_string()).or_default();
        rating.count += 1;
        rating.sum += score;
        Ok(*rating)
    }
}
