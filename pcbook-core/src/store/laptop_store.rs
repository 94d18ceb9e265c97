use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::errors::{StoreError, StoreResult};
use crate::context::CallContext;
use crate::model::{Filter, Laptop};

/// Future returned by a search callback for one match
pub type FoundFuture = BoxFuture<'static, StoreResult<()>>;

/// Storage for catalog records
#[async_trait]
pub trait LaptopStore: Send + Sync {
    /// Insert a copy of `laptop`. Fails with [`StoreError::AlreadyExists`] if the id is taken.
    async fn save(&self, laptop: &Laptop) -> StoreResult<()>;

    /// A copy of the stored laptop, or `None`.
    async fn find(&self, id: &str) -> StoreResult<Option<Laptop>>;

    /// Call `found` with a copy of every laptop qualifying under `filter`.
    ///
    /// Stops with [`StoreError::Context`] as soon as `ctx` is canceled or past its
    /// deadline, and with the callback's error if it fails.
    async fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        found: &mut (dyn FnMut(Laptop) -> FoundFuture + Send),
    ) -> StoreResult<()>;
}

/// Laptops kept in a map behind a reader/writer lock
#[derive(Default)]
pub struct InMemoryLaptopStore {
    data: RwLock<HashMap<String, Laptop>>,
}

impl InMemoryLaptopStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl LaptopStore for InMemoryLaptopStore {
    async fn save(&self, laptop: &Laptop) -> StoreResult<()> {
        let mut data = self.data.write().await;
        if data.contains_key(&laptop.id) {
            return Err(StoreError::AlreadyExists(laptop.id.clone()));
        }
        data.insert(laptop.id.clone(), laptop.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> StoreResult<Option<Laptop>> {
        Ok(self.data.read().await.get(id).cloned())
    }

    async fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        found: &mut (dyn FnMut(Laptop) -> FoundFuture + Send),
    ) -> StoreResult<()> {
        // Copy matches out under the read lock; callbacks run without it.
        let matches = {
            let data = self.data.read().await;
            let mut matches = Vec::new();
            for laptop in data.values() {
                ctx.check()?;
                debug!(id = %laptop.id, "checking laptop");
                if filter.is_qualified(laptop) {
                    matches.push(laptop.clone());
                }
            }
            matches
        };

        for laptop in matches {
            ctx.check()?;
            found(laptop).await?;
        }
        Ok(())
    }
}
