//! Typed calls against a remote LaptopService

use std::time::Duration;

use pcbook_core::model::{Filter, Laptop};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{IntoRequest, IntoStreamingRequest, Request, Status};
use tracing::{debug, info};

use crate::proto::laptop_service_client::LaptopServiceClient;
use crate::proto::*;
use crate::session::AuthChannel;

/// Size of each uploaded chunk
pub const IMAGE_CHUNK_SIZE: usize = 1024;

/// Catalog client whose protected calls go through an [`AuthChannel`]
#[derive(Clone)]
pub struct LaptopClient {
    service: LaptopServiceClient<AuthChannel>,
    timeout: Option<Duration>,
}

impl LaptopClient {
    pub fn new(channel: AuthChannel) -> Self {
        Self {
            service: LaptopServiceClient::new(channel),
            timeout: None,
        }
    }

    /// Send `timeout` as the deadline of every call made through this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn with_deadline<T>(&self, mut request: Request<T>) -> Request<T> {
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }

    /// Create `laptop` and return the id the server stored it under.
    pub async fn create_laptop(&mut self, laptop: Laptop) -> Result<String, Status> {
        let request = CreateLaptopRequest {
            laptop: Some(laptop.into()),
        };
        let request = self.with_deadline(request.into_request());
        let id = self.service.create_laptop(request).await?.into_inner().id;
        info!(%id, "created laptop");
        Ok(id)
    }

    /// Collect every laptop qualifying under `filter`.
    pub async fn search_laptop(&mut self, filter: Filter) -> Result<Vec<Laptop>, Status> {
        let request = SearchLaptopRequest {
            filter: Some(filter.into()),
        };
        let request = self.with_deadline(request.into_request());
        let mut stream = self.service.search_laptop(request).await?.into_inner();

        let mut found = Vec::new();
        while let Some(response) = stream.message().await? {
            if let Some(laptop) = response.laptop {
                debug!(id = %laptop.id, price = laptop.price_usd, "found laptop");
                found.push(laptop.into());
            }
        }
        Ok(found)
    }

    /// Upload `data` as an image of `laptop_id`, in [`IMAGE_CHUNK_SIZE`] pieces.
    pub async fn upload_image(
        &mut self,
        laptop_id: &str,
        image_type: &str,
        data: &[u8],
    ) -> Result<UploadImageResponse, Status> {
        let mut requests = vec![UploadImageRequest::info(laptop_id, image_type)];
        requests.extend(data.chunks(IMAGE_CHUNK_SIZE).map(UploadImageRequest::chunk));

        let request = self.with_deadline(tokio_stream::iter(requests).into_streaming_request());
        let response = self.service.upload_image(request).await?.into_inner();
        info!(id = %response.id, size = response.size, "image uploaded");
        Ok(response)
    }

    /// Rate each laptop in turn, waiting for each acknowledgment before the next score.
    pub async fn rate_laptop(
        &mut self,
        ratings: &[(String, f64)],
    ) -> Result<Vec<RateLaptopResponse>, Status> {
        let (tx, rx) = mpsc::channel(1);
        let request = self.with_deadline(ReceiverStream::new(rx).into_streaming_request());
        let mut responses = self.service.rate_laptop(request).await?.into_inner();

        let mut acknowledged = Vec::with_capacity(ratings.len());
        for (laptop_id, score) in ratings {
            let request = RateLaptopRequest {
                laptop_id: laptop_id.clone(),
                score: *score,
            };
            tx.send(request)
                .await
                .map_err(|_| Status::aborted("cannot send rate request"))?;

            let response = responses
                .message()
                .await?
                .ok_or_else(|| Status::aborted("rating stream ended early"))?;
            debug!(
                laptop_id = %response.laptop_id,
                count = response.rated_count,
                average = response.average_score,
                "received rating"
            );
            acknowledged.push(response);
        }

        drop(tx);
        while responses.message().await?.is_some() {}
        Ok(acknowledged)
    }
}
