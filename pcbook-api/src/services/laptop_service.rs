use std::sync::Arc;

use chrono::Utc;
use pcbook_core::config::DEFAULT_MAX_IMAGE_SIZE;
use pcbook_core::metrics::{
    record_counter, IMAGES_UPLOADED, IMAGE_BYTES, LAPTOPS_CREATED, RATINGS_RECORDED,
    SEARCH_MATCHES,
};
use pcbook_core::model::{Filter, Laptop};
use pcbook_core::store::{FoundFuture, ImageStore, LaptopStore, RatingStore, StoreError};
use pcbook_core::{CallContext, ContextError, UserClaims};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::request_context;
use crate::error::{ApiError, ApiResult};
use crate::proto::upload_image_request::Data;
use crate::proto::*;

/// Buffered search results per call
const SEARCH_BUFFER: usize = 16;

/// Catalog handlers over shared laptop, image and rating stores
pub struct LaptopServiceImpl {
    laptops: Arc<dyn LaptopStore>,
    images: Arc<dyn ImageStore>,
    ratings: Arc<dyn RatingStore>,
    max_image_size: usize,
}

impl LaptopServiceImpl {
    pub fn new(
        laptops: Arc<dyn LaptopStore>,
        images: Arc<dyn ImageStore>,
        ratings: Arc<dyn RatingStore>,
    ) -> Self {
        Self {
            laptops,
            images,
            ratings,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }

    pub fn with_max_image_size(mut self, max_image_size: usize) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    async fn ensure_laptop_exists(&self, laptop_id: &str) -> ApiResult<bool> {
        Ok(self.laptops.find(laptop_id).await?.is_some())
    }
}

fn internal(err: impl std::error::Error + Send + Sync + 'static, what: &'static str) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err).context(what))
}

/// Username the auth layer verified for this call
fn caller<T>(request: &Request<T>) -> String {
    request
        .extensions()
        .get::<UserClaims>()
        .map(|claims| claims.username().to_owned())
        .unwrap_or_default()
}

/// Receive the next client message, giving up once `ctx` expires.
///
/// The context is checked again after the message arrives, so nothing
/// received past the deadline reaches a store.
async fn next_message<T>(ctx: &CallContext, stream: &mut Streaming<T>) -> ApiResult<Option<T>> {
    let message = match ctx.deadline() {
        Some(deadline) => tokio::time::timeout_at(deadline, stream.message())
            .await
            .map_err(|_| ContextError::DeadlineExceeded)?,
        None => stream.message().await,
    }?;
    ctx.check()?;
    Ok(message)
}

/// Cancel `ctx` once the client has stopped reading the response stream.
fn cancel_if_gone<T>(ctx: &CallContext, tx: &mpsc::Sender<T>) {
    if tx.is_closed() {
        ctx.cancel();
    }
}

#[tonic::async_trait]
impl laptop_service_server::LaptopService for LaptopServiceImpl {
    async fn create_laptop(
        &self,
        request: Request<CreateLaptopRequest>,
    ) -> Result<Response<CreateLaptopResponse>, Status> {
        let ctx = request_context(&request);
        let user = caller(&request);
        let mut laptop: Laptop = request
            .into_inner()
            .laptop
            .ok_or_else(|| ApiError::invalid_argument("laptop is missing"))?
            .into();
        info!(id = %laptop.id, %user, "receive a create-laptop request");

        if laptop.id.is_empty() {
            laptop.id = Uuid::new_v4().to_string();
        } else if let Err(e) = Uuid::parse_str(&laptop.id) {
            return Err(ApiError::invalid_argument(format!("laptop ID is not a valid UUID: {e}")).into());
        }
        laptop.updated_at = Utc::now();

        ctx.check().map_err(ApiError::from)?;

        self.laptops.save(&laptop).await.map_err(|e| match e {
            StoreError::AlreadyExists(id) => {
                ApiError::AlreadyExists(format!("laptop {id} already exists"))
            }
            other => internal(other, "cannot save laptop to the store"),
        })?;

        record_counter(LAPTOPS_CREATED, 1);
        info!(id = %laptop.id, "saved laptop");
        Ok(Response::new(CreateLaptopResponse { id: laptop.id }))
    }

    type SearchLaptopStream = ReceiverStream<Result<SearchLaptopResponse, Status>>;

    async fn search_laptop(
        &self,
        request: Request<SearchLaptopRequest>,
    ) -> Result<Response<Self::SearchLaptopStream>, Status> {
        let ctx = request_context(&request);
        let filter: Filter = request.into_inner().filter.map(Into::into).unwrap_or_default();
        info!(?filter, "receive a search-laptop request");

        let (tx, rx) = mpsc::channel(SEARCH_BUFFER);
        let laptops = self.laptops.clone();

        tokio::spawn(async move {
            let sender = tx.clone();
            let send_ctx = ctx.clone();
            let mut found = move |laptop: Laptop| -> FoundFuture {
                let tx = sender.clone();
                let ctx = send_ctx.clone();
                Box::pin(async move {
                    cancel_if_gone(&ctx, &tx);
                    ctx.check()?;

                    let id = laptop.id.clone();
                    let response = SearchLaptopResponse {
                        laptop: Some(laptop.into()),
                    };
                    if tx.send(Ok(response)).await.is_err() {
                        ctx.cancel();
                        return Err(StoreError::Context(ContextError::Canceled));
                    }
                    record_counter(SEARCH_MATCHES, 1);
                    debug!(%id, "sent laptop");
                    Ok(())
                })
            };

            if let Err(e) = laptops.search(&ctx, &filter, &mut found).await {
                let _ = tx.send(Err(ApiError::from(e).into())).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn upload_image(
        &self,
        request: Request<Streaming<UploadImageRequest>>,
    ) -> Result<Response<UploadImageResponse>, Status> {
        let ctx = request_context(&request);
        let user = caller(&request);
        let mut stream = request.into_inner();

        let info = match next_message(&ctx, &mut stream).await? {
            Some(UploadImageRequest {
                data: Some(Data::Info(info)),
            }) => info,
            Some(_) => {
                return Err(ApiError::invalid_argument("first message must carry image info").into())
            }
            None => return Err(ApiError::invalid_argument("no image info received").into()),
        };
        info!(
            laptop_id = %info.laptop_id,
            image_type = %info.image_type,
            %user,
            "receive an upload-image request"
        );

        if !self.ensure_laptop_exists(&info.laptop_id).await? {
            return Err(ApiError::invalid_argument(format!(
                "laptop {} doesn't exist",
                info.laptop_id
            ))
            .into());
        }

        let mut image = Vec::new();
        loop {
            let Some(message) = next_message(&ctx, &mut stream).await? else {
                debug!("no more data");
                break;
            };
            let chunk = match message.data {
                Some(Data::ChunkData(chunk)) => chunk,
                Some(Data::Info(_)) => {
                    return Err(ApiError::invalid_argument("image info may only be sent first").into())
                }
                None => Vec::new(),
            };

            let size = image.len() + chunk.len();
            if size > self.max_image_size {
                return Err(ApiError::invalid_argument(format!(
                    "image is too large: {size} > {}",
                    self.max_image_size
                ))
                .into());
            }
            debug!(chunk = chunk.len(), total = size, "received a chunk");
            image.extend_from_slice(&chunk);
        }

        let size = image.len();
        let id = self
            .images
            .save(&info.laptop_id, &info.image_type, image)
            .await
            .map_err(|e| internal(e, "cannot save image to the store"))?;

        record_counter(IMAGES_UPLOADED, 1);
        record_counter(IMAGE_BYTES, size as u64);
        info!(%id, size, "saved image");

        Ok(Response::new(UploadImageResponse {
            id,
            size: size as u32,
        }))
    }

    type RateLaptopStream = ReceiverStream<Result<RateLaptopResponse, Status>>;

    async fn rate_laptop(
        &self,
        request: Request<Streaming<RateLaptopRequest>>,
    ) -> Result<Response<Self::RateLaptopStream>, Status> {
        let ctx = request_context(&request);
        let user = caller(&request);
        let stream = request.into_inner();
        info!(%user, "receive a rate-laptop request");

        // Capacity one: a request is answered before the next is read.
        let (tx, rx) = mpsc::channel(1);
        let rater = Rater {
            laptops: self.laptops.clone(),
            ratings: self.ratings.clone(),
        };

        tokio::spawn(async move {
            if let Err(e) = rater.run(&ctx, stream, &tx).await {
                let _ = tx.send(Err(e.into())).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// State of one RateLaptop call
struct Rater {
    laptops: Arc<dyn LaptopStore>,
    ratings: Arc<dyn RatingStore>,
}

impl Rater {
    async fn run(
        &self,
        ctx: &CallContext,
        mut stream: Streaming<RateLaptopRequest>,
        tx: &mpsc::Sender<Result<RateLaptopResponse, Status>>,
    ) -> ApiResult<()> {
        loop {
            cancel_if_gone(ctx, tx);
            let Some(request) = next_message(ctx, &mut stream).await? else {
                debug!("no more data");
                return Ok(());
            };
            debug!(laptop_id = %request.laptop_id, score = request.score, "received a rate-laptop request");

            if self.laptops.find(&request.laptop_id).await?.is_none() {
                return Err(ApiError::not_found(format!(
                    "laptop {} is not found",
                    request.laptop_id
                )));
            }

            let rating = self
                .ratings
                .add(&request.laptop_id, request.score)
                .await
                .map_err(|e| internal(e, "cannot add rating to the store"))?;
            record_counter(RATINGS_RECORDED, 1);

            let response = RateLaptopResponse {
                laptop_id: request.laptop_id,
                rated_count: rating.count,
                average_score: rating.average().unwrap_or_default(),
            };
            if tx.send(Ok(response)).await.is_err() {
                debug!("client stopped reading ratings");
                ctx.cancel();
                return Ok(());
            }
        }
    }
}
