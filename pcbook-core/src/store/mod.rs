//! Concurrency-safe stores backing the catalog service
//!
//! Each store owns its map behind a tokio lock and exposes only its
//! operations. Values go in and come out as clones.

mod errors;
mod image_store;
mod laptop_store;
mod rating_store;
mod user_store;

pub use errors::{StoreError, StoreResult};
pub use image_store::{DiskImageStore, ImageInfo, ImageStore};
pub use laptop_store::{FoundFuture, InMemoryLaptopStore, LaptopStore};
pub use rating_store::{InMemoryRatingStore, RatingStore};
pub use user_store::{InMemoryUserStore, UserStore};
