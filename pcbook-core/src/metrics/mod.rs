//! Metric names and helpers for the catalog service
//!
//! Emits through the `metrics` facade. Without an installed recorder every
//! call is a no-op.

use metrics::{counter, describe_counter};

pub const LAPTOPS_CREATED: &str = "pcbook.laptops.created";
pub const SEARCH_MATCHES: &str = "pcbook.search.matches";
pub const IMAGES_UPLOADED: &str = "pcbook.images.uploaded";
pub const IMAGE_BYTES: &str = "pcbook.images.bytes";
pub const RATINGS_RECORDED: &str = "pcbook.ratings.recorded";
pub const AUTH_LOGINS: &str = "pcbook.auth.logins";
pub const AUTH_REJECTED: &str = "pcbook.auth.rejected";

/// Register descriptions for every metric above
pub fn init_metrics() {
    describe_counter!(LAPTOPS_CREATED, "Laptops saved through CreateLaptop");
    describe_counter!(SEARCH_MATCHES, "Laptops streamed back by SearchLaptop");
    describe_counter!(IMAGES_UPLOADED, "Images persisted by UploadImage");
    describe_counter!(IMAGE_BYTES, "Bytes persisted by UploadImage");
    describe_counter!(RATINGS_RECORDED, "Scores accepted by RateLaptop");
    describe_counter!(AUTH_LOGINS, "Successful logins");
    describe_counter!(AUTH_REJECTED, "Calls rejected by the authorization layer");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}
