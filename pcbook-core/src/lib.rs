//! PCBook core: the laptop catalog domain, its concurrency-safe stores, the
//! access-token service and the ambient configuration/logging stack.
//!
//! The gRPC surface lives in `pcbook-api`; nothing here knows about the wire.

pub mod config;
pub mod context;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod store;
pub mod test_utils;
pub mod token;

pub use context::{CallContext, ContextError};
pub use logging::{init_logging, LogLevel};
pub use token::{TokenError, TokenManager, UserClaims};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = CallContext::new();
    }
}
