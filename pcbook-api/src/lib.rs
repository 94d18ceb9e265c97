//! PCBook gRPC surface
//!
//! Wire messages and generated service code ([`proto`]), the catalog and
//! login handlers ([`services`]), server-side authorization ([`auth`]),
//! client-side token handling ([`session`]) and server wiring ([`server`]).

pub mod auth;
pub mod client;
pub mod context;
pub mod error;
pub mod proto;
pub mod server;
pub mod services;
pub mod session;

pub use auth::{accessible_roles, AuthInterceptor, AuthLayer};
pub use client::LaptopClient;
pub use error::{ApiError, ApiResult};
pub use server::PcbookServer;
pub use session::{auth_methods, AuthChannel, AuthClient, TokenSession};
