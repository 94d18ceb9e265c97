//! Server-side authorization
//!
//! Every call passes through [`AuthLayer`] before routing. Methods listed in
//! the access table need a valid access token whose role is allowed for that
//! method. Methods not in the table are open. The layer also attaches the
//! call's [`CallContext`] and, for protected methods, the caller's claims to
//! the request extensions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use pcbook_core::metrics::{record_counter, AUTH_REJECTED};
use pcbook_core::model::Role;
use pcbook_core::{CallContext, TokenManager, UserClaims};
use tonic::body::BoxBody;
use tonic::metadata::MetadataMap;
use tonic::Status;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::context::call_context;
use crate::proto::methods;

/// Metadata key holding the access token
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Method path -> roles allowed to call it
pub type AccessTable = HashMap<&'static str, HashSet<Role>>;

/// Roles allowed on the protected LaptopService methods
pub fn accessible_roles() -> AccessTable {
    HashMap::from([
        (methods::CREATE_LAPTOP, HashSet::from([Role::Admin])),
        (methods::UPLOAD_IMAGE, HashSet::from([Role::Admin])),
        (methods::RATE_LAPTOP, HashSet::from([Role::Admin, Role::User])),
    ])
}

/// Strip an optional `Bearer ` scheme from an authorization value
fn token_from_value(value: &str) -> &str {
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

/// Checks tokens against the access table
#[derive(Clone)]
pub struct AuthInterceptor {
    tokens: Arc<TokenManager>,
    access: Arc<AccessTable>,
}

impl AuthInterceptor {
    pub fn new(tokens: Arc<TokenManager>, access: AccessTable) -> Self {
        Self {
            tokens,
            access: Arc::new(access),
        }
    }

    /// Decide whether a call to `method` carrying `metadata` may proceed.
    ///
    /// Returns the verified claims for protected methods and `None` for open ones.
    pub fn authorize(
        &self,
        method: &str,
        metadata: &MetadataMap,
    ) -> Result<Option<UserClaims>, Status> {
        let Some(allowed) = self.access.get(method) else {
            return Ok(None);
        };

        let token = metadata
            .get(AUTHORIZATION_KEY)
            .and_then(|v| v.to_str().ok())
            .map(token_from_value)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Status::unauthenticated("authorization token is not provided"))?;

        let claims = self
            .tokens
            .verify(token)
            .map_err(|e| Status::unauthenticated(format!("access token is invalid: {e}")))?;

        if !allowed.contains(&claims.role) {
            return Err(Status::permission_denied(
                "no permission to access this RPC",
            ));
        }

        debug!(method, user = claims.username(), role = %claims.role, "authorized call");
        Ok(Some(claims))
    }
}

/// Tower layer installing [`AuthMiddleware`] in front of the router
#[derive(Clone)]
pub struct AuthLayer {
    interceptor: AuthInterceptor,
}

impl AuthLayer {
    pub fn new(interceptor: AuthInterceptor) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    interceptor: AuthInterceptor,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        // Take the readied service, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        // Start the deadline clock as early as the call reaches user code.
        let metadata = MetadataMap::from_headers(req.headers().clone());
        req.extensions_mut().insert::<CallContext>(call_context(&metadata));

        let method = req.uri().path().to_owned();
        let decision = self.interceptor.authorize(&method, &metadata);

        Box::pin(async move {
            match decision {
                Ok(claims) => {
                    if let Some(claims) = claims {
                        req.extensions_mut().insert(claims);
                    }
                    inner.call(req).await
                }
                Err(status) => {
                    warn!(%method, code = ?status.code(), message = status.message(), "rejected call");
                    record_counter(AUTH_REJECTED, 1);
                    Ok(status.into_http())
                }
            }
        })
    }
}
