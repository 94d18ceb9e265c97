//! Client-side authorization
//!
//! A [`TokenSession`] logs in once, then keeps re-logging in on a fixed
//! interval and publishes each fresh token through a `watch` cell.
//! [`AuthChannel`] wraps a tonic [`Channel`] and attaches the current token
//! to every outbound call whose method requires authentication.

use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tonic::body::BoxBody;
use tonic::codegen::StdError;
use tonic::transport::Channel;
use tonic::Status;
use tower::Service;
use tracing::{debug, info, warn};

use crate::auth::AUTHORIZATION_KEY;
use crate::proto::auth_service_client::AuthServiceClient;
use crate::proto::{methods, LoginRequest};

/// Method path -> whether the call must carry a token
pub fn auth_methods() -> HashMap<&'static str, bool> {
    HashMap::from([
        (methods::CREATE_LAPTOP, true),
        (methods::UPLOAD_IMAGE, true),
        (methods::RATE_LAPTOP, true),
    ])
}

/// Calls `Login` with a fixed set of credentials
pub struct AuthClient {
    service: AuthServiceClient<Channel>,
    username: String,
    password: SecretString,
}

impl AuthClient {
    pub fn new(channel: Channel, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            service: AuthServiceClient::new(channel),
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Log in and return the access token.
    pub async fn login(&mut self) -> Result<String, Status> {
        let request = LoginRequest {
            username: self.username.clone(),
            password: self.password.expose_secret().clone(),
        };
        let response = self.service.login(request).await?;
        Ok(response.into_inner().access_token)
    }
}

/// Logged-in state shared by every [`AuthChannel`] built from it
pub struct TokenSession {
    token: watch::Receiver<Option<String>>,
    refresher: JoinHandle<()>,
}

impl TokenSession {
    /// Log in now, then refresh every `refresh_interval` in the background.
    ///
    /// The initial login must succeed and `refresh_interval` must be non-zero.
    /// Later refresh failures are logged and the previous token stays in place.
    pub async fn start(mut auth: AuthClient, refresh_interval: Duration) -> Result<Self, Status> {
        if refresh_interval.is_zero() {
            return Err(Status::invalid_argument("refresh interval must be non-zero"));
        }
        let token = auth.login().await?;
        info!(user = auth.username(), "logged in");

        let (tx, rx) = watch::channel(Some(token));
        let refresher = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the login above covers it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match auth.login().await {
                    Ok(token) => {
                        debug!(user = auth.username(), "token refreshed");
                        if tx.send(Some(token)).is_err() {
                            break;
                        }
                    }
                    Err(status) => {
                        warn!(user = auth.username(), %status, "token refresh failed");
                    }
                }
            }
        });

        Ok(Self { token: rx, refresher })
    }

    /// The most recent token
    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Wrap `channel` so protected calls carry this session's token.
    pub fn channel(&self, channel: Channel) -> AuthChannel {
        AuthChannel::new(channel, self.token.clone(), auth_methods())
    }
}

impl Drop for TokenSession {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

/// A [`Channel`] that attaches the cached token to protected methods
#[derive(Clone)]
pub struct AuthChannel {
    inner: Channel,
    token: watch::Receiver<Option<String>>,
    methods: Arc<HashMap<&'static str, bool>>,
}

impl AuthChannel {
    pub fn new(
        inner: Channel,
        token: watch::Receiver<Option<String>>,
        methods: HashMap<&'static str, bool>,
    ) -> Self {
        Self {
            inner,
            token,
            methods: Arc::new(methods),
        }
    }

    fn requires_auth(&self, path: &str) -> bool {
        self.methods.get(path).copied().unwrap_or(false)
    }

    fn attach_token(&self, headers: &mut http::HeaderMap) -> Result<(), Status> {
        let token = self
            .token
            .borrow()
            .clone()
            .ok_or_else(|| Status::unauthenticated("no access token, login has not completed"))?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Status::internal(format!("access token is not a valid header: {e}")))?;
        headers.insert(AUTHORIZATION_KEY, value);
        Ok(())
    }
}

impl Service<http::Request<BoxBody>> for AuthChannel {
    type Response = <Channel as Service<http::Request<BoxBody>>>::Response;
    type Error = StdError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: http::Request<BoxBody>) -> Self::Future {
        let path = req.uri().path().to_string();
        if self.requires_auth(&path) {
            if let Err(status) = self.attach_token(req.headers_mut()) {
                debug!(method = %path, "refusing call without token");
                return Box::pin(async move { Err(Box::new(status) as StdError) });
            }
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await.map_err(Into::into) })
    }
}
