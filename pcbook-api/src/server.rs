//! Server wiring: stores, seed users, services and the authorization layer

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use pcbook_core::config::{Config, SeedUser};
use pcbook_core::model::{Role, User};
use pcbook_core::store::{
    DiskImageStore, InMemoryLaptopStore, InMemoryRatingStore, InMemoryUserStore, UserStore,
};
use pcbook_core::TokenManager;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Router;
use tonic::transport::Server;
use tower::layer::util::{Identity, Stack};
use tracing::{info, warn};

use crate::auth::{accessible_roles, AuthInterceptor, AuthLayer};
use crate::proto::auth_service_server::AuthServiceServer;
use crate::proto::laptop_service_server::LaptopServiceServer;
use crate::services::{AuthServiceImpl, LaptopServiceImpl};

pub type AuthRouter = Router<Stack<AuthLayer, Identity>>;

/// Everything a running server shares between calls
pub struct PcbookServer {
    laptops: Arc<InMemoryLaptopStore>,
    images: Arc<DiskImageStore>,
    ratings: Arc<InMemoryRatingStore>,
    users: Arc<InMemoryUserStore>,
    tokens: Arc<TokenManager>,
    max_image_size: usize,
    shutdown_timeout: Duration,
}

impl PcbookServer {
    /// Build stores from `config` and register its seed users.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let server = Self {
            laptops: Arc::new(InMemoryLaptopStore::new()),
            images: Arc::new(DiskImageStore::new(&config.storage.image_dir)),
            ratings: Arc::new(InMemoryRatingStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            tokens: Arc::new(TokenManager::new(
                &config.auth.secret(),
                config.auth.token_duration,
            )),
            max_image_size: config.storage.max_image_size,
            shutdown_timeout: config.server.shutdown_timeout,
        };
        seed_users(server.users.as_ref(), &config.auth.seed_users).await?;
        Ok(server)
    }

    pub fn laptop_store(&self) -> Arc<InMemoryLaptopStore> {
        self.laptops.clone()
    }

    pub fn image_store(&self) -> Arc<DiskImageStore> {
        self.images.clone()
    }

    pub fn token_manager(&self) -> Arc<TokenManager> {
        self.tokens.clone()
    }

    /// Both services behind the authorization layer
    pub fn router(&self) -> AuthRouter {
        let interceptor = AuthInterceptor::new(self.tokens.clone(), accessible_roles());
        let laptop_service =
            LaptopServiceImpl::new(self.laptops.clone(), self.images.clone(), self.ratings.clone())
                .with_max_image_size(self.max_image_size);
        let auth_service = AuthServiceImpl::new(self.users.clone(), self.tokens.clone());

        Server::builder()
            .layer(AuthLayer::new(interceptor))
            .add_service(AuthServiceServer::new(auth_service))
            .add_service(LaptopServiceServer::new(laptop_service))
    }

    /// Serve on `addr` until `shutdown` resolves, then give in-flight calls
    /// up to the configured shutdown timeout.
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send,
    ) -> anyhow::Result<()> {
        info!(%addr, "starting server");
        let grace = self.shutdown_timeout;
        let (signaled, signal) = notify_on(shutdown);
        drain(self.router().serve_with_shutdown(addr, signal), signaled, grace).await
    }

    /// Serve connections from an already bound listener until `shutdown` resolves.
    pub async fn serve_with_listener(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl Future<Output = ()> + Send,
    ) -> anyhow::Result<()> {
        info!(addr = ?listener.local_addr().ok(), "starting server");
        let grace = self.shutdown_timeout;
        let (signaled, signal) = notify_on(shutdown);
        let server = self
            .router()
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal);
        drain(server, signaled, grace).await
    }
}

/// Wrap `shutdown` so the returned receiver fires once it resolves.
fn notify_on(
    shutdown: impl Future<Output = ()> + Send,
) -> (oneshot::Receiver<()>, impl Future<Output = ()> + Send) {
    let (tx, rx) = oneshot::channel();
    let signal = async move {
        shutdown.await;
        let _ = tx.send(());
    };
    (rx, signal)
}

/// Run `server` to completion, but stop waiting `grace` after `signaled` fires.
async fn drain<E>(
    server: impl Future<Output = Result<(), E>>,
    signaled: oneshot::Receiver<()>,
    grace: Duration,
) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::pin!(server);
    tokio::select! {
        result = &mut server => return result.context("server failed"),
        _ = signaled => info!(?grace, "draining in-flight calls"),
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.context("server failed"),
        Err(_) => {
            warn!(?grace, "calls still running after the shutdown timeout, stopping anyway");
            Ok(())
        }
    }
}

/// Register each seed user. Roles must be known and usernames unique.
pub async fn seed_users(store: &dyn UserStore, seeds: &[SeedUser]) -> anyhow::Result<()> {
    for seed in seeds {
        let role: Role = seed
            .role
            .parse()
            .with_context(|| format!("seed user {}", seed.username))?;
        let user = User::new(&seed.username, &seed.password, role)
            .with_context(|| format!("cannot create user {}", seed.username))?;
        store
            .save(&user)
            .await
            .with_context(|| format!("cannot save user {}", seed.username))?;
        info!(username = %seed.username, %role, "seeded user");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_drain_stops_waiting_after_grace() {
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        let started = tokio::time::Instant::now();

        let stuck = std::future::pending::<Result<(), std::io::Error>>();
        drain(stuck, rx, Duration::from_secs(3)).await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_returns_server_result() {
        let (_tx, rx) = oneshot::channel();
        let failed = async { Err::<(), _>(std::io::Error::other("bind")) };
        assert!(drain(failed, rx, Duration::from_secs(3)).await.is_err());

        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        let finished = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<(), std::io::Error>(())
        };
        drain(finished, rx, Duration::from_secs(3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_users_from_default_config() {
        let store = InMemoryUserStore::new();
        seed_users(&store, &Config::default().auth.seed_users).await.unwrap();

        let admin = store.find("admin1").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_correct_password("secret"));
        assert_eq!(store.find("user1").await.unwrap().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_seed_users_rejects_unknown_role() {
        let store = InMemoryUserStore::new();
        let seeds = vec![SeedUser {
            username: "root".to_string(),
            password: "secret".to_string(),
            role: "superuser".to_string(),
        }];
        assert!(seed_users(&store, &seeds).await.is_err());
    }

    #[tokio::test]
    async fn test_seed_users_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        let seed = SeedUser {
            username: "admin1".to_string(),
            password: "secret".to_string(),
            role: "admin".to_string(),
        };
        assert!(seed_users(&store, &[seed.clone(), seed]).await.is_err());
    }
}
