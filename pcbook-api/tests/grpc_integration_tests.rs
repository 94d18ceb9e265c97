//! End-to-end tests for the PCBook gRPC server
//!
//! Each test starts a real server on an ephemeral port with its own image
//! folder and talks to it through the generated clients, with and without
//! the client authorization channel.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pcbook_api::proto::auth_service_client::AuthServiceClient;
use pcbook_api::proto::laptop_service_client::LaptopServiceClient;
use pcbook_api::proto::{
    CreateLaptopRequest, LoginRequest, RateLaptopRequest, UploadImageRequest,
};
use pcbook_api::{auth_methods, AuthChannel, AuthClient, LaptopClient, PcbookServer, TokenSession};
use pcbook_core::config::Config;
use pcbook_core::model::{Filter, Laptop, Memory, MemoryUnit, Role, User};
use pcbook_core::store::{DiskImageStore, InMemoryLaptopStore, LaptopStore};
use pcbook_core::test_utils::sample_laptop;
use pcbook_core::TokenManager;
use secrecy::SecretString;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, IntoStreamingRequest};
use uuid::Uuid;

/// Deadline sent by calls that are made to outlive it
const SHORT_DEADLINE: Duration = Duration::from_millis(300);

/// A running server plus handles on its stores
struct TestServer {
    addr: SocketAddr,
    laptops: Arc<InMemoryLaptopStore>,
    images: Arc<DiskImageStore>,
    shutdown: Option<oneshot::Sender<()>>,
    #[allow(dead_code)]
    image_dir: TempDir,
}

impl TestServer {
    async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    async fn start_with(mut config: Config) -> Result<Self> {
        let image_dir = TempDir::new()?;
        config.storage.image_dir = image_dir.path().to_path_buf();

        let server = PcbookServer::from_config(&config).await?;
        let laptops = server.laptop_store();
        let images = server.image_store();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = server
                .serve_with_listener(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        Ok(Self {
            addr,
            laptops,
            images,
            shutdown: Some(tx),
            image_dir,
        })
    }

    async fn channel(&self) -> Result<Channel> {
        Ok(Endpoint::from_shared(format!("http://{}", self.addr))?
            .connect()
            .await?)
    }

    async fn session(&self, username: &str) -> Result<TokenSession> {
        let auth = AuthClient::new(
            self.channel().await?,
            username,
            SecretString::new("secret".to_string()),
        );
        Ok(TokenSession::start(auth, Duration::from_secs(30)).await?)
    }

    /// A catalog client logged in as `username`, plus the session keeping it alive
    async fn client(&self, username: &str) -> Result<(LaptopClient, TokenSession)> {
        let session = self.session(username).await?;
        let client = LaptopClient::new(session.channel(self.channel().await?));
        Ok((client, session))
    }

    /// The generated client behind an authorization channel, for hand-driven streams
    async fn raw_client(
        &self,
        username: &str,
    ) -> Result<(LaptopServiceClient<AuthChannel>, TokenSession)> {
        let session = self.session(username).await?;
        let client = LaptopServiceClient::new(session.channel(self.channel().await?));
        Ok((client, session))
    }

    async fn image_count(&self) -> Result<usize> {
        let mut files = tokio::fs::read_dir(self.images.folder()).await?;
        let mut count = 0;
        while files.next_entry().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn assert_same_laptop(stored: &Laptop, sent: &Laptop) {
    let mut expected = sent.clone();
    expected.updated_at = stored.updated_at;
    assert_eq!(stored, &expected);
}

#[tokio::test]
async fn test_create_laptop_as_admin() -> Result<()> {
    let server = TestServer::start().await?;
    let (mut client, _session) = server.client("admin1").await?;

    let laptop = sample_laptop();
    let id = client.create_laptop(laptop.clone()).await?;
    assert_eq!(id, laptop.id);

    let stored = server.laptops.find(&id).await?.expect("laptop was saved");
    assert_same_laptop(&stored, &laptop);

    let mut no_id = sample_laptop();
    no_id.id.clear();
    let generated = client.create_laptop(no_id).await?;
    assert!(Uuid::parse_str(&generated).is_ok());
    assert!(server.laptops.find(&generated).await?.is_some());

    let err = client.create_laptop(laptop).await.unwrap_err();
    assert_eq!(err.code(), Code::AlreadyExists);
    Ok(())
}

#[tokio::test]
async fn test_create_laptop_invalid_id() -> Result<()> {
    let server = TestServer::start().await?;
    let (mut client, _session) = server.client("admin1").await?;

    let mut laptop = sample_laptop();
    laptop.id = "invalid-uuid".to_string();
    let err = client.create_laptop(laptop).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert!(server.laptops.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_protected_call_without_token_is_unauthenticated() -> Result<()> {
    let server = TestServer::start().await?;
    let mut raw = LaptopServiceClient::new(server.channel().await?);

    let err = raw
        .create_laptop(CreateLaptopRequest {
            laptop: Some(sample_laptop().into()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);

    let mut request = tonic::Request::new(CreateLaptopRequest {
        laptop: Some(sample_laptop().into()),
    });
    request
        .metadata_mut()
        .insert("authorization", "Bearer forged.token.value".parse()?);
    let err = raw.create_laptop(request).await.unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);

    assert!(server.laptops.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_streaming_call_without_token_is_unauthenticated() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;

    let mut raw = LaptopServiceClient::new(server.channel().await?);
    let result = raw
        .rate_laptop(tokio_stream::iter(vec![RateLaptopRequest {
            laptop_id: laptop.id.clone(),
            score: 5.0,
        }]))
        .await;

    let code = match result {
        Err(status) => status.code(),
        Ok(response) => response
            .into_inner()
            .message()
            .await
            .expect_err("stream must fail")
            .code(),
    };
    assert_eq!(code, Code::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_unauthenticated() -> Result<()> {
    let server = TestServer::start().await?;
    let config = Config::default();
    let expired = TokenManager::new(&config.auth.secret(), Duration::ZERO)
        .generate(&User::new("admin1", "secret", Role::Admin)?)?;

    let mut raw = LaptopServiceClient::new(server.channel().await?);
    let mut request = tonic::Request::new(CreateLaptopRequest {
        laptop: Some(sample_laptop().into()),
    });
    request
        .metadata_mut()
        .insert("authorization", format!("Bearer {expired}").parse()?);
    let err = raw.create_laptop(request).await.unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);

    assert!(server.laptops.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_user_role_cannot_create_but_can_rate() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;

    let (mut client, _session) = server.client("user1").await?;
    let err = client.create_laptop(sample_laptop()).await.unwrap_err();
    assert_eq!(err.code(), Code::PermissionDenied);

    let err = client
        .upload_image(&laptop.id, ".jpg", &[1, 2, 3])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::PermissionDenied);

    let acks = client.rate_laptop(&[(laptop.id.clone(), 9.0)]).await?;
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0].rated_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_auth_channel_without_token_fails_locally() -> Result<()> {
    let server = TestServer::start().await?;
    let (_tx, rx) = watch::channel(None);
    let mut client = LaptopClient::new(AuthChannel::new(server.channel().await?, rx, auth_methods()));

    let err = client.create_laptop(sample_laptop()).await.unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);

    // Public methods still go through.
    assert!(client.search_laptop(Filter::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_login() -> Result<()> {
    let server = TestServer::start().await?;
    let mut raw = AuthServiceClient::new(server.channel().await?);

    let token = raw
        .login(LoginRequest {
            username: "admin1".to_string(),
            password: "secret".to_string(),
        })
        .await?
        .into_inner()
        .access_token;
    assert_eq!(token.split('.').count(), 3);

    for (username, password) in [("admin1", "wrong"), ("ghost", "secret")] {
        let err = raw
            .login(LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    let bad = AuthClient::new(
        server.channel().await?,
        "admin1",
        SecretString::new("nope".to_string()),
    );
    let err = TokenSession::start(bad, Duration::from_secs(30)).await.err().expect("login must fail");
    assert_eq!(err.code(), Code::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_search_laptop() -> Result<()> {
    let server = TestServer::start().await?;

    let filter = Filter {
        max_price_usd: 2000.0,
        min_cpu_cores: 4,
        min_cpu_ghz: 2.2,
        min_ram: Memory::gigabytes(8),
    };

    let qualified = |laptop: &mut Laptop| {
        laptop.price_usd = 1999.0;
        laptop.cpu.number_cores = 4;
        laptop.cpu.min_ghz = 2.5;
        laptop.cpu.max_ghz = 4.5;
        laptop.ram = Memory::gigabytes(16);
    };

    let mut expected = HashSet::new();
    for i in 0..6 {
        let mut laptop = sample_laptop();
        qualified(&mut laptop);
        match i {
            0 => laptop.price_usd = 2500.0,
            1 => laptop.cpu.number_cores = 2,
            2 => laptop.cpu.min_ghz = 2.0,
            3 => laptop.ram = Memory::new(4096, MemoryUnit::Megabyte),
            4 => {
                expected.insert(laptop.id.clone());
            }
            _ => {
                laptop.ram = Memory::gigabytes(64);
                expected.insert(laptop.id.clone());
            }
        }
        server.laptops.save(&laptop).await?;
    }

    // Search is public: no session needed.
    let (_tx, rx) = watch::channel(None);
    let mut client = LaptopClient::new(AuthChannel::new(server.channel().await?, rx, auth_methods()));
    let found = client.search_laptop(filter.clone()).await?;

    let ids: HashSet<_> = found.iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, expected);
    assert!(found.iter().all(|l| filter.is_qualified(l)));
    Ok(())
}

#[tokio::test]
async fn test_upload_image() -> Result<()> {
    let server = TestServer::start().await?;
    let (mut client, _session) = server.client("admin1").await?;
    let laptop_id = client.create_laptop(sample_laptop()).await?;

    let data: Vec<u8> = (0..4000u32).map(|i| (i % 251) as u8).collect();
    let response = client.upload_image(&laptop_id, ".jpg", &data).await?;
    assert!(!response.id.is_empty());
    assert_eq!(response.size, 4000);

    let saved = server.images.folder().join(format!("{}.jpg", response.id));
    assert_eq!(tokio::fs::read(&saved).await?, data);

    let info = server.images.info(&response.id).await.expect("image recorded");
    assert_eq!(info.laptop_id, laptop_id);
    assert_eq!(info.image_type, ".jpg");
    Ok(())
}

#[tokio::test]
async fn test_upload_image_rejections() -> Result<()> {
    let server = TestServer::start().await?;
    let (mut client, _session) = server.client("admin1").await?;
    let laptop_id = client.create_laptop(sample_laptop()).await?;

    let too_big = vec![0u8; (1 << 20) + 1];
    let err = client.upload_image(&laptop_id, ".png", &too_big).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let exactly_max = vec![7u8; 1 << 20];
    let ok = client.upload_image(&laptop_id, ".png", &exactly_max).await?;
    assert_eq!(ok.size, 1 << 20);

    let err = client
        .upload_image("00000000-0000-0000-0000-000000000000", ".png", &[1, 2, 3])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    assert_eq!(server.image_count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_upload_image_message_order() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;
    let (mut raw, _session) = server.raw_client("admin1").await?;

    let chunk_first = vec![
        UploadImageRequest::chunk(vec![1, 2, 3]),
        UploadImageRequest::info(&laptop.id, ".jpg"),
    ];
    let err = raw
        .upload_image(tokio_stream::iter(chunk_first))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let info_twice = vec![
        UploadImageRequest::info(&laptop.id, ".jpg"),
        UploadImageRequest::chunk(vec![1, 2, 3]),
        UploadImageRequest::info(&laptop.id, ".png"),
    ];
    let err = raw
        .upload_image(tokio_stream::iter(info_twice))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    assert_eq!(server.image_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_upload_image_stalled_past_deadline() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;
    let (mut raw, _session) = server.raw_client("admin1").await?;

    let (tx, rx) = mpsc::channel(4);
    tx.send(UploadImageRequest::info(&laptop.id, ".jpg")).await?;
    let mut request = ReceiverStream::new(rx).into_streaming_request();
    request.set_timeout(SHORT_DEADLINE);
    let call = tokio::spawn(async move { raw.upload_image(request).await });

    tokio::time::sleep(SHORT_DEADLINE * 2).await;
    let _ = tx.send(UploadImageRequest::chunk(vec![1, 2, 3])).await;
    drop(tx);

    let err = call.await?.unwrap_err();
    assert_eq!(err.code(), Code::DeadlineExceeded);
    assert_eq!(server.image_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_upload_image_abandoned_midway_saves_nothing() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;
    let (mut raw, _session) = server.raw_client("admin1").await?;

    let (tx, rx) = mpsc::channel(4);
    tx.send(UploadImageRequest::info(&laptop.id, ".jpg")).await?;
    tx.send(UploadImageRequest::chunk(vec![9; 512])).await?;
    let call = tokio::spawn(async move { raw.upload_image(ReceiverStream::new(rx)).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    call.abort();
    let _ = call.await;
    drop(tx);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.image_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_rating_after_deadline_is_not_counted() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;
    let (mut raw, _session) = server.raw_client("admin1").await?;

    let rating = |score| RateLaptopRequest {
        laptop_id: laptop.id.clone(),
        score,
    };

    let (tx, rx) = mpsc::channel(4);
    tx.send(rating(5.0)).await?;
    let mut request = ReceiverStream::new(rx).into_streaming_request();
    request.set_timeout(SHORT_DEADLINE);
    let mut responses = raw.rate_laptop(request).await?.into_inner();

    let ack = responses.message().await?.expect("first rating acknowledged");
    assert_eq!(ack.rated_count, 1);

    tokio::time::sleep(SHORT_DEADLINE * 2).await;
    let _ = tx.send(rating(9.0)).await;
    let err = responses.message().await.unwrap_err();
    assert_eq!(err.code(), Code::DeadlineExceeded);
    drop(tx);

    // Only the first score made it into the aggregate.
    let (mut client, _session) = server.client("admin1").await?;
    let acks = client.rate_laptop(&[(laptop.id.clone(), 7.0)]).await?;
    assert_eq!(acks[0].rated_count, 2);
    assert_eq!(acks[0].average_score, 6.0);
    Ok(())
}

#[tokio::test]
async fn test_calls_with_client_deadline_succeed_in_time() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;

    let (client, _session) = server.client("admin1").await?;
    let mut client = client.with_timeout(Duration::from_secs(5));

    let id = client.create_laptop(sample_laptop()).await?;
    let data = vec![3u8; 3000];
    assert_eq!(client.upload_image(&id, ".png", &data).await?.size, 3000);
    let acks = client.rate_laptop(&[(laptop.id.clone(), 4.0)]).await?;
    assert_eq!(acks[0].rated_count, 1);
    let everything = Filter {
        max_price_usd: f64::MAX,
        ..Default::default()
    };
    assert_eq!(client.search_laptop(everything).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rate_laptop() -> Result<()> {
    let server = TestServer::start().await?;
    let laptop = sample_laptop();
    server.laptops.save(&laptop).await?;

    let (mut client, _session) = server.client("admin1").await?;
    let scores = [8.0, 7.5, 10.0];
    let ratings: Vec<_> = scores.iter().map(|s| (laptop.id.clone(), *s)).collect();
    let acks = client.rate_laptop(&ratings).await?;

    let counts: Vec<_> = acks.iter().map(|a| a.rated_count).collect();
    let averages: Vec<_> = acks.iter().map(|a| a.average_score).collect();
    assert_eq!(counts, vec![1, 2, 3]);
    assert_eq!(averages, vec![8.0, 7.75, 8.5]);
    assert!(acks.iter().all(|a| a.laptop_id == laptop.id));

    let err = client
        .rate_laptop(&[(uuid_placeholder(), 5.0)])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    Ok(())
}

fn uuid_placeholder() -> String {
    "11111111-1111-1111-1111-111111111111".to_string()
}

#[tokio::test]
async fn test_token_session_refreshes() -> Result<()> {
    let server = TestServer::start().await?;
    let auth = AuthClient::new(
        server.channel().await?,
        "admin1",
        SecretString::new("secret".to_string()),
    );
    let session = TokenSession::start(auth, Duration::from_millis(200)).await?;
    let first = session.token().expect("token after login");

    // Tokens carry second-resolution timestamps, so a new one differs after a second.
    let refreshed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            match session.token() {
                Some(token) if token != first => return token,
                _ => continue,
            }
        }
    })
    .await?;

    let mut client = LaptopClient::new(session.channel(server.channel().await?));
    assert!(client.create_laptop(sample_laptop()).await.is_ok());
    assert_ne!(refreshed, first);
    Ok(())
}
