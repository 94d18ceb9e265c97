use std::sync::{Arc, OnceLock};

use pcbook_core::metrics::{record_counter, AUTH_LOGINS};
use pcbook_core::model::{Role, User};
use pcbook_core::store::UserStore;
use pcbook_core::TokenManager;
use tonic::{Request, Response, Status};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::proto::*;

pub struct AuthServiceImpl {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenManager>,
}

impl AuthServiceImpl {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenManager>) -> Self {
        Self { users, tokens }
    }
}

/// Stand-in checked for unknown usernames, so every miss pays for one hash.
fn decoy_user() -> Option<&'static User> {
    static DECOY: OnceLock<Option<User>> = OnceLock::new();
    DECOY
        .get_or_init(|| User::new("", &Uuid::new_v4().to_string(), Role::User).ok())
        .as_ref()
}

#[tonic::async_trait]
impl auth_service_server::AuthService for AuthServiceImpl {
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        let user = self
            .users
            .find(&req.username)
            .await
            .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("cannot find user")))?;

        // Unknown user and wrong password look the same to the caller.
        let user = match user {
            Some(user) if user.is_correct_password(&req.password) => user,
            Some(_) => return Err(ApiError::not_found("incorrect username/password").into()),
            None => {
                if let Some(decoy) = decoy_user() {
                    let _ = decoy.is_correct_password(&req.password);
                }
                return Err(ApiError::not_found("incorrect username/password").into());
            }
        };

        let access_token = self.tokens.generate(&user).map_err(|e| {
            ApiError::Internal(anyhow::Error::new(e).context("cannot generate access token"))
        })?;

        record_counter(AUTH_LOGINS, 1);
        info!(username = %user.username, role = %user.role, "user logged in");

        Ok(Response::new(LoginResponse { access_token }))
    }
}
