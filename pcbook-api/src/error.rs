use pcbook_core::store::StoreError;
use pcbook_core::{ContextError, TokenError};
use thiserror::Error;
use tonic::{Code, Status};
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    /// A status received from the peer, passed through as is
    #[error("{}", .0.message())]
    Rpc(#[from] Status),
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ApiError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn code(&self) -> Code {
        match self {
            ApiError::InvalidArgument(_) => Code::InvalidArgument,
            ApiError::NotFound(_) => Code::NotFound,
            ApiError::AlreadyExists(_) => Code::AlreadyExists,
            ApiError::Unauthenticated(_) => Code::Unauthenticated,
            ApiError::PermissionDenied(_) => Code::PermissionDenied,
            ApiError::Context(e) | ApiError::Store(StoreError::Context(e)) => context_code(e),
            ApiError::Store(StoreError::AlreadyExists(_)) => Code::AlreadyExists,
            ApiError::Store(StoreError::Io(_)) => Code::Internal,
            ApiError::Token(_) => Code::Internal,
            ApiError::Internal(_) => Code::Internal,
            ApiError::Rpc(status) => status.code(),
        }
    }
}

fn context_code(err: &ContextError) -> Code {
    match err {
        ContextError::Canceled => Code::Cancelled,
        ContextError::DeadlineExceeded => Code::DeadlineExceeded,
    }
}

/// Converting logs the failure once, so handlers can just `?` or `.into()`.
impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        let code = err.code();
        let message = err.to_string();
        if code == Code::Internal {
            error!(?code, "{}", message);
        } else {
            warn!(?code, "{}", message);
        }
        match err {
            ApiError::Rpc(status) => status,
            _ => Status::new(code, message),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_errors_keep_their_codes() {
        let canceled = Status::from(ApiError::from(ContextError::Canceled));
        assert_eq!(canceled.code(), Code::Cancelled);
        assert_eq!(canceled.message(), "request is canceled");

        let late = Status::from(ApiError::from(StoreError::from(ContextError::DeadlineExceeded)));
        assert_eq!(late.code(), Code::DeadlineExceeded);
    }

    #[test]
    fn test_store_errors_map_to_codes() {
        let dup = ApiError::from(StoreError::AlreadyExists("x".into()));
        assert_eq!(dup.code(), Code::AlreadyExists);

        let io = ApiError::from(StoreError::Io(std::io::Error::other("disk")));
        assert_eq!(io.code(), Code::Internal);
    }

    #[test]
    fn test_peer_status_is_returned_unchanged() {
        let status = Status::from(ApiError::from(Status::cancelled("client went away")));
        assert_eq!(status.code(), Code::Cancelled);
        assert_eq!(status.message(), "client went away");
    }

    #[test]
    fn test_messages_pass_through() {
        let status = Status::from(ApiError::not_found("incorrect username/password"));
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "incorrect username/password");
    }
}
