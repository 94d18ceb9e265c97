use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unexpected token signing method: {0}")]
    UnexpectedAlgorithm(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("cannot sign token: {0}")]
    Signing(String),
}
