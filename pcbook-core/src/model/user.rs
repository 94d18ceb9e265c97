//! Users and roles

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Role carried by a user and embedded in issued tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UserError::UnknownRole(other.to_string())),
        }
    }
}

/// A registered user. Only the Argon2 PHC hash of the password is kept.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
}

impl User {
    /// Create a user, hashing `password` with a fresh random salt.
    pub fn new(username: impl Into<String>, password: &str, role: Role) -> Result<Self, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| UserError::Hashing(e.to_string()))?
            .to_string();

        Ok(Self {
            username: username.into(),
            hashed_password,
            role,
        })
    }

    pub fn is_correct_password(&self, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hashed_password) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

// Keep the hash out of logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_hashed_and_verifiable() {
        let user = User::new("admin1", "secret", Role::Admin).unwrap();
        assert_ne!(user.hashed_password, "secret");
        assert!(user.is_correct_password("secret"));
        assert!(!user.is_correct_password("Secret"));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = User::new("a", "secret", Role::User).unwrap();
        let b = User::new("b", "secret", Role::User).unwrap();
        assert_ne!(a.hashed_password, b.hashed_password);
    }

    #[test]
    fn test_debug_hides_hash() {
        let user = User::new("user1", "secret", Role::User).unwrap();
        let printed = format!("{:?}", user);
        assert!(!printed.contains(&user.hashed_password));
        assert!(printed.contains("user1"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
