//! Authentication primitives for the budgeting backend.
//!
//! Provides the two security-sensitive building blocks the identity service
//! composes:
//! - Password hashing and verification (Argon2id)
//! - Signed, time-bounded JWT issuance and validation
//!
//! Both are deliberately free of persistence and HTTP concerns so the
//! service layer can be tested against them directly.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("wrong_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenIssuer, TokenConfig};
//!
//! let issuer = TokenIssuer::new(TokenConfig {
//!     secret: "a_secret_key_at_least_32_bytes_long!".into(),
//!     issuer: "budgeting-be".into(),
//!     audience: "budgeting-fe".into(),
//!     lifetime_minutes: 60,
//! });
//! let token = issuer.issue("user-id", "user@example.com").unwrap();
//! let claims = issuer.validate(&token).unwrap();
//! assert_eq!(claims.sub, "user-id");
//! ```

pub mod password;
pub mod token;

pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenConfig;
pub use token::TokenError;
pub use token::TokenIssuer;
