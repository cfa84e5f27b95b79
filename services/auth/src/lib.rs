//! Authentication library
//!
//! Credential storage, session token issuance and the request guard used by
//! the API service.

pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod validation;

pub use credentials::CredentialStore;
pub use error::{AuthError, CredentialError, CredentialResult};
pub use jwt::{Identity, JwtConfig, JwtService};
pub use middleware::{TOKEN_COOKIE, extract_token, optional_auth, require_auth};
