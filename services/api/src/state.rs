//! Application state shared across handlers

use auth::{CredentialStore, JwtService};
use media::{Publisher, UploadStaging};
use std::sync::Arc;

use crate::{catalog::VideoCatalog, config::ServerConfig};

/// Application state shared across handlers
///
/// Everything here is built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub jwt: JwtService,
    pub catalog: VideoCatalog,
    pub staging: UploadStaging,
    pub publisher: Publisher,
    pub config: Arc<ServerConfig>,
}
