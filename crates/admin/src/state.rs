//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{TokenSigner, UploadStore};

/// Everything a handler may need, behind one `Arc`.
///
/// The signer and upload store are derived from the configuration once at
/// startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    config: AdminConfig,
    pool: PgPool,
    tokens: TokenSigner,
    uploads: UploadStore,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let tokens = TokenSigner::new(&config.tokens);
        let uploads = UploadStore::new(&config.uploads, &config.base_url);
        let inner = Arc::new(Shared {
            config,
            pool,
            tokens,
            uploads,
        });
        Self { inner }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Signs and verifies bearer tokens.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Writes uploaded images and builds their public URLs.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }
}
