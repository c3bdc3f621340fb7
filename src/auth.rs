use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::storage;

pub const TOKEN_FILE: &str = "token_cache.json";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint returned {0}")]
    UnexpectedStatus(StatusCode),
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to persist the token cache: {0}")]
    Persist(#[from] io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: i64,
}

impl CachedToken {
    /// Strictly before expiry; a token at its expiry instant is already stale.
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: i64,
}

pub struct TokenManager {
    client: Client,
    oauth_url: Url,
    client_id: String,
    client_secret: String,
    cache_path: PathBuf,
}

impl TokenManager {
    pub fn new(
        client: Client,
        oauth_url: Url,
        client_id: String,
        client_secret: String,
        storage_path: &Path,
    ) -> Self {
        Self {
            client,
            oauth_url,
            client_id,
            client_secret,
            cache_path: storage_path.join(TOKEN_FILE),
        }
    }

    /// A usable bearer token: the cached one while it is still valid,
    /// otherwise a freshly acquired (and re-cached) one.
    pub fn bearer_token(&self) -> Result<String, AuthError> {
        if let Some(cached) = storage::load_json::<CachedToken>(&self.cache_path) {
            if cached.is_valid_at(Utc::now().timestamp()) {
                return Ok(cached.access_token);
            }
        }
        self.fetch_fresh()
    }

    fn fetch_fresh(&self) -> Result<String, AuthError> {
        info!("Fetching a fresh OAuth token");
        let response = self
            .client
            .post(self.oauth_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        if !response.status().is_success() {
            return Err(AuthError::UnexpectedStatus(response.status()));
        }

        let grant: TokenGrant = response.json()?;
        let token = CachedToken {
            access_token: grant.access_token,
            expires_at: Utc::now().timestamp() + grant.expires_in,
        };
        storage::write_json_atomic(&self.cache_path, &token)?;
        Ok(token.access_token)
    }

    /// Drops the cached token so the next cycle re-acquires one.
    pub fn invalidate(&self) {
        if let Err(err) = fs::remove_file(&self.cache_path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("Failed to drop the token cache: {err}");
            }
        }
    }
}
