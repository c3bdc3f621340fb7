use std::thread;
use std::time::Duration;

use color_eyre::Result;
use log::{error, info, warn};
use reqwest::blocking::Client;

use crate::auth::TokenManager;
use crate::config::Config;
use crate::diff;
use crate::fetcher::{CatalogClient, FetchError};
use crate::notify::Notifier;
use crate::storage::SnapshotStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Tracker {
    tokens: TokenManager,
    catalog: CatalogClient,
    notifier: Notifier,
    store: SnapshotStore,
    check_interval: Duration,
}

impl Tracker {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            tokens: TokenManager::new(
                client.clone(),
                config.oauth_url,
                config.client_id,
                config.client_secret,
                &config.storage_path,
            ),
            catalog: CatalogClient::new(client.clone(), config.catalog_url),
            notifier: Notifier::new(client, config.webhook_url, config.role_id),
            store: SnapshotStore::new(&config.storage_path),
            check_interval: Duration::from_secs(config.check_interval),
        })
    }

    pub fn run(&self) -> ! {
        loop {
            self.run_cycle();
            thread::sleep(self.check_interval);
        }
    }

    /// One fetch-diff-notify-persist pass. Every failure is confined to this
    /// cycle; the only cross-cycle effect is the rate-limit sleep, which
    /// stacks on top of the regular interval.
    pub fn run_cycle(&self) {
        info!("Checking the catalog for pack changes...");

        let token = match self.tokens.bearer_token() {
            Ok(token) => token,
            Err(err) => {
                error!("No valid token available, skipping this check: {err}");
                return;
            }
        };

        let items = match self.catalog.fetch(&token) {
            Ok(items) => items,
            Err(FetchError::RateLimited { retry_after }) => {
                warn!("Rate limited, retrying in {}s", retry_after.as_secs());
                thread::sleep(retry_after);
                return;
            }
            Err(err @ FetchError::Unauthorized(_)) => {
                error!("{err}, dropping the cached token");
                self.tokens.invalidate();
                return;
            }
            Err(FetchError::Empty) => {
                info!("No pack data available");
                return;
            }
            Err(err) => {
                error!("Failed to fetch packs: {err}");
                return;
            }
        };

        let outcome = diff::compute(&items, &self.store.load());
        if outcome.is_empty() {
            info!("No changes detected");
            return;
        }

        for (index, change) in outcome.changes.iter().enumerate() {
            if let Err(err) = self.notifier.send(change, index == 0) {
                error!("Failed to send notification for {}: {err}", change.name);
            }
        }

        match self.store.write(&outcome.snapshot) {
            Ok(()) => info!(
                "{} change(s) detected, updating stored data",
                outcome.changes.len()
            ),
            Err(err) => error!("Failed to persist the new snapshot: {err}"),
        }
    }
}
