use std::path::PathBuf;

use color_eyre::eyre::Context;
use color_eyre::Result;
use serde::Deserialize;
use url::Url;

const DEFAULT_OAUTH_URL: &str =
    "https://account-public-service-prod03.ol.epicgames.com/account/api/oauth/token";
const DEFAULT_CATALOG_URL: &str =
    "https://catalog-public-service-prod06.ol.epicgames.com/catalog/api/shared/namespace/fn/offers?lang=en&country=US&count=25";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub webhook_url: Url,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    #[serde(default = "default_role_id")]
    pub role_id: String,
    #[serde(default = "default_oauth_url")]
    pub oauth_url: Url,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: Url,
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Self>().wrap_err("failed to load config")
    }
}

fn default_check_interval() -> u64 {
    60
}

fn default_role_id() -> String {
    "YOUR_ROLE_ID".into()
}

fn default_oauth_url() -> Url {
    Url::parse(DEFAULT_OAUTH_URL).expect("default oauth url is valid")
}

fn default_catalog_url() -> Url {
    Url::parse(DEFAULT_CATALOG_URL).expect("default catalog url is valid")
}

fn default_storage_path() -> PathBuf {
    ".".into()
}
