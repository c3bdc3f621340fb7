use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::fetcher::{CatalogItem, TALL_IMAGE, UNKNOWN_CURRENCY, WIDE_IMAGE};

pub type Snapshot = BTreeMap<String, Record>;

const TS_WITH_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const TS_WHOLE_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The stored, comparable view of a pack. Field names match the snapshot
/// file format on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub activation_date: String,
    pub expiration_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: String,
    pub price: String,
    pub description: String,
    pub wide_image_url: String,
    pub tall_image_url: String,
    pub activation_date: String,
    pub expiration_date: String,
}

#[derive(Debug)]
pub struct DiffOutcome {
    pub changes: Vec<Change>,
    pub snapshot: Snapshot,
}

impl DiffOutcome {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

pub fn compute(items: &[CatalogItem], prior: &Snapshot) -> DiffOutcome {
    let mut snapshot = Snapshot::new();
    let mut changes = Vec::new();

    for item in items {
        let record = Record {
            price: format_price(item.current_price, &item.currency_code),
            description: item.description.clone(),
            image_url: item.image_url(WIDE_IMAGE).to_string(),
            activation_date: convert_timestamp(&item.effective_date),
            expiration_date: convert_timestamp(&item.expiry_date),
        };

        if prior.get(&item.title) != Some(&record) {
            changes.push(Change {
                name: item.title.clone(),
                price: record.price.clone(),
                description: record.description.clone(),
                wide_image_url: record.image_url.clone(),
                // the tall image only feeds the notification, it is not stored
                tall_image_url: item.image_url(TALL_IMAGE).to_string(),
                activation_date: record.activation_date.clone(),
                expiration_date: record.expiration_date.clone(),
            });
        }

        snapshot.insert(item.title.clone(), record);
    }

    DiffOutcome { changes, snapshot }
}

pub fn format_price(minor_units: i64, currency: &str) -> String {
    if currency == UNKNOWN_CURRENCY {
        "Unknown Price".to_string()
    } else {
        format!("${:.2} {currency}", minor_units as f64 / 100.0)
    }
}

/// Renders an API timestamp as a `<t:EPOCH:F>` display token, or "N/A" for
/// anything that does not parse. Never fails.
pub fn convert_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return "N/A".to_string();
    }
    NaiveDateTime::parse_from_str(raw, TS_WITH_FRACTION)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TS_WHOLE_SECONDS))
        .map(|dt| format!("<t:{}:F>", dt.and_utc().timestamp()))
        .unwrap_or_else(|_| "N/A".to_string())
}
