use log::info;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::diff::Change;

const EMBED_TITLE: &str = "New Pack Update";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook returned {0}")]
    UnexpectedStatus(StatusCode),
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: &'static str,
    fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedImage>,
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

fn field(name: &'static str, value: String) -> EmbedField {
    EmbedField {
        name,
        value,
        inline: false,
    }
}

fn attachable(url: &str) -> Option<EmbedImage> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(EmbedImage {
            url: url.to_string(),
        })
    } else {
        None
    }
}

fn build_payload(change: &Change, content: Option<String>) -> WebhookPayload {
    WebhookPayload {
        embeds: vec![Embed {
            title: EMBED_TITLE,
            fields: vec![
                field("Name", change.name.clone()),
                field("Price", format!("```{}```", change.price)),
                field("Description", format!("```{}```", change.description)),
                field("Activation Date", format!("**{}**", change.activation_date)),
                field("Expiration Date", format!("**{}**", change.expiration_date)),
            ],
            image: attachable(&change.wide_image_url),
            thumbnail: attachable(&change.tall_image_url),
        }],
        content,
    }
}

pub struct Notifier {
    client: Client,
    webhook_url: Url,
    role_id: String,
}

impl Notifier {
    pub fn new(client: Client, webhook_url: Url, role_id: String) -> Self {
        Self {
            client,
            webhook_url,
            role_id,
        }
    }

    /// Sends one notification. The first change of a cycle carries the role
    /// mention; every other one goes out bare.
    pub fn send(&self, change: &Change, first_in_cycle: bool) -> Result<(), NotifyError> {
        info!("Sending notification for: {}", change.name);

        let mention = first_in_cycle.then(|| format!("<@&{}>", self.role_id));
        let payload = build_payload(change, mention);

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()?;

        if response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(NotifyError::UnexpectedStatus(response.status()))
        }
    }
}
