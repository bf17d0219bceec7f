//! Delivery channel selection.

use anyhow::bail;
use serde::Deserialize;
use tracing::info;
use warnwatch_core::{
  announce::Announcement,
  source::{Ack, Delivery, DeliveryError},
};
use warnwatch_http::WebhookDelivery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
  /// Write each announcement to the log and acknowledge it.
  #[default]
  Log,
  Webhook,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeliveryConfig {
  pub kind:         DeliveryKind,
  pub webhook_url:  Option<String>,
  /// Timeout applied to every HTTP request, upstream and webhook alike.
  pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
  fn default() -> Self {
    Self { kind: DeliveryKind::Log, webhook_url: None, timeout_secs: 30 }
  }
}

/// Announces to the log. Always acknowledges.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
  async fn deliver(&self, a: &Announcement) -> Result<Ack, DeliveryError> {
    info!(
      id = %a.id,
      author = %a.author_name,
      location = %a.location,
      time = %a.display_time,
      "{}: {}",
      a.title,
      a.description
    );
    Ok(Ack::default())
  }
}

/// The configured channel.
#[derive(Clone)]
pub enum AnyDelivery {
  Log(LogDelivery),
  Webhook(WebhookDelivery),
}

impl AnyDelivery {
  pub fn from_config(config: &DeliveryConfig, client: reqwest::Client) -> anyhow::Result<Self> {
    match (config.kind, config.webhook_url.as_deref()) {
      (DeliveryKind::Log, _) => Ok(Self::Log(LogDelivery)),
      (DeliveryKind::Webhook, Some(url)) if !url.is_empty() => {
        Ok(Self::Webhook(WebhookDelivery::new(client, url)))
      }
      (DeliveryKind::Webhook, _) => bail!("delivery.kind = \"webhook\" needs delivery.webhook_url"),
    }
  }
}

impl Delivery for AnyDelivery {
  async fn deliver(&self, a: &Announcement) -> Result<Ack, DeliveryError> {
    match self {
      Self::Log(d) => d.deliver(a).await,
      Self::Webhook(d) => d.deliver(a).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn webhook_without_url_is_rejected() {
    let config = DeliveryConfig { kind: DeliveryKind::Webhook, ..Default::default() };
    assert!(AnyDelivery::from_config(&config, reqwest::Client::new()).is_err());
  }

  #[test]
  fn webhook_with_url_is_selected() {
    let config = DeliveryConfig {
      kind:        DeliveryKind::Webhook,
      webhook_url: Some("https://chat.example.org/hook".into()),
      ..Default::default()
    };
    assert!(matches!(
      AnyDelivery::from_config(&config, reqwest::Client::new()).unwrap(),
      AnyDelivery::Webhook(_)
    ));
  }

  #[tokio::test]
  async fn log_delivery_acknowledges() {
    let a = Announcement {
      id:           "x".into(),
      title:        "t".into(),
      description:  "d".into(),
      location:     String::new(),
      display_time: warnwatch_core::announce::parse_sent("2023-10-20T09:53:22+02:00").unwrap(),
      logo_url:     String::new(),
      author_name:  "a".into(),
      author_url:   None,
      link:         None,
    };
    assert_eq!(LogDelivery.deliver(&a).await.unwrap(), Ack::default());
  }
}
