//! Delivery to a chat webhook that accepts embed messages.
//!
//! Posts one embed per announcement with `?wait=true`, so the channel answers
//! with the created message and a 2xx only once the message exists.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use warnwatch_core::{
  announce::Announcement,
  source::{Ack, Delivery, DeliveryError},
};

/// Embed colour for warnings (red).
const WARNING_COLOR: u32 = 0xE7_4C_3C;

const MAX_TITLE: usize = 256;
const MAX_DESCRIPTION: usize = 4096;
const MAX_FOOTER: usize = 2048;

#[derive(Debug, Serialize, PartialEq)]
struct Message {
  embeds: Vec<Embed>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Embed {
  title:       String,
  description: String,
  color:       u32,
  timestamp:   String,
  #[serde(skip_serializing_if = "Option::is_none")]
  url:         Option<String>,
  thumbnail:   Link,
  author:      Author,
  #[serde(skip_serializing_if = "Option::is_none")]
  footer:      Option<Footer>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Link {
  url: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct Author {
  name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  url:  Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Footer {
  text: String,
}

fn truncate(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    Some((cut, _)) => s[..cut].to_owned(),
    None => s.to_owned(),
  }
}

fn message(a: &Announcement) -> Message {
  Message {
    embeds: vec![Embed {
      title:       truncate(&a.title, MAX_TITLE),
      description: truncate(&a.description, MAX_DESCRIPTION),
      color:       WARNING_COLOR,
      timestamp:   a.display_time.to_rfc3339(),
      url:         a.link.clone(),
      thumbnail:   Link { url: a.logo_url.clone() },
      author:      Author { name: a.author_name.clone(), url: a.author_url.clone() },
      footer:      (!a.location.is_empty())
        .then(|| Footer { text: truncate(&a.location, MAX_FOOTER) }),
    }],
  }
}

#[derive(Clone)]
pub struct WebhookDelivery {
  client: Client,
  url:    String,
}

impl WebhookDelivery {
  pub fn new(client: Client, url: impl Into<String>) -> Self {
    Self { client, url: url.into() }
  }
}

impl Delivery for WebhookDelivery {
  async fn deliver(&self, announcement: &Announcement) -> Result<Ack, DeliveryError> {
    let resp = self
      .client
      .post(&self.url)
      .query(&[("wait", "true")])
      .json(&message(announcement))
      .send()
      .await
      .map_err(|e| DeliveryError::Transport(Box::new(e)))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(DeliveryError::Rejected {
        id:     announcement.id.clone(),
        reason: format!("{status}: {}", truncate(&body, 200)),
      });
    }

    let message_id = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_owned));
    debug!(id = %announcement.id, ?message_id, "posted to webhook");
    Ok(Ack { message_id })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use warnwatch_core::announce::parse_sent;

  use super::*;

  fn announcement(location: &str) -> Announcement {
    Announcement {
      id:           "mow.DE-TEST-1".into(),
      title:        "Blaualgen".into(),
      description:  "Line1\nLine2".into(),
      location:     location.into(),
      display_time: parse_sent("2023-10-20T09:53:22+02:00").unwrap(),
      logo_url:     "https://example.org/logo.png".into(),
      author_name:  "BIWAPP".into(),
      author_url:   None,
      link:         None,
    }
  }

  #[test]
  fn embed_carries_every_field() {
    let body = serde_json::to_value(message(&announcement("Lippesee"))).unwrap();
    assert_eq!(
      body,
      json!({
        "embeds": [{
          "title": "Blaualgen",
          "description": "Line1\nLine2",
          "color": WARNING_COLOR,
          "timestamp": "2023-10-20T09:53:22+02:00",
          "thumbnail": { "url": "https://example.org/logo.png" },
          "author": { "name": "BIWAPP" },
          "footer": { "text": "Lippesee" }
        }]
      })
    );
  }

  #[test]
  fn empty_location_omits_footer() {
    let msg = message(&announcement(""));
    assert!(msg.embeds[0].footer.is_none());
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(truncate("äöü", 2), "äö");
    assert_eq!(truncate("abc", 10), "abc");
  }
}
