//! Notifier gateway: delivers finished messages to a chat webhook

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Longest message body the webhook accepts, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Default timeout for one webhook post
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from delivering a notification; logged and dropped, never retried
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid webhook url: {0}")]
    Url(String),
}

/// Anything that can deliver a text notification
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;
}

/// Posts messages to a Discord-compatible webhook
#[derive(Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Url,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook path is a credential
        f.debug_struct("WebhookNotifier")
            .field("host", &self.url.host_str())
            .finish_non_exhaustive()
    }
}

impl WebhookNotifier {
    /// Create a notifier for an absolute http(s) webhook URL
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let url = Url::parse(url).map_err(|e| NotifyError::Url(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::Url(format!("unsupported scheme '{}'", url.scheme())));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url })
    }

    async fn post(&self, content: &str) -> Result<(), NotifyError> {
        let body = json!({
            "content": content,
            // Cell text must never ping anyone
            "allowed_mentions": { "parse": [] },
        });

        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let parts = split_message(text, MAX_MESSAGE_CHARS);
        let total = parts.len();

        for (i, part) in parts.iter().enumerate() {
            self.post(part).await?;
            debug!("Delivered message part {}/{} ({} chars)", i + 1, total, part.chars().count());
        }
        Ok(())
    }
}

/// Split a message into parts of at most `limit` characters
///
/// Splits on line boundaries where possible; a single line longer than the
/// limit is cut into fixed-size pieces. Blank parts are dropped.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if started { current_len + 1 + line_len } else { line_len };

        if needed <= limit {
            if started {
                current.push('\n');
            }
            current.push_str(line);
            current_len = needed;
            started = true;
            continue;
        }

        if started {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            started = true;
        } else {
            let chars: Vec<char> = line.chars().collect();
            parts.extend(chars.chunks(limit).map(|chunk| chunk.iter().collect::<String>()));
        }
    }

    if started {
        parts.push(current);
    }

    parts.retain(|p| !p.trim().is_empty());
    parts
}
