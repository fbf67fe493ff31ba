//! Slack Web API client — `conversations.history`, `conversations.replies`, file download.
//!
//! Blocking `ureq` agents with explicit global timeouts. The file agent has
//! its own (shorter) timeout since downloads are best-effort enrichment.

use serde::Deserialize;
use std::time::Duration;

use crate::config::SlackConfig;
use crate::constants::truncate_safe;
use crate::message::Message;
use crate::{RcaError, RcaResult};

/// One page of a paginated Slack listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub messages: Vec<Message>,
    /// `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
}

/// Paginated conversation reads.
pub trait SlackApi: Send + Sync {
    fn history(&self, channel: &str, cursor: Option<&str>, limit: u32) -> RcaResult<Page>;

    /// First record of the first page is the thread root itself.
    fn replies(
        &self,
        channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> RcaResult<Page>;
}

/// Authenticated download of a file's raw text.
pub trait FileFetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> RcaResult<String>;
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

impl PageResponse {
    fn into_page(self, method: &str) -> RcaResult<Page> {
        if !self.ok {
            return Err(RcaError::Fetch(format!(
                "{} returned error: {}",
                method,
                self.error.as_deref().unwrap_or("unknown")
            )));
        }
        let next_cursor = self
            .response_metadata
            .and_then(|m| m.next_cursor)
            .filter(|c| !c.is_empty());
        Ok(Page {
            messages: self.messages,
            next_cursor,
        })
    }
}

pub struct SlackWebClient {
    api: ureq::Agent,
    files: ureq::Agent,
    api_base: String,
    auth: String,
    max_file_chars: usize,
}

impl SlackWebClient {
    pub fn new(token: &str, cfg: &SlackConfig) -> Self {
        Self {
            api: build_agent(cfg.http_timeout_secs),
            files: build_agent(cfg.file_timeout_secs),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            auth: format!("Bearer {}", token),
            max_file_chars: cfg.max_file_chars,
        }
    }

    fn get_page(&self, method: &str, params: &[(&str, &str)]) -> RcaResult<Page> {
        let url = format!("{}/{}", self.api_base, method);
        let mut request = self.api.get(url.as_str()).header("Authorization", &self.auth);
        for (key, value) in params {
            request = request.query(*key, *value);
        }

        let mut response = request
            .call()
            .map_err(|e| RcaError::Fetch(format!("{} request failed: {}", method, e)))?;
        let body: PageResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| RcaError::Fetch(format!("{} response undecodable: {}", method, e)))?;

        body.into_page(method)
    }
}

fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build()
        .into()
}

impl SlackApi for SlackWebClient {
    fn history(&self, channel: &str, cursor: Option<&str>, limit: u32) -> RcaResult<Page> {
        let limit = limit.to_string();
        let mut params = vec![("channel", channel), ("limit", limit.as_str())];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        self.get_page("conversations.history", &params)
    }

    fn replies(
        &self,
        channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> RcaResult<Page> {
        let limit = limit.to_string();
        let mut params = vec![("channel", channel), ("ts", thread_ts), ("limit", limit.as_str())];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        self.get_page("conversations.replies", &params)
    }
}

impl FileFetcher for SlackWebClient {
    fn fetch_text(&self, url: &str) -> RcaResult<String> {
        let mut response = self
            .files
            .get(url)
            .header("Authorization", &self.auth)
            .call()
            .map_err(|e| RcaError::Enrichment(format!("file download failed: {}", e)))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RcaError::Enrichment(format!("file body unreadable: {}", e)))?;
        Ok(truncate_safe(&text, self.max_file_chars).to_string())
    }
}
