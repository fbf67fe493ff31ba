//! Shared test utilities — message builder and in-memory collaborators.
//!
//! Available only under `#[cfg(test)]`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::jira::{Issue, IssueTracker};
use crate::message::{Message, SlackFile};
use crate::provider::TextGenerator;
use crate::slack::{FileFetcher, Page, SlackApi};
use crate::{RcaError, RcaResult};

// ============================================================================
// MessageBuilder
// ============================================================================

pub struct MessageBuilder {
    msg: Message,
}

impl MessageBuilder {
    pub fn new(ts: &str) -> Self {
        Self {
            msg: Message {
                ts: ts.to_string(),
                text: format!("message {}", ts),
                ..Default::default()
            },
        }
    }

    pub fn text(mut self, t: &str) -> Self {
        self.msg.text = t.to_string();
        self
    }

    pub fn subtype(mut self, s: &str) -> Self {
        self.msg.subtype = Some(s.to_string());
        self
    }

    /// Root of a thread with `replies` replies.
    pub fn thread_root(mut self, replies: u32) -> Self {
        self.msg.thread_ts = Some(self.msg.ts.clone());
        self.msg.reply_count = replies;
        self
    }

    pub fn reply_to(mut self, root_ts: &str) -> Self {
        self.msg.thread_ts = Some(root_ts.to_string());
        self
    }

    pub fn reply_count(mut self, n: u32) -> Self {
        self.msg.reply_count = n;
        self
    }

    pub fn file(mut self, name: &str, mimetype: Option<&str>, url: &str) -> Self {
        self.msg.files.push(SlackFile {
            name: name.to_string(),
            mimetype: mimetype.map(String::from),
            url_private: Some(url.to_string()),
            url_private_download: None,
        });
        self
    }

    pub fn build(self) -> Message {
        self.msg
    }
}

// ============================================================================
// FakeSlack
// ============================================================================

/// `None` entries fail when requested. Cursors are `p{index}`.
type Pages = Vec<Option<Vec<Message>>>;

#[derive(Default)]
pub struct FakeSlack {
    history: Pages,
    replies: HashMap<String, Pages>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_page(mut self, messages: Vec<Message>) -> Self {
        self.history.push(Some(messages));
        self
    }

    pub fn history_failure(mut self) -> Self {
        self.history.push(None);
        self
    }

    pub fn replies_page(mut self, thread_ts: &str, messages: Vec<Message>) -> Self {
        self.replies.entry(thread_ts.to_string()).or_default().push(Some(messages));
        self
    }

    pub fn replies_failure(mut self, thread_ts: &str) -> Self {
        self.replies.entry(thread_ts.to_string()).or_default().push(None);
        self
    }

    /// Log of `history:<cursor>` / `replies:<ts>:<cursor>` calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

fn serve(pages: &Pages, cursor: Option<&str>) -> RcaResult<Page> {
    let idx: usize = match cursor {
        None => 0,
        Some(c) => c
            .trim_start_matches('p')
            .parse()
            .map_err(|_| RcaError::Fetch(format!("bad cursor {}", c)))?,
    };

    match pages.get(idx) {
        None if idx == 0 => Ok(Page::default()),
        None => Err(RcaError::Fetch(format!("no page {}", idx))),
        Some(None) => Err(RcaError::Fetch("injected failure".into())),
        Some(Some(messages)) => Ok(Page {
            messages: messages.clone(),
            next_cursor: (idx + 1 < pages.len()).then(|| format!("p{}", idx + 1)),
        }),
    }
}

impl SlackApi for FakeSlack {
    fn history(&self, _channel: &str, cursor: Option<&str>, _limit: u32) -> RcaResult<Page> {
        self.record(format!("history:{}", cursor.unwrap_or("-")));
        serve(&self.history, cursor)
    }

    fn replies(
        &self,
        _channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
        _limit: u32,
    ) -> RcaResult<Page> {
        self.record(format!("replies:{}:{}", thread_ts, cursor.unwrap_or("-")));
        match self.replies.get(thread_ts) {
            Some(pages) => serve(pages, cursor),
            None => Ok(Page::default()),
        }
    }
}

// ============================================================================
// FakeFiles / FakeTracker
// ============================================================================

#[derive(Default)]
pub struct FakeFiles {
    files: HashMap<String, String>,
}

impl FakeFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, url: &str, content: &str) -> Self {
        self.files.insert(url.to_string(), content.to_string());
        self
    }
}

impl FileFetcher for FakeFiles {
    fn fetch_text(&self, url: &str) -> RcaResult<String> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| RcaError::Enrichment(format!("404 {}", url)))
    }
}

#[derive(Default)]
pub struct FakeTracker {
    issues: HashMap<String, Issue>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(mut self, key: &str, summary: &str, description: Option<&str>) -> Self {
        self.issues.insert(
            key.to_string(),
            Issue {
                key: key.to_string(),
                summary: summary.to_string(),
                description: description.map(String::from),
            },
        );
        self
    }
}

impl IssueTracker for FakeTracker {
    fn fetch_issue(&self, key: &str) -> RcaResult<Issue> {
        self.issues
            .get(key)
            .cloned()
            .ok_or_else(|| RcaError::Enrichment(format!("issue {} not found", key)))
    }
}

// ============================================================================
// ScriptedGenerator
// ============================================================================

type Script = Box<dyn Fn(&str) -> RcaResult<String> + Send + Sync>;

/// Answers each prompt through a closure and records every prompt it saw.
pub struct ScriptedGenerator {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str) -> RcaResult<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn model_id(&self) -> &str {
        "scripted"
    }

    fn invoke(&self, prompt: &str) -> RcaResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.script)(prompt)
    }
}
