//! Conversation fetcher — whole channel tree in depth-first, chronological order.
//!
//! Traversal uses an explicit LIFO stack: roots are pushed newest-first so the
//! oldest pops first, and a thread's replies are pushed right after their root
//! is emitted, which keeps each thread contiguous behind its root.
//!
//! A failed page only ends its own pagination loop; everything collected so
//! far is kept.

use std::collections::HashSet;
use std::sync::Arc;

use super::client::SlackApi;
use crate::cancel::CancelToken;
use crate::message::{sort_chronologically, Message};
use crate::RcaResult;

pub struct ConversationFetcher {
    api: Arc<dyn SlackApi>,
    page_size: u32,
    cancel: CancelToken,
}

impl ConversationFetcher {
    pub fn new(api: Arc<dyn SlackApi>, page_size: u32, cancel: CancelToken) -> Self {
        Self {
            api,
            page_size,
            cancel,
        }
    }

    /// All non-system messages of `channel`, each root followed by its replies.
    /// Only cancellation is returned as an error.
    pub fn fetch(&self, channel: &str) -> RcaResult<Vec<Message>> {
        let mut roots = self.fetch_history(channel)?;
        sort_chronologically(&mut roots);
        tracing::info!(channel = %channel, roots = roots.len(), "History fetched");

        let mut emitted = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack: Vec<Message> = roots.into_iter().rev().collect();
        let mut threads = 0usize;

        while let Some(msg) = stack.pop() {
            if !seen.insert(msg.ts.clone()) {
                tracing::debug!(ts = %msg.ts, "Duplicate record skipped");
                continue;
            }

            let expand = msg.is_thread_root();
            let root_ts = msg.ts.clone();

            if msg.is_system_event() {
                tracing::debug!(ts = %msg.ts, subtype = ?msg.subtype, "System event filtered");
            } else {
                emitted.push(msg);
            }

            if expand {
                threads += 1;
                let mut replies = self.fetch_replies(channel, &root_ts)?;
                replies.retain(|r| !seen.contains(&r.ts));
                sort_chronologically(&mut replies);
                stack.extend(replies.into_iter().rev());
            }
        }

        tracing::info!(
            channel = %channel,
            messages = emitted.len(),
            threads,
            "Conversation tree fetched"
        );
        Ok(emitted)
    }

    fn fetch_history(&self, channel: &str) -> RcaResult<Vec<Message>> {
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            self.cancel.check()?;
            match self.api.history(channel, cursor.as_deref(), self.page_size) {
                Ok(page) => {
                    pages += 1;
                    collected.extend(page.messages);
                    match page.next_cursor {
                        Some(next) if cursor.as_deref() != Some(next.as_str()) => {
                            cursor = Some(next)
                        }
                        Some(_) => {
                            tracing::warn!(
                                channel = %channel,
                                pages,
                                "History cursor did not advance, stopping"
                            );
                            break;
                        }
                        None => break,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        channel = %channel,
                        pages,
                        kept = collected.len(),
                        "History fetch failed, keeping partial results: {}",
                        e
                    );
                    break;
                }
            }
        }

        Ok(collected)
    }

    fn fetch_replies(&self, channel: &str, root_ts: &str) -> RcaResult<Vec<Message>> {
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            self.cancel.check()?;
            match self.api.replies(channel, root_ts, cursor.as_deref(), self.page_size) {
                Ok(page) => {
                    let mut records = page.messages.into_iter().peekable();
                    // Each page echoes the root first.
                    if records.peek().is_some_and(|m| m.ts == root_ts) {
                        records.next();
                    }
                    collected.extend(records);
                    match page.next_cursor {
                        Some(next) if cursor.as_deref() != Some(next.as_str()) => {
                            cursor = Some(next)
                        }
                        Some(_) => {
                            tracing::warn!(
                                thread_ts = %root_ts,
                                "Replies cursor did not advance, stopping"
                            );
                            break;
                        }
                        None => break,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        thread_ts = %root_ts,
                        kept = collected.len(),
                        "Fetching replies failed: {}",
                        e
                    );
                    break;
                }
            }
        }

        Ok(collected)
    }
}
