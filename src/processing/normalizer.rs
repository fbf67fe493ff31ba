//! Message normalization — one Slack record in, one prompt-ready string out.
//!
//! Fragment order: primary text, attachment fallbacks, attachment block text
//! (section text, context element text), inlined files. Fragments are joined
//! with blank lines, mentions are stripped, then issue links are expanded when
//! an issue tracker is available. An empty result means "drop this message".

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::jira::{Issue, IssueTracker};
use crate::message::{Message, SlackFile};
use crate::slack::FileFetcher;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:@[A-Z0-9]+|!(?:here|channel|everyone)|!subteam\^[A-Z0-9]+)(?:\|[^>]*)?>[ \t]?")
        .expect("mention pattern")
});

static ISSUE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s<>|]+/browse/([A-Z][A-Z0-9_]+-[0-9]+)").expect("issue link pattern")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

pub struct TextNormalizer {
    files: Option<Arc<dyn FileFetcher>>,
    issues: Option<Arc<dyn IssueTracker>>,
}

impl TextNormalizer {
    pub fn new(files: Option<Arc<dyn FileFetcher>>, issues: Option<Arc<dyn IssueTracker>>) -> Self {
        Self { files, issues }
    }

    pub fn normalize(&self, msg: &Message) -> String {
        if msg.is_system_event() {
            return String::new();
        }

        let mut fragments: Vec<String> = Vec::new();
        push_fragment(&mut fragments, &msg.text);

        for attachment in &msg.attachments {
            if let Some(fallback) = &attachment.fallback {
                push_fragment(&mut fragments, fallback);
            }
        }

        for attachment in &msg.attachments {
            for block in &attachment.blocks {
                match block.kind.as_str() {
                    "section" => {
                        if let Some(text) = &block.text {
                            push_fragment(&mut fragments, &text.text);
                        }
                    }
                    "context" => {
                        for element in &block.elements {
                            if let Some(text) = &element.text {
                                push_fragment(&mut fragments, text);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        for file in &msg.files {
            if let Some(dump) = self.inline_file(file) {
                fragments.push(dump);
            }
        }

        let cleaned = clean_text(&fragments.join("\n\n"));
        if cleaned.is_empty() {
            return cleaned;
        }

        match &self.issues {
            Some(tracker) => enrich_issue_links(&cleaned, tracker.as_ref()),
            None => cleaned,
        }
    }

    fn inline_file(&self, file: &SlackFile) -> Option<String> {
        let fetcher = self.files.as_ref()?;
        if !file.is_textual() {
            tracing::debug!(file = %file.name, mimetype = ?file.mimetype, "Non-text file skipped");
            return None;
        }
        let url = file.content_url()?;

        match fetcher.fetch_text(url) {
            Ok(content) => Some(format!(
                "--- File: {} ---\n{}\n--- End of file ---",
                file.name,
                content.trim_end()
            )),
            Err(e) => {
                tracing::warn!(file = %file.name, "File inline skipped: {}", e);
                None
            }
        }
    }
}

fn push_fragment(fragments: &mut Vec<String>, text: &str) {
    if !text.trim().is_empty() {
        fragments.push(text.to_string());
    }
}

/// Strip mention tokens, collapse blank-line runs, trim.
pub fn clean_text(raw: &str) -> String {
    let stripped = MENTION_RE.replace_all(raw, "");
    let collapsed = BLANK_RUN_RE.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

/// Distinct issue keys referenced by browse links, in first-appearance order.
pub fn issue_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in ISSUE_LINK_RE.captures_iter(text) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Append one issue block per successfully resolved key; links stay untouched.
pub fn enrich_issue_links(text: &str, tracker: &dyn IssueTracker) -> String {
    let mut enriched = text.to_string();
    for key in issue_keys(text) {
        match tracker.fetch_issue(&key) {
            Ok(issue) => {
                tracing::debug!(issue = %key, "Issue link expanded");
                enriched.push_str("\n\n");
                enriched.push_str(&format_issue_block(&issue));
            }
            Err(e) => tracing::warn!(issue = %key, "Issue lookup failed: {}", e),
        }
    }
    enriched
}

fn format_issue_block(issue: &Issue) -> String {
    format!(
        "--- Referenced issue {} ---\nSummary: {}\nDescription: {}\n--- End of issue ---",
        issue.key,
        issue.summary,
        issue.description.as_deref().unwrap_or("(no description)")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Attachment, Block, BlockElement, TextObject};
    use crate::test_helpers::*;

    const LINKED: &str = "Outage tracked in <https://acme.atlassian.net/browse/OPS-7|OPS-7>";

    fn bare() -> TextNormalizer {
        TextNormalizer::new(None, None)
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "Deploy at 10:02 broke checkout.\n\nRolled back at 10:15.";
        let msg = MessageBuilder::new("1.0").text(text).build();
        assert_eq!(bare().normalize(&msg), text);
        assert_eq!(clean_text(text), text);
    }

    #[test]
    fn test_mentions_stripped() {
        let msg = MessageBuilder::new("1.0")
            .text("<!here> <@U02ABC> please check <@U03XYZ|alice> logs")
            .build();
        assert_eq!(bare().normalize(&msg), "please check logs");
    }

    #[test]
    fn test_fragment_order_and_blocks() {
        let msg = Message {
            ts: "1.0".into(),
            text: "primary".into(),
            attachments: vec![
                Attachment {
                    fallback: Some("fb-1".into()),
                    blocks: vec![
                        Block {
                            kind: "section".into(),
                            text: Some(TextObject { text: "section-1".into() }),
                            elements: vec![],
                        },
                        Block {
                            kind: "context".into(),
                            text: None,
                            elements: vec![
                                BlockElement { text: Some("ctx-a".into()) },
                                BlockElement { text: None },
                            ],
                        },
                        Block {
                            kind: "divider".into(),
                            text: Some(TextObject { text: "ignored".into() }),
                            elements: vec![],
                        },
                    ],
                },
                Attachment {
                    fallback: Some("fb-2".into()),
                    blocks: vec![],
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            bare().normalize(&msg),
            "primary\n\nfb-1\n\nfb-2\n\nsection-1\n\nctx-a"
        );
    }

    #[test]
    fn test_system_event_yields_empty() {
        let msg = MessageBuilder::new("1.0").subtype("channel_leave").text("left").build();
        assert_eq!(bare().normalize(&msg), "");
    }

    #[test]
    fn test_files_inlined_and_failures_omitted() {
        let files = FakeFiles::new().file("https://files/ok.log", "ERROR pool exhausted\n");
        let normalizer = TextNormalizer::new(Some(Arc::new(files)), None);
        let msg = MessageBuilder::new("1.0")
            .text("see logs")
            .file("ok.log", Some("text/plain"), "https://files/ok.log")
            .file("missing.log", None, "https://files/missing.log")
            .file("graph.png", Some("image/png"), "https://files/graph.png")
            .build();
        assert_eq!(
            normalizer.normalize(&msg),
            "see logs\n\n--- File: ok.log ---\nERROR pool exhausted\n--- End of file ---"
        );
    }

    #[test]
    fn test_issue_link_enriched_when_tracker_available() {
        let tracker = FakeTracker::new().issue("OPS-7", "DB failover stalled", Some("Replica lag"));
        let normalizer = TextNormalizer::new(None, Some(Arc::new(tracker)));
        let msg = MessageBuilder::new("1.0").text(LINKED).build();
        let out = normalizer.normalize(&msg);
        assert!(out.starts_with(LINKED));
        assert!(out.contains(
            "--- Referenced issue OPS-7 ---\nSummary: DB failover stalled\nDescription: Replica lag"
        ));
    }

    #[test]
    fn test_issue_link_untouched_without_tracker() {
        let msg = MessageBuilder::new("1.0").text(LINKED).build();
        assert_eq!(bare().normalize(&msg), LINKED);
    }

    #[test]
    fn test_failed_lookup_leaves_link() {
        let normalizer = TextNormalizer::new(None, Some(Arc::new(FakeTracker::new())));
        let msg = MessageBuilder::new("1.0").text(LINKED).build();
        assert_eq!(normalizer.normalize(&msg), LINKED);
    }

    #[test]
    fn test_issue_keys_deduplicated_in_order() {
        let text = "https://j/browse/BE-2, https://j/browse/AB-1, https://j/browse/BE-2";
        assert_eq!(issue_keys(text), vec!["BE-2", "AB-1"]);
    }

    #[test]
    fn test_issue_key_needs_two_char_project() {
        assert!(issue_keys("https://j/browse/A-1").is_empty());
        assert!(issue_keys("https://j/browse/ops-1").is_empty());
        assert!(issue_keys("https://j/browse/1OPS-1").is_empty());
        assert_eq!(issue_keys("https://j/browse/Q2_OPS-10"), vec!["Q2_OPS-10"]);
    }
}
