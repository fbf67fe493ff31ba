use serde::{Deserialize, Serialize};

use crate::constants::SYSTEM_SUBTYPES;

/// One Slack message record as returned by `conversations.history` / `conversations.replies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub files: Vec<SlackFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Block Kit block. Only `section` text and `context` element text are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextObject>,
    #[serde(default)]
    pub elements: Vec<BlockElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(default)]
    pub text: String,
}

/// Context element; images have no text and deserialize with `text: None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockElement {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub url_private: Option<String>,
    #[serde(default)]
    pub url_private_download: Option<String>,
}

impl SlackFile {
    /// Download URL, preferring the raw-download variant.
    pub fn content_url(&self) -> Option<&str> {
        self.url_private_download
            .as_deref()
            .or(self.url_private.as_deref())
    }

    /// Unknown mimetypes are treated as text and attempted.
    pub fn is_textual(&self) -> bool {
        match self.mimetype.as_deref() {
            None => true,
            Some(m) => {
                m.starts_with("text/")
                    || matches!(
                        m,
                        "application/json"
                            | "application/xml"
                            | "application/x-yaml"
                            | "application/yaml"
                            | "application/x-sh"
                            | "application/javascript"
                    )
            }
        }
    }
}

impl Message {
    /// Slack timestamps are "seconds.micros" strings; unparsable ones sort first.
    pub fn timestamp(&self) -> f64 {
        self.ts.parse().unwrap_or(0.0)
    }

    /// Opens a thread: has replies and is not itself a reply.
    pub fn is_thread_root(&self) -> bool {
        self.reply_count > 0
            && self
                .thread_ts
                .as_deref()
                .map_or(true, |root| root == self.ts)
    }

    pub fn is_system_event(&self) -> bool {
        self.subtype
            .as_deref()
            .is_some_and(|s| SYSTEM_SUBTYPES.contains(&s))
    }
}

/// Sort ascending by numeric timestamp. Stable, so equal stamps keep arrival order.
pub fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sparse_record() {
        let msg: Message = serde_json::from_str(r#"{"ts":"1700000000.000100"}"#).unwrap();
        assert_eq!(msg.reply_count, 0);
        assert!(msg.attachments.is_empty());
        assert!(!msg.is_thread_root());
    }

    #[test]
    fn test_deserialize_blocks_and_files() {
        let raw = r#"{
            "ts": "1.0",
            "text": "hi",
            "attachments": [{
                "fallback": "fb",
                "blocks": [
                    {"type": "section", "text": {"type": "mrkdwn", "text": "sec"}},
                    {"type": "context", "elements": [
                        {"type": "image", "image_url": "x"},
                        {"type": "mrkdwn", "text": "ctx"}
                    ]}
                ]
            }],
            "files": [{
                "name": "log.txt",
                "mimetype": "text/plain",
                "url_private": "https://files/log.txt"
            }]
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        let blocks = &msg.attachments[0].blocks;
        assert_eq!(blocks[0].kind, "section");
        assert_eq!(blocks[1].elements[0].text, None);
        assert_eq!(blocks[1].elements[1].text.as_deref(), Some("ctx"));
        assert_eq!(msg.files[0].content_url(), Some("https://files/log.txt"));
    }

    #[test]
    fn test_thread_root_detection() {
        let root = Message {
            ts: "10.0".into(),
            thread_ts: Some("10.0".into()),
            reply_count: 2,
            ..Default::default()
        };
        let reply = Message {
            ts: "11.0".into(),
            thread_ts: Some("10.0".into()),
            reply_count: 2,
            ..Default::default()
        };
        assert!(root.is_thread_root());
        assert!(!reply.is_thread_root());
    }

    #[test]
    fn test_sort_is_numeric_not_lexical() {
        let mut msgs = vec![
            Message { ts: "100.0".into(), ..Default::default() },
            Message { ts: "99.5".into(), ..Default::default() },
        ];
        sort_chronologically(&mut msgs);
        assert_eq!(msgs[0].ts, "99.5");
    }

    #[test]
    fn test_textual_mimetypes() {
        let mut f = SlackFile::default();
        assert!(f.is_textual());
        f.mimetype = Some("image/png".into());
        assert!(!f.is_textual());
        f.mimetype = Some("application/json".into());
        assert!(f.is_textual());
    }
}
