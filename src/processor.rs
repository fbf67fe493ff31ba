//! Channel processor — fetch, normalize, chunk, cap, summarize.
//!
//! The only terminal case is "no usable input": the text path then returns an
//! empty string and the structured path `None`, with the reason in the logs.

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::config::RcaConfig;
use crate::jira::IssueTracker;
use crate::processing::chunker::total_len;
use crate::processing::{Chunk, Chunker, MapReduceSummarizer, TextNormalizer};
use crate::provider::TextGenerator;
use crate::report::StructuredReport;
use crate::slack::{ConversationFetcher, FileFetcher, SlackApi};
use crate::RcaResult;

/// External collaborators the processor drives.
pub struct Collaborators {
    pub slack: Arc<dyn SlackApi>,
    /// `None` disables file inlining.
    pub files: Option<Arc<dyn FileFetcher>>,
    /// `None` disables issue-link enrichment.
    pub issues: Option<Arc<dyn IssueTracker>>,
    pub generator: Arc<dyn TextGenerator>,
}

pub struct SlackProcessor {
    fetcher: ConversationFetcher,
    normalizer: TextNormalizer,
    summarizer: MapReduceSummarizer,
    chunk_size: usize,
    max_total_chars: usize,
}

impl SlackProcessor {
    pub fn new(collab: Collaborators, cfg: &RcaConfig, cancel: CancelToken) -> RcaResult<Self> {
        cfg.validate()?;
        tracing::debug!(model = %collab.generator.model_id(), "Processor ready");

        Ok(Self {
            fetcher: ConversationFetcher::new(collab.slack, cfg.slack.page_size, cancel.clone()),
            normalizer: TextNormalizer::new(collab.files, collab.issues),
            summarizer: MapReduceSummarizer::new(collab.generator, cfg.pipeline.clone(), cancel)?,
            chunk_size: cfg.pipeline.chunk_size,
            max_total_chars: cfg.pipeline.max_total_chars,
        })
    }

    /// Sectioned RCA report for `channel`, or an empty string when there is nothing to summarize.
    pub fn process(&self, channel: &str) -> RcaResult<String> {
        match self.prepare_chunks(channel)? {
            Some(chunks) => self.summarizer.summarize(&chunks),
            None => Ok(String::new()),
        }
    }

    pub fn process_structured(&self, channel: &str) -> RcaResult<Option<StructuredReport>> {
        match self.prepare_chunks(channel)? {
            Some(chunks) => self.summarizer.summarize_structured(&chunks),
            None => Ok(None),
        }
    }

    fn prepare_chunks(&self, channel: &str) -> RcaResult<Option<Vec<Chunk>>> {
        let messages = self.fetcher.fetch(channel)?;
        if messages.is_empty() {
            tracing::info!(channel = %channel, "No messages found in channel");
            return Ok(None);
        }

        let texts: Vec<String> = messages
            .iter()
            .map(|m| self.normalizer.normalize(m))
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            tracing::info!(
                channel = %channel,
                messages = messages.len(),
                "Normalization produced no usable text"
            );
            return Ok(None);
        }

        let chunks = Chunker::partition(&texts, self.chunk_size);
        let chunks = Chunker::enforce_cap(chunks, self.max_total_chars);
        if chunks.is_empty() {
            tracing::warn!(
                channel = %channel,
                max_total_chars = self.max_total_chars,
                "Newest chunk alone exceeds the input cap, nothing left to summarize"
            );
            return Ok(None);
        }

        tracing::info!(
            channel = %channel,
            messages = messages.len(),
            texts = texts.len(),
            chunks = chunks.len(),
            chars = total_len(&chunks),
            "Input prepared"
        );
        Ok(Some(chunks))
    }
}
