//! Map-reduce summarization over chunks.
//!
//! Phases:
//!   1. Map — one call per chunk; failed or empty answers are skipped.
//!   2. Batch reduce — while more than one summary remains and their combined
//!      size exceeds `context_budget`, merge groups of `reduce_group_size`.
//!      A level with zero successful merges keeps the previous level and ends
//!      the phase.
//!   3. Final reduce — one call producing the sectioned report; on failure the
//!      remaining summaries are concatenated. A single remaining summary is
//!      returned as-is.
//!
//! Levels are strictly sequential. The map phase may run on a bounded rayon
//! pool when `map_workers > 1`; output order always follows chunk order.

use rayon::prelude::*;
use std::sync::Arc;

use super::chunker::Chunk;
use super::prompts;
use crate::cancel::CancelToken;
use crate::config::PipelineConfig;
use crate::constants::char_len;
use crate::provider::TextGenerator;
use crate::report::{parse_structured, StructuredReport};
use crate::RcaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLevel {
    Map,
    Reduce(u32),
    Final,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    pub level: SummaryLevel,
}

impl Summary {
    fn new(text: String, level: SummaryLevel) -> Self {
        Self { text, level }
    }
}

fn combined_len(summaries: &[Summary]) -> usize {
    summaries.iter().map(|s| char_len(&s.text)).sum()
}

fn texts(summaries: &[Summary]) -> Vec<&str> {
    summaries.iter().map(|s| s.text.as_str()).collect()
}

pub struct MapReduceSummarizer {
    generator: Arc<dyn TextGenerator>,
    cfg: PipelineConfig,
    cancel: CancelToken,
}

impl MapReduceSummarizer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cfg: PipelineConfig,
        cancel: CancelToken,
    ) -> RcaResult<Self> {
        cfg.validate()?;
        Ok(Self {
            generator,
            cfg,
            cancel,
        })
    }

    /// Sectioned text report. Empty when no chunk produced a summary.
    pub fn summarize(&self, chunks: &[Chunk]) -> RcaResult<String> {
        let summaries = self.map_phase(chunks)?;
        if summaries.is_empty() {
            tracing::warn!(chunks = chunks.len(), "No chunk produced a summary, report is empty");
            return Ok(String::new());
        }

        let summaries = self.batch_reduce(summaries)?;
        let report = self.final_reduce(summaries)?;
        Ok(report.text)
    }

    /// Structured-mode variant: same map and batch-reduce phases, then one JSON
    /// final call. `None` when no chunk produced a summary.
    ///
    /// A failed or unparseable final answer degrades to a report whose summary is
    /// the concatenated summaries, with no action items.
    pub fn summarize_structured(&self, chunks: &[Chunk]) -> RcaResult<Option<StructuredReport>> {
        let summaries = self.map_phase(chunks)?;
        if summaries.is_empty() {
            tracing::warn!(
                chunks = chunks.len(),
                "No chunk produced a summary, no structured report"
            );
            return Ok(None);
        }

        let summaries = self.batch_reduce(summaries)?;
        self.cancel.check()?;
        let prompt = prompts::structured_final_prompt(&texts(&summaries));
        let parsed = self
            .generator
            .invoke(&prompt)
            .and_then(|response| parse_structured(&response, self.cfg.min_action_confidence));

        match parsed {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                tracing::warn!(
                    summaries = summaries.len(),
                    "Structured final reduce failed, degrading to concatenated summaries: {}",
                    e
                );
                Ok(Some(StructuredReport::degraded(texts(&summaries).join("\n\n"))))
            }
        }
    }

    // ── Map ──

    fn map_phase(&self, chunks: &[Chunk]) -> RcaResult<Vec<Summary>> {
        let total = chunks.len();
        let results: Vec<RcaResult<Option<Summary>>> = match self.map_pool(total) {
            Some(pool) => pool.install(|| {
                chunks
                    .par_iter()
                    .enumerate()
                    .map(|(i, chunk)| self.map_one(i, total, chunk))
                    .collect()
            }),
            None => chunks
                .iter()
                .enumerate()
                .map(|(i, chunk)| self.map_one(i, total, chunk))
                .collect(),
        };

        let mut summaries = Vec::with_capacity(total);
        for result in results {
            if let Some(summary) = result? {
                summaries.push(summary);
            }
        }

        tracing::info!(
            chunks = total,
            summaries = summaries.len(),
            chars = combined_len(&summaries),
            "Map phase complete"
        );
        Ok(summaries)
    }

    fn map_pool(&self, total: usize) -> Option<rayon::ThreadPool> {
        if self.cfg.map_workers <= 1 || total <= 1 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.cfg.map_workers.min(total))
            .thread_name(|i| format!("map-worker-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!("Map worker pool unavailable, running sequentially: {}", e);
                None
            }
        }
    }

    fn map_one(&self, index: usize, total: usize, chunk: &Chunk) -> RcaResult<Option<Summary>> {
        self.cancel.check()?;
        let prompt = prompts::map_prompt(&chunk.text, index + 1, total);
        match self.generator.invoke(&prompt) {
            Ok(text) if !text.trim().is_empty() => {
                Ok(Some(Summary::new(text, SummaryLevel::Map)))
            }
            Ok(_) => {
                tracing::warn!(
                    chunk = index + 1,
                    total,
                    "Map call returned empty response, chunk skipped"
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(chunk = index + 1, total, "Map call failed, chunk skipped: {}", e);
                Ok(None)
            }
        }
    }

    // ── Batch reduce ──

    fn batch_reduce(&self, mut current: Vec<Summary>) -> RcaResult<Vec<Summary>> {
        let mut level = 0u32;

        while current.len() > 1 && combined_len(&current) > self.cfg.context_budget {
            if level >= self.cfg.max_reduce_levels {
                tracing::warn!(
                    reduce_level = level,
                    summaries = current.len(),
                    "Reduce level limit reached"
                );
                break;
            }
            level += 1;

            let mut next = Vec::new();
            let mut merged = 0usize;
            for group in current.chunks(self.cfg.reduce_group_size) {
                if let [single] = group {
                    next.push(Summary::new(single.text.clone(), SummaryLevel::Reduce(level)));
                    continue;
                }

                self.cancel.check()?;
                let prompt = prompts::batch_reduce_prompt(&texts(group), level);
                match self.generator.invoke(&prompt) {
                    Ok(text) if !text.trim().is_empty() => {
                        merged += 1;
                        next.push(Summary::new(text, SummaryLevel::Reduce(level)));
                    }
                    Ok(_) => tracing::warn!(
                        reduce_level = level,
                        group = group.len(),
                        "Merge returned empty response, group dropped"
                    ),
                    Err(e) => tracing::warn!(
                        reduce_level = level,
                        group = group.len(),
                        "Merge failed, group dropped: {}",
                        e
                    ),
                }
            }

            if merged == 0 {
                tracing::warn!(
                    reduce_level = level,
                    summaries = current.len(),
                    "No group merged, keeping previous level"
                );
                break;
            }

            tracing::info!(
                reduce_level = level,
                before = current.len(),
                after = next.len(),
                chars = combined_len(&next),
                budget = self.cfg.context_budget,
                "Reduce level complete"
            );
            current = next;
        }

        Ok(current)
    }

    // ── Final reduce ──

    fn final_reduce(&self, summaries: Vec<Summary>) -> RcaResult<Summary> {
        if let [only] = summaries.as_slice() {
            return Ok(only.clone());
        }

        self.cancel.check()?;
        let prompt = prompts::final_reduce_prompt(&texts(&summaries));
        match self.generator.invoke(&prompt) {
            Ok(text) if !text.trim().is_empty() => Ok(Summary::new(text, SummaryLevel::Final)),
            outcome => {
                let reason = match outcome {
                    Err(e) => e.to_string(),
                    Ok(_) => "empty response".to_string(),
                };
                tracing::warn!(
                    summaries = summaries.len(),
                    "Final reduce failed, concatenating summaries: {}",
                    reason
                );
                let joined = texts(&summaries).join("\n\n");
                Ok(Summary::new(joined, SummaryLevel::Final))
            }
        }
    }
}
