//! Run configuration — chunking budgets, reduce fan-in, HTTP timeouts, model routing.
//!
//! Layering: built-in defaults → optional TOML file → CLI flags / env vars.
//! Every section is `#[serde(default)]` so a partial file is valid.
//! The assembled value is validated once and then only read.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::{RcaError, RcaResult};

// ============================================================================
// SLACK
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Web API base, overridable for tests and proxies.
    pub api_base: String,
    pub page_size: u32,                 // default: 200
    pub http_timeout_secs: u64,         // default: 30
    /// Timeout for inlined file downloads.
    pub file_timeout_secs: u64,         // default: 10
    pub max_file_chars: usize,          // default: 20_000
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base: SLACK_API_BASE.to_string(),
            page_size: SLACK_PAGE_SIZE,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            file_timeout_secs: FILE_TIMEOUT_SECS,
            max_file_chars: MAX_FILE_CHARS,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Size budgets and fan-in for chunking and map-reduce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Soft upper bound of one chunk, in chars.
    pub chunk_size: usize,              // default: 12_000
    /// Hard cap on the total kept input; oldest chunks are dropped first.
    pub max_total_chars: usize,         // default: 200_000
    /// Combined summary size the final reduce call may receive.
    pub context_budget: usize,          // default: 24_000
    pub reduce_group_size: usize,       // default: 3, must be >= 2
    pub max_reduce_levels: u32,         // default: 8
    /// 1 = sequential map phase.
    pub map_workers: usize,             // default: 1
    /// Structured mode drops action items below this confidence.
    pub min_action_confidence: f64,     // default: 0.5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_total_chars: DEFAULT_MAX_TOTAL_CHARS,
            context_budget: DEFAULT_CONTEXT_BUDGET,
            reduce_group_size: DEFAULT_REDUCE_GROUP_SIZE,
            max_reduce_levels: DEFAULT_MAX_REDUCE_LEVELS,
            map_workers: DEFAULT_MAP_WORKERS,
            min_action_confidence: DEFAULT_MIN_ACTION_CONFIDENCE,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> RcaResult<()> {
        if self.chunk_size == 0 {
            return Err(RcaError::Config("pipeline.chunk_size must be > 0".into()));
        }
        if self.max_total_chars == 0 {
            return Err(RcaError::Config("pipeline.max_total_chars must be > 0".into()));
        }
        if self.context_budget == 0 {
            return Err(RcaError::Config("pipeline.context_budget must be > 0".into()));
        }
        if self.reduce_group_size < 2 {
            return Err(RcaError::Config(format!(
                "pipeline.reduce_group_size must be >= 2 (got {})",
                self.reduce_group_size
            )));
        }
        if self.max_reduce_levels == 0 {
            return Err(RcaError::Config("pipeline.max_reduce_levels must be >= 1".into()));
        }
        if self.map_workers == 0 {
            return Err(RcaError::Config("pipeline.map_workers must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_action_confidence) {
            return Err(RcaError::Config(format!(
                "pipeline.min_action_confidence must be within 0.0..=1.0 (got {})",
                self.min_action_confidence
            )));
        }
        Ok(())
    }
}

// ============================================================================
// BEDROCK
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BedrockConfig {
    /// Model identifier, required before a run (usually from the CLI).
    pub model_id: String,
    pub region: String,                 // default: us-west-2
    /// Full endpoint override; derived from `region` when absent.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,              // default: 120
    pub max_tokens: u32,                // default: 4096
    pub temperature: f64,               // default: 0.2
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            model_id: String::new(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            timeout_secs: LLM_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl BedrockConfig {
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

// ============================================================================
// ROOT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcaConfig {
    pub slack: SlackConfig,
    pub pipeline: PipelineConfig,
    pub bedrock: BedrockConfig,
}

impl RcaConfig {
    /// Load from an explicit path, or from the default location if it exists.
    /// A missing default file yields built-in defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> RcaResult<Self> {
        let (path, explicit) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (default_config_path(), false),
        };

        let config = match path {
            Some(p) if explicit || p.exists() => {
                let raw = std::fs::read_to_string(&p)?;
                let cfg: RcaConfig = toml::from_str(&raw)?;
                tracing::debug!(path = %p.display(), "Config loaded");
                cfg
            }
            _ => RcaConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RcaResult<()> {
        self.pipeline.validate()?;
        if self.slack.page_size == 0 {
            return Err(RcaError::Config("slack.page_size must be > 0".into()));
        }
        if self.bedrock.region.trim().is_empty() && self.bedrock.endpoint.is_none() {
            return Err(RcaError::Config("bedrock.region or bedrock.endpoint is required".into()));
        }
        Ok(())
    }
}

/// `{config_dir}/slack-rca/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slack-rca").join("config.toml"))
}
