use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use slack_rca::bedrock::BedrockClient;
use slack_rca::cancel::CancelToken;
use slack_rca::config::RcaConfig;
use slack_rca::jira::{IssueTracker, JiraClient};
use slack_rca::slack::{FileFetcher, SlackWebClient};
use slack_rca::tracing_init::init_stderr_tracing;
use slack_rca::{Collaborators, SlackProcessor};

#[derive(Parser)]
#[command(
    name = "slack-rca",
    version,
    about = "Slack Channel Analyzer — RCA and learnings from an incident channel"
)]
struct Cli {
    /// Slack channel ID
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    channel: String,

    /// Bedrock model ID
    #[arg(long, env = "BEDROCK_MODEL_ID")]
    bedrock_model_id: String,

    /// Slack Bot Token
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    slack_token: String,

    /// Bedrock API key (bearer token)
    #[arg(long, env = "AWS_BEARER_TOKEN_BEDROCK", hide_env_values = true)]
    bedrock_api_key: Option<String>,

    /// Bedrock region (overrides the config file)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// JIRA Server URL (https://<company>.atlassian.net)
    #[arg(long, env = "JIRA_SERVER")]
    jira_server: Option<String>,

    /// JIRA Email / Username
    #[arg(long, env = "JIRA_USER")]
    jira_user: Option<String>,

    /// JIRA API Token
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    jira_token: Option<String>,

    /// TOML config file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON report with filtered action items instead of text
    #[arg(long)]
    structured: bool,

    /// Parallel map calls (1 = sequential)
    #[arg(long)]
    map_workers: Option<usize>,
}

fn main() -> Result<()> {
    init_stderr_tracing();
    let cli = Cli::parse();

    let mut config = RcaConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    config.bedrock.model_id = cli.bedrock_model_id.clone();
    if let Some(region) = &cli.region {
        config.bedrock.region = region.clone();
    }
    if let Some(workers) = cli.map_workers {
        config.pipeline.map_workers = workers;
    }
    config.validate().context("Invalid configuration")?;

    let cancel = CancelToken::new();
    cancel
        .register_signals()
        .context("Failed to register signal handlers")?;

    let slack = Arc::new(SlackWebClient::new(&cli.slack_token, &config.slack));
    let jira = JiraClient::new(
        cli.jira_server.as_deref(),
        cli.jira_user.as_deref(),
        cli.jira_token.as_deref(),
        config.slack.http_timeout_secs,
    );
    let issues: Option<Arc<dyn IssueTracker>> = if jira.is_enabled() {
        Some(Arc::new(jira))
    } else {
        None
    };
    let generator = BedrockClient::new(&config.bedrock, cli.bedrock_api_key.as_deref())
        .context("Failed to create Bedrock client")?;

    let processor = SlackProcessor::new(
        Collaborators {
            slack: slack.clone(),
            files: Some(slack as Arc<dyn FileFetcher>),
            issues,
            generator: Arc::new(generator),
        },
        &config,
        cancel,
    )?;

    if cli.structured {
        let report = processor
            .process_structured(&cli.channel)
            .context("Structured report failed")?;
        tracing::info!("=== RCA and Learnings (structured) ===");
        match report {
            Some(r) => println!("{}", r.to_json_pretty()?),
            None => println!("{{}}"),
        }
    } else {
        let summary = processor.process(&cli.channel).context("Report failed")?;
        tracing::info!("=== RCA and Learnings ===");
        println!("{}", summary);
    }

    Ok(())
}
