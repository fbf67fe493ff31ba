pub mod client;
pub mod fetcher;

pub use client::{FileFetcher, Page, SlackApi, SlackWebClient};
pub use fetcher::ConversationFetcher;
