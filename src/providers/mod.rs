pub mod twitter;


use async_trait::async_trait;

use crate::error::BotResult;
use crate::models::{FollowingIds, ReplyTarget, Tweet};

/// Everything the bot needs from the social network.
///
/// Timelines come back newest-first; `since_id` excludes that tweet and
/// everything older.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_following(&self) -> BotResult<FollowingIds>;

    async fn retrieve_tweets(&self, user_id: &str, since_id: Option<&str>) -> BotResult<Vec<Tweet>>;

    async fn retrieve_mentions(&self, since_id: Option<&str>) -> BotResult<Vec<Tweet>>;

    /// Posts `text`, as a reply when `reply_to` is given. Returns whether the
    /// network accepted it.
    async fn send_tweet(&self, text: &str, reply_to: Option<&ReplyTarget>) -> BotResult<bool>;
}
