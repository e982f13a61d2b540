use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_oauth1::OAuthClientProvider;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use super::Transport;
use crate::config::TwitterCredentials;
use crate::error::{BotError, BotResult};
use crate::models::{FollowingIds, ReplyTarget, Tweet};

const API_BASE: &str = "https://api.twitter.com/1.1";
const TIMELINE_COUNT: &str = "200";

pub struct Twitter {
    credentials: TwitterCredentials,
    client: reqwest::Client,
}

impl Twitter {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Twitter {
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn secrets(&self) -> reqwest_oauth1::Secrets<'_> {
        reqwest_oauth1::Secrets::new(
            self.credentials.consumer_key.as_str(),
            self.credentials.consumer_secret.as_str(),
        )
        .token(
            self.credentials.access_token.as_str(),
            self.credentials.access_token_secret.as_str(),
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> BotResult<T> {
        let url = format!("{}/{}.json", API_BASE, endpoint);
        debug!("Making request to: {}", url);

        let response = self
            .client
            .clone()
            .oauth1(self.secrets())
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BotError::Retrieval(format!("{}: {}", endpoint, e)))?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(endpoint, status, &body)
    }

    async fn post(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> BotResult<serde_json::Value> {
        let url = format!("{}/{}.json", API_BASE, endpoint);
        debug!("Posting to: {}", url);

        let response = self
            .client
            .clone()
            .oauth1(self.secrets())
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| BotError::Retrieval(format!("{}: {}", endpoint, e)))?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(endpoint, status, &body)
    }
}

pub(crate) fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> BotResult<T> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BotError::RateLimited {
            endpoint: endpoint.to_string(),
        });
    }

    if !status.is_success() {
        error!("{} failed with status {}: {}", endpoint, status, body);
        return Err(BotError::Api {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| {
        error!("Error parsing {} response: {}", endpoint, e);
        BotError::Serialization(e)
    })
}

/// Extended mode returns the untruncated text as `full_text`.
pub(crate) fn timeline_params(
    user_id: Option<&str>,
    since_id: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("count", TIMELINE_COUNT.to_string()),
        ("include_rts", "true".to_string()),
        ("tweet_mode", "extended".to_string()),
    ];
    if let Some(user_id) = user_id {
        params.push(("user_id", user_id.to_string()));
    }
    if let Some(since_id) = since_id {
        params.push(("since_id", since_id.to_string()));
    }
    params
}

pub(crate) fn status_params(
    text: &str,
    reply_to: Option<&ReplyTarget>,
) -> Vec<(&'static str, String)> {
    match reply_to {
        Some(target) => vec![
            ("status", format!("@{} {}", target.screen_name, text)),
            ("in_reply_to_status_id", target.status_id.clone()),
        ],
        None => vec![("status", text.to_string())],
    }
}

#[async_trait]
impl Transport for Twitter {
    async fn get_following(&self) -> BotResult<FollowingIds> {
        self.get("friends/ids", vec![("stringify_ids", "true".to_string())])
            .await
    }

    async fn retrieve_tweets(
        &self,
        user_id: &str,
        since_id: Option<&str>,
    ) -> BotResult<Vec<Tweet>> {
        self.get(
            "statuses/user_timeline",
            timeline_params(Some(user_id), since_id),
        )
        .await
    }

    async fn retrieve_mentions(&self, since_id: Option<&str>) -> BotResult<Vec<Tweet>> {
        self.get("statuses/mentions_timeline", timeline_params(None, since_id))
            .await
    }

    async fn send_tweet(&self, text: &str, reply_to: Option<&ReplyTarget>) -> BotResult<bool> {
        let posted = self
            .post("statuses/update", status_params(text, reply_to))
            .await?;

        match posted.get("id_str").and_then(|id| id.as_str()) {
            Some(id) => {
                info!("Tweet posted: {} ({})", text, id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
