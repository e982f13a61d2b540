use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BotError, BotResult};

const DEFAULT_DATA_DIR: &str = "./storage";
const DEFAULT_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub credentials: TwitterCredentials,
    pub data_dir: PathBuf,
    pub update_interval: Duration,
    /// When false, generated tweets are logged instead of posted.
    pub tweet_mode: bool,
    pub debug: bool,
}

impl BotConfig {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| BotError::Config(format!("{} not set", key)))
        };

        let credentials = TwitterCredentials {
            consumer_key: require("TWITTER_CONSUMER_KEY")?,
            consumer_secret: require("TWITTER_CONSUMER_SECRET")?,
            access_token: require("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: require("TWITTER_ACCESS_TOKEN_SECRET")?,
        };

        let data_dir = lookup("BOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let minutes: u64 = parse_or(
            &lookup,
            "BOT_UPDATE_INTERVAL_MINUTES",
            DEFAULT_INTERVAL_MINUTES,
        )?;
        if minutes == 0 {
            return Err(BotError::Config(
                "BOT_UPDATE_INTERVAL_MINUTES must be at least 1".to_string(),
            ));
        }

        Ok(BotConfig {
            credentials,
            data_dir,
            update_interval: Duration::from_secs(minutes * 60),
            tweet_mode: parse_or(&lookup, "BOT_TWEET_MODE", true)?,
            debug: parse_or(&lookup, "BOT_DEBUG", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> BotResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{} has an invalid value: {}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 4] = [
        ("TWITTER_CONSUMER_KEY", "ck"),
        ("TWITTER_CONSUMER_SECRET", "cs"),
        ("TWITTER_ACCESS_TOKEN", "at"),
        ("TWITTER_ACCESS_TOKEN_SECRET", "ats"),
    ];

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&CREDENTIALS)).unwrap();
        assert_eq!(config.credentials.consumer_key, "ck");
        assert_eq!(config.data_dir, PathBuf::from("./storage"));
        assert_eq!(config.update_interval, Duration::from_secs(15 * 60));
        assert!(config.tweet_mode);
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.extend([
            ("BOT_DATA_DIR", "/tmp/bot"),
            ("BOT_UPDATE_INTERVAL_MINUTES", "5"),
            ("BOT_TWEET_MODE", "false"),
            ("BOT_DEBUG", "true"),
        ]);
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/bot"));
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert!(!config.tweet_mode);
        assert!(config.debug);
    }

    #[test]
    fn test_missing_credentials() {
        let err = BotConfig::from_lookup(lookup_from(&CREDENTIALS[..3])).unwrap_err();
        assert!(err.to_string().contains("TWITTER_ACCESS_TOKEN_SECRET"));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("BOT_UPDATE_INTERVAL_MINUTES", "soon"));
        assert!(matches!(
            BotConfig::from_lookup(lookup_from(&pairs)),
            Err(BotError::Config(_))
        ));

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("BOT_UPDATE_INTERVAL_MINUTES", "0"));
        assert!(BotConfig::from_lookup(lookup_from(&pairs)).is_err());
    }
}
