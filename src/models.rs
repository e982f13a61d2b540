use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Persisted bot state. `None` ids mean "never seen".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotState {
    #[serde(default, deserialize_with = "deserialize_tracked_users")]
    pub tracked_users: BTreeMap<String, Option<String>>,
    #[serde(default, deserialize_with = "deserialize_since_id")]
    pub last_mention: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TweetUser {
    #[serde(default)]
    pub id_str: String,
    #[serde(default)]
    pub screen_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tweet {
    pub id_str: String,
    /// Extended-mode payloads carry the body as `full_text`.
    #[serde(default, alias = "full_text")]
    pub text: String,
    pub user: TweetUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Value>,
}

impl Tweet {
    pub fn is_retweet(&self) -> bool {
        match &self.retweeted_status {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

/// Response of the follow-list endpoint.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct FollowingIds {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Where a reply goes: threaded under `status_id`, addressed to `@screen_name`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyTarget {
    pub status_id: String,
    pub screen_name: String,
}

impl From<&Tweet> for ReplyTarget {
    fn from(tweet: &Tweet) -> Self {
        ReplyTarget {
            status_id: tweet.id_str.clone(),
            screen_name: tweet.user.screen_name.clone(),
        }
    }
}

/// One "next word" seen after a word pair. `time` is `YYYYMMDDhhmm`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Observation {
    pub word: String,
    pub time: u64,
}

pub type Corpus = HashMap<String, Vec<Observation>>;

// Older state files store "never seen" as the integer 0.
fn since_id_from_value(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) if s.is_empty() || s == "0" => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(format!("invalid tweet id: {}", other)),
    }
}

fn deserialize_since_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    since_id_from_value(value).map_err(de::Error::custom)
}

fn deserialize_tracked_users<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(user_id, value)| since_id_from_value(value).map(|id| (user_id, id)))
        .collect::<Result<_, _>>()
        .map_err(de::Error::custom)
}

#[cfg(test)]
impl Tweet {
    pub fn new(user_id: &str, id: &str, text: &str) -> Self {
        Tweet {
            id_str: id.to_string(),
            text: text.to_string(),
            user: TweetUser {
                id_str: user_id.to_string(),
                screen_name: format!("user{}", user_id),
            },
            retweeted_status: None,
        }
    }

    pub fn mention(id: &str, screen_name: &str) -> Self {
        Tweet {
            id_str: id.to_string(),
            text: String::new(),
            user: TweetUser {
                id_str: String::new(),
                screen_name: screen_name.to_string(),
            },
            retweeted_status: None,
        }
    }

    pub fn retweeted(mut self) -> Self {
        self.retweeted_status = Some(Value::Bool(true));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_reads_legacy_sentinels() {
        let json = r#"{"trackedUsers":{"001":"5001","002":0,"003":null},"lastMention":5003}"#;
        let state: BotState = serde_json::from_str(json).unwrap();

        assert_eq!(state.tracked_users.get("001"), Some(&Some("5001".to_string())));
        assert_eq!(state.tracked_users.get("002"), Some(&None));
        assert_eq!(state.tracked_users.get("003"), Some(&None));
        assert_eq!(state.last_mention, Some("5003".to_string()));
    }

    #[test]
    fn test_state_defaults_when_fields_missing() {
        let state: BotState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, BotState::default());
    }

    #[test]
    fn test_state_rejects_bad_ids() {
        let json = r#"{"trackedUsers":{},"lastMention":[1]}"#;
        assert!(serde_json::from_str::<BotState>(json).is_err());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let mut state = BotState::default();
        state.tracked_users.insert("001".to_string(), None);
        state.last_mention = Some("42".to_string());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["trackedUsers"]["001"], Value::Null);
        assert_eq!(json["lastMention"], "42");
    }

    #[test]
    fn test_retweet_flag() {
        let tweet = Tweet::new("001", "5001", "Test one.");
        assert!(!tweet.is_retweet());
        assert!(tweet.clone().retweeted().is_retweet());

        let explicit_false = Tweet {
            retweeted_status: Some(Value::Bool(false)),
            ..tweet
        };
        assert!(!explicit_false.is_retweet());
    }

    #[test]
    fn test_reply_target_from_mention() {
        let mention = Tweet::mention("5001", "testuser");
        let target = ReplyTarget::from(&mention);
        assert_eq!(target.status_id, "5001");
        assert_eq!(target.screen_name, "testuser");
    }
}
