use serde::{Deserialize, Serialize};

/// One inbound post that mentions the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mention {
    pub tweet_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Envelope delivered by the notifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionBatch {
    pub count: i64,
    pub mentions: Vec<Mention>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Outcome for one mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub tweet_id: String,
    pub posted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn posted(tweet_id: impl Into<String>) -> Self {
        Self {
            tweet_id: tweet_id.into(),
            posted: true,
            error: None,
        }
    }

    pub fn failed(tweet_id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            tweet_id: tweet_id.into(),
            posted: false,
            error: Some(error.to_string()),
        }
    }
}

/// Response body of the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub received: usize,
    pub processed: usize,
    pub results: Vec<ProcessingResult>,
}
