//! `twitter.post_reply`: the reply poster exposed as an MCP tool, so an
//! external agent can post through the same credentials and retry rules.

use std::sync::Arc;

use {
    async_trait::async_trait,
    mentionbot_mcp::{Arguments, McpToolDef, ToolsCallResult},
    mentionbot_tool_proxy::ToolProvider,
    serde_json::json,
    tracing::warn,
};

use crate::poster::{ReplyPoster, ReplyRequest};

pub const TOOL_NAME: &str = "twitter.post_reply";

pub struct PostReplyTool {
    poster: Arc<ReplyPoster>,
    tools: Vec<McpToolDef>,
}

impl PostReplyTool {
    pub fn new(poster: Arc<ReplyPoster>) -> Self {
        let definition = McpToolDef {
            name: TOOL_NAME.into(),
            description: Some("Post a reply under a tweet using Twitter API v2".into()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "in_reply_to_tweet_id": {
                        "type": "string",
                        "description": "Tweet ID to reply to"
                    },
                    "text": {
                        "type": "string",
                        "description": "Reply text"
                    }
                },
                "required": ["in_reply_to_tweet_id", "text"]
            }),
            extra: serde_json::Map::new(),
        };
        Self {
            poster,
            tools: vec![definition],
        }
    }
}

fn required_string(arguments: &Arguments, key: &str) -> Result<String, String> {
    match arguments.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(serde_json::Value::String(_)) => Err(format!("argument '{key}' must not be empty")),
        Some(_) => Err(format!("argument '{key}' must be a string")),
        None => Err(format!("missing required argument '{key}'")),
    }
}

#[async_trait]
impl ToolProvider for PostReplyTool {
    fn tools(&self) -> &[McpToolDef] {
        &self.tools
    }

    async fn call(&self, _name: &str, arguments: Arguments) -> ToolsCallResult {
        let reply = match (
            required_string(&arguments, "in_reply_to_tweet_id"),
            required_string(&arguments, "text"),
        ) {
            (Ok(in_reply_to), Ok(text)) => ReplyRequest { in_reply_to, text },
            (Err(e), _) | (_, Err(e)) => return ToolsCallResult::error(e),
        };

        match self.poster.post_reply(&reply).await {
            Ok(()) => ToolsCallResult::text("ok"),
            Err(e) => {
                warn!(in_reply_to = %reply.in_reply_to, error = %e, "post_reply tool failed");
                ToolsCallResult::error(e.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use {super::*, crate::{Credentials, RetryPolicy}, secrecy::Secret};

    fn tool(base: &str) -> PostReplyTool {
        let poster = ReplyPoster::new(
            base,
            Credentials::Bearer(Secret::new("t".into())),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        PostReplyTool::new(Arc::new(poster))
    }

    fn args(value: serde_json::Value) -> Arguments {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn advertises_one_tool() {
        let tool = tool("http://127.0.0.1:1/2");
        assert!(tool.has_tool(TOOL_NAME));
        assert_eq!(
            tool.tools()[0].input_schema["required"],
            json!(["in_reply_to_tweet_id", "text"])
        );
    }

    #[tokio::test]
    async fn posts_and_returns_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/tweets")
            .with_status(201)
            .with_body(r#"{"data":{"id":"2"}}"#)
            .create_async()
            .await;

        let result = tool(&format!("{}/2", server.url()))
            .call(
                TOOL_NAME,
                args(json!({"in_reply_to_tweet_id": "1", "text": "hello"})),
            )
            .await;
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_argument_is_error_result() {
        let result = tool("http://127.0.0.1:1/2")
            .call(TOOL_NAME, args(json!({"text": "hello"})))
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.joined_text(),
            "missing required argument 'in_reply_to_tweet_id'"
        );
    }

    #[tokio::test]
    async fn non_string_argument_is_error_result() {
        let result = tool("http://127.0.0.1:1/2")
            .call(
                TOOL_NAME,
                args(json!({"in_reply_to_tweet_id": 1, "text": "hello"})),
            )
            .await;
        assert!(result.is_error);
        assert!(result.joined_text().contains("must be a string"));
    }

    #[tokio::test]
    async fn rejected_post_is_error_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/2/tweets")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let result = tool(&format!("{}/2", server.url()))
            .call(
                TOOL_NAME,
                args(json!({"in_reply_to_tweet_id": "1", "text": "hello"})),
            )
            .await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "post failed: status 403: forbidden");
    }
}
