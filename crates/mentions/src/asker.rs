//! Question answering through an MCP tool.

use {
    async_trait::async_trait,
    mentionbot_config::AskerConfig,
    mentionbot_mcp::{Arguments, UpstreamTarget, call_once},
    tracing::{debug, warn},
};

use crate::error::Result;

/// Placeholder in the prompt template replaced by the normalized question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Answers a normalized question.
#[async_trait]
pub trait Asker: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String>;
}

/// Asks one tool on an upstream MCP server, in a fresh session per question.
pub struct McpAsker {
    target: UpstreamTarget,
    tool: String,
    question_key: String,
    prompt_template: String,
}

impl McpAsker {
    pub fn new(target: UpstreamTarget, config: &AskerConfig) -> Self {
        Self {
            target,
            tool: config.tool.clone(),
            question_key: config.question_key.clone(),
            prompt_template: config.prompt_template.clone(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn prompt(&self, question: &str) -> String {
        self.prompt_template.replace(QUESTION_PLACEHOLDER, question)
    }
}

#[async_trait]
impl Asker for McpAsker {
    async fn ask(&self, question: &str) -> Result<String> {
        let mut arguments = Arguments::new();
        arguments.insert(self.question_key.clone(), self.prompt(question).into());

        let mut result = call_once(&self.target, &self.tool, arguments).await?;
        if result.is_error {
            // The tool's own text is the answer, even when it reports a failure.
            warn!(tool = %self.tool, is_error = true, "tool flagged its result as an error");
            result.is_error = false;
        }
        let skipped = result.non_text_count();
        if skipped > 0 {
            debug!(tool = %self.tool, skipped, "ignoring non-text content items");
        }
        Ok(result.into_text(&self.tool)?)
    }
}
