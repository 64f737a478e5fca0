//! Delegation to an external agent process that answers and posts by itself.

use std::{collections::HashMap, process::Stdio};

use {
    async_trait::async_trait,
    mentionbot_config::AgentConfig,
    tokio::process::Command,
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// Hands a question and the mention id to an agent that produces and posts
/// the reply itself. Only success or failure matters to the caller.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, question: &str, reply_to: &str) -> Result<String>;
}

/// Runs `<command> [args...] -q <question> [-reply-to <id>]`.
///
/// The child inherits this process's environment plus `env`. It is killed if
/// the caller stops waiting (deadline).
pub struct ProcessAgentRunner {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl ProcessAgentRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>, env: HashMap<String, String>) -> Self {
        Self {
            command: command.into(),
            args,
            env,
        }
    }

    /// `None` when no agent command is configured.
    pub fn from_config(config: &AgentConfig) -> Option<Self> {
        config
            .command()
            .map(|command| Self::new(command, config.args.clone(), config.env.clone()))
    }

    fn command_args(&self, question: &str, reply_to: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("-q".into());
        args.push(question.into());
        if !reply_to.is_empty() {
            args.push("-reply-to".into());
            args.push(reply_to.into());
        }
        args
    }
}

#[async_trait]
impl AgentRunner for ProcessAgentRunner {
    async fn run(&self, question: &str, reply_to: &str) -> Result<String> {
        let args = self.command_args(question, reply_to);
        info!(command = %self.command, reply_to, "running agent");

        let output = Command::new(&self.command)
            .args(&args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::agent(format!(
                    "agent error: failed to start '{}': {e}; stderr: ",
                    self.command
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            status = %output.status,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "agent done"
        );

        if !output.status.success() {
            return Err(Error::agent(format!(
                "agent error: {}; stderr: {}",
                output.status,
                stderr.trim_end()
            )));
        }
        Ok(stdout)
    }
}
