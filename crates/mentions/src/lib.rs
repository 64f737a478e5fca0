//! Mention webhook: parse a delivery, normalize each mention, answer it
//! directly or through an agent, and summarize the outcome.

pub mod agent;
pub mod asker;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod sink;
pub mod types;
pub mod webhook;

pub use {
    agent::{AgentRunner, ProcessAgentRunner},
    asker::{Asker, McpAsker},
    error::{Error, Result},
    normalize::normalize,
    parse::{flatten, parse_batches},
    pipeline::{Pipeline, Strategy},
    sink::ReplySink,
    types::{BatchSummary, Mention, MentionBatch, ProcessingResult},
    webhook::{build_router, serve},
};
