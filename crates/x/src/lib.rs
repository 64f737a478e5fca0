//! Reply posting for the social API (Twitter/X v2).
//!
//! Two credential schemes are supported: a user-context bearer token and
//! OAuth 1.0a request signing. Only transient network failures are retried;
//! a response with any status is final.

pub mod credentials;
pub mod error;
pub mod oauth1;
pub mod poster;
pub mod retry;
pub mod tool;

pub use {
    credentials::Credentials,
    error::{Error, Result},
    oauth1::OAuth1Keys,
    poster::{ReplyPoster, ReplyRequest},
    retry::RetryPolicy,
    tool::PostReplyTool,
};
