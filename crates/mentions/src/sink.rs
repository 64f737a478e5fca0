use {
    async_trait::async_trait,
    mentionbot_x::{ReplyPoster, ReplyRequest},
};

use crate::error::Result;

/// Delivers one reply.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn post_reply(&self, reply: &ReplyRequest) -> Result<()>;
}

#[async_trait]
impl ReplySink for ReplyPoster {
    async fn post_reply(&self, reply: &ReplyRequest) -> Result<()> {
        Ok(ReplyPoster::post_reply(self, reply).await?)
    }
}
