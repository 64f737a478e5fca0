use std::time::Duration;

use {
    mentionbot_config::XConfig,
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize},
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{
    credentials::Credentials,
    error::{Error, Result},
    retry::{RetryPolicy, send_with_retry},
};

/// One reply to post under an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub in_reply_to: String,
    pub text: String,
}

impl ReplyRequest {
    pub fn new(in_reply_to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            in_reply_to: in_reply_to.into(),
            text: text.into(),
        }
    }
}

#[derive(Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
    reply: ReplySettings<'a>,
}

#[derive(Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: Option<CreatedTweet>,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Posts replies to `{base_url}/tweets`.
pub struct ReplyPoster {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl ReplyPoster {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/tweets", base_url.trim_end_matches('/')))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            credentials,
            retry,
        })
    }

    pub fn from_config(config: &XConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Credentials::from_config(config)?,
            RetryPolicy::from_config(&config.retry),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post one reply. A non-success status is returned as
    /// [`Error::Rejected`] and never retried.
    pub async fn post_reply(&self, reply: &ReplyRequest) -> Result<()> {
        let body = CreateTweet {
            text: &reply.text,
            reply: ReplySettings {
                in_reply_to_tweet_id: &reply.in_reply_to,
            },
        };

        debug!(
            in_reply_to = %reply.in_reply_to,
            chars = reply.text.chars().count(),
            scheme = self.credentials.scheme(),
            "posting reply"
        );

        let resp = send_with_retry(&self.retry, "post reply", || {
            let req = self.http.post(self.endpoint.clone()).json(&body);
            Ok(match &self.credentials {
                Credentials::Bearer(token) => req.bearer_auth(token.expose_secret()),
                Credentials::OAuth1(keys) => req.header(
                    reqwest::header::AUTHORIZATION,
                    keys.authorization("POST", &self.endpoint, &[])?,
                ),
            })
        })
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(in_reply_to = %reply.in_reply_to, %status, "reply rejected");
            return Err(Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match resp.json::<CreateTweetResponse>().await {
            Ok(CreateTweetResponse {
                data: Some(created),
            }) => info!(in_reply_to = %reply.in_reply_to, id = %created.id, "reply posted"),
            _ => info!(in_reply_to = %reply.in_reply_to, "reply posted"),
        }
        Ok(())
    }
}
