#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered with a non-success status. Never retried.
    #[error("post failed: status {status}{}", body_suffix(.body))]
    Rejected { status: u16, body: String },
    /// Connection or timeout failure that outlasted the retry budget.
    #[error("post request failed after {attempts} attempt(s): {source}")]
    Network {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to sign request: {0}")]
    Signing(String),
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
