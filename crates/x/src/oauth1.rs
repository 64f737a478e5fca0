//! OAuth 1.0a request signing (HMAC-SHA1), as used by the v2 write endpoints
//! with user-context keys.
//!
//! Query parameters take part in the signature. JSON bodies do not, so
//! callers pass form parameters explicitly when there are any.

use std::time::{SystemTime, UNIX_EPOCH};

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    hmac::{Hmac, Mac},
    rand::{Rng, distr::Alphanumeric},
    secrecy::{ExposeSecret, Secret},
    sha1::Sha1,
    url::Url,
};

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// Consumer and access-token key pairs for one user context.
#[derive(Debug, Clone)]
pub struct OAuth1Keys {
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    pub access_token: String,
    pub access_secret: Secret<String>,
}

impl OAuth1Keys {
    /// Build the `Authorization` header for one request, with a fresh nonce
    /// and timestamp.
    pub fn authorization(&self, method: &str, url: &Url, form: &[(&str, &str)]) -> Result<String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Signing(format!("system clock before unix epoch: {e}")))?
            .as_secs()
            .to_string();
        self.authorization_with(method, url, form, &nonce(), &timestamp)
    }

    /// Deterministic variant of [`authorization`](Self::authorization).
    pub fn authorization_with(
        &self,
        method: &str,
        url: &Url,
        form: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", VERSION),
        ];

        let base = signature_base(method, url, form, &oauth_params);
        let signature = self.sign(&base)?;

        let mut fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", encode(v)))
            .collect();
        fields.push(format!("oauth_signature=\"{}\"", encode(&signature)));
        fields.sort();
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn sign(&self, base: &str) -> Result<String> {
        let key = format!(
            "{}&{}",
            encode(self.consumer_secret.expose_secret()),
            encode(self.access_secret.expose_secret())
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| Error::Signing(e.to_string()))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&enc(base_url)&enc(sorted params)`.
fn signature_base(
    method: &str,
    url: &Url,
    form: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(
            form.iter()
                .chain(oauth_params.iter())
                .map(|(k, v)| (encode(k), encode(v))),
        )
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&param_string)
    )
}

/// Scheme, host, non-default port and path; no query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
