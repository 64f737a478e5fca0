use {
    mentionbot_config::{AuthMode, XConfig},
    secrecy::{ExposeSecret, Secret},
};

use crate::{
    error::{Error, Result},
    oauth1::OAuth1Keys,
};

/// How outbound requests are authenticated.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// User-context OAuth 2.0 token sent as `Authorization: Bearer`.
    Bearer(Secret<String>),
    /// OAuth 1.0a keys; every request is signed.
    OAuth1(OAuth1Keys),
}

impl Credentials {
    pub fn from_config(config: &XConfig) -> Result<Self> {
        match config.auth_mode {
            AuthMode::Bearer => {
                let token = present_secret(config.bearer_token.as_ref(), "x.bearer_token")?;
                Ok(Self::Bearer(token))
            },
            AuthMode::OAuth1 => Ok(Self::OAuth1(OAuth1Keys {
                consumer_key: present(config.consumer_key.as_deref(), "x.consumer_key")?,
                consumer_secret: present_secret(
                    config.consumer_secret.as_ref(),
                    "x.consumer_secret",
                )?,
                access_token: present(config.access_token.as_deref(), "x.access_token")?,
                access_secret: present_secret(config.access_secret.as_ref(), "x.access_secret")?,
            })),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::OAuth1(_) => "oauth1",
        }
    }
}

fn present(value: Option<&str>, name: &'static str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(Error::MissingCredential(name))
}

fn present_secret(value: Option<&Secret<String>>, name: &'static str) -> Result<Secret<String>> {
    present(value.map(|s| s.expose_secret().as_str()), name).map(Secret::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_token() {
        let err = Credentials::from_config(&XConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingCredential("x.bearer_token")));
    }

    #[test]
    fn bearer_from_config() {
        let config = XConfig {
            bearer_token: Some(Secret::new("tok".into())),
            ..XConfig::default()
        };
        let creds = Credentials::from_config(&config).unwrap();
        assert_eq!(creds.scheme(), "bearer");
        assert!(!format!("{creds:?}").contains("tok"));
    }

    #[test]
    fn oauth1_reports_first_missing_key() {
        let config = XConfig {
            auth_mode: AuthMode::OAuth1,
            consumer_key: Some("ck".into()),
            consumer_secret: Some(Secret::new("cs".into())),
            access_token: Some("  ".into()),
            ..XConfig::default()
        };
        let err = Credentials::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::MissingCredential("x.access_token")));
    }

    #[test]
    fn oauth1_from_config() {
        let config = XConfig {
            auth_mode: AuthMode::OAuth1,
            consumer_key: Some("ck".into()),
            consumer_secret: Some(Secret::new("cs".into())),
            access_token: Some("at".into()),
            access_secret: Some(Secret::new("as".into())),
            ..XConfig::default()
        };
        let creds = Credentials::from_config(&config).unwrap();
        assert_eq!(creds.scheme(), "oauth1");
    }
}
