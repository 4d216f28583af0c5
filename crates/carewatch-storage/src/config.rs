// Firebase connection settings

use anyhow::{Context, Result};
use url::Url;

/// Configuration for the Firebase Realtime Database client
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database root, e.g. `https://example-default-rtdb.firebaseio.com/`
    pub database_url: Url,
    /// Database secret or ID token passed as the `auth` query parameter
    pub auth_token: Option<String>,
}

impl FirebaseConfig {
    pub fn new(database_url: &str) -> Result<Self> {
        Ok(Self {
            database_url: normalize_root(database_url)?,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("FIREBASE_DATABASE_URL")
            .context("FIREBASE_DATABASE_URL environment variable not set")?;
        let mut config = Self::new(&database_url)?;
        config.auth_token = std::env::var("FIREBASE_AUTH_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());
        Ok(config)
    }

    /// REST URL of a database path (`alerts` -> `{root}/alerts.json`)
    pub fn path_url(&self, path: &str) -> Result<Url> {
        let path = path.trim_matches('/');
        let mut url = self
            .database_url
            .join(&format!("{}.json", path))
            .with_context(|| format!("Invalid database path: {}", path))?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }
}

fn normalize_root(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid database URL: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_url() {
        let config = FirebaseConfig::new("https://home-rtdb.firebaseio.com").unwrap();
        assert_eq!(
            config.path_url("alerts/").unwrap().as_str(),
            "https://home-rtdb.firebaseio.com/alerts.json"
        );
        assert_eq!(
            config.path_url("house").unwrap().as_str(),
            "https://home-rtdb.firebaseio.com/house.json"
        );
    }

    #[test]
    fn test_path_url_with_auth() {
        let config = FirebaseConfig::new("https://home-rtdb.firebaseio.com/")
            .unwrap()
            .with_auth_token("s3cret");
        assert_eq!(
            config.path_url("alerts").unwrap().as_str(),
            "https://home-rtdb.firebaseio.com/alerts.json?auth=s3cret"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(FirebaseConfig::new("not a url").is_err());
    }
}
