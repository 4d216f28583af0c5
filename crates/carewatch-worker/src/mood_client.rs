// HTTP client for the mood inference service
//
// The service exposes:
// - GET /mood        -> {"mood": "<label>"}
// - GET /video_feed  -> MJPEG stream for live viewing (not parsed here)

use async_trait::async_trait;
use carewatch_core::{MonitorError, MoodSample, MoodSource, Result};
use reqwest::Client;
use url::Url;

#[derive(Clone)]
pub struct HttpMoodSource {
    client: Client,
    base_url: Url,
}

impl HttpMoodSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let with_slash = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&with_slash).map_err(|e| {
            MonitorError::config(format!("Invalid mood service URL {}: {}", base_url, e))
        })?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| MonitorError::config(format!("Invalid endpoint {}: {}", path, e)))
    }

    pub fn mood_url(&self) -> Result<Url> {
        self.endpoint("mood")
    }

    /// URL of the live camera stream
    pub fn video_feed_url(&self) -> Result<Url> {
        self.endpoint("video_feed")
    }
}

#[async_trait]
impl MoodSource for HttpMoodSource {
    async fn fetch_mood(&self) -> Result<MoodSample> {
        let response = self
            .client
            .get(self.mood_url()?)
            .send()
            .await
            .map_err(|e| MonitorError::mood(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MonitorError::mood(format!(
                "Mood service returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<MoodSample>()
            .await
            .map_err(|e| MonitorError::mood(format!("Invalid mood payload: {}", e)))
    }
}
