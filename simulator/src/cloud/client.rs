use anyhow::Context;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use varcore::keypoint::Keypoint;
use varcore::pipeline::Classification;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameData {
    pub keypoints: Vec<Keypoint>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameAnalysisResponse {
    pub incident_type: String,
    pub confidence: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentData {
    pub frame_data: Vec<FrameData>,
    pub incident_type: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub explanation: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveReceipt {
    pub status: String,
    pub filename: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    keypoints: &'a [Keypoint],
}

/// HTTP client for the pose classifier and the cloud analysis API.
///
/// Every call is best effort: failures are logged and reported as `None`.
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    classify_endpoint: Option<String>,
    api_endpoint: String,
}

impl CloudClient {
    pub fn new(
        classify_endpoint: Option<String>,
        api_endpoint: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            classify_endpoint,
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn can_classify(&self) -> bool {
        self.classify_endpoint.is_some()
    }

    pub async fn classify_pose(&self, keypoints: &[Keypoint]) -> Option<Classification> {
        let url = self.classify_endpoint.as_deref()?;
        self.post_json(url, &ClassifyRequest { keypoints }).await
    }

    pub async fn analyze_frame(&self, frame: &FrameData) -> Option<FrameAnalysisResponse> {
        let url = format!("{}/models/analyze", self.api_endpoint);
        self.post_json(&url, frame).await
    }

    pub async fn explain(&self, incident: &IncidentData) -> Option<Explanation> {
        let url = format!("{}/llm/explain", self.api_endpoint);
        self.post_json(&url, incident).await
    }

    pub async fn save_results(&self, results: &serde_json::Value) -> Option<SaveReceipt> {
        let url = format!("{}/db/save", self.api_endpoint);
        self.post_json(&url, results).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Option<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = match self.http.post(url).json(body).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("request to {} failed: {}", url, err);
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!("{} responded with {}", url, status);
            return None;
        }
        match response.json::<T>().await {
            Ok(parsed) => {
                debug!("{} responded with {}", url, status);
                Some(parsed)
            }
            Err(err) => {
                warn!("unreadable response from {}: {}", url, err);
                None
            }
        }
    }
}
