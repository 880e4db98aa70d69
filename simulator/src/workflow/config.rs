use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use varcore::prelude::{
    AnalysisConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_FRAME_RATE, DEFAULT_GOAL_LINE_X,
};

pub const DEFAULT_API_ENDPOINT: &str = "https://var-backend.onrender.com";

fn default_api_endpoint() -> String {
    std::env::var("API_ENDPOINT").unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub tick_interval_ms: u64,
    pub frame_rate: f64,
    pub confidence_threshold: f64,
    pub goal_line_x: f64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub clip_duration: f64,
    pub seed: u64,
    /// Probability that the synthetic detector fails a frame.
    pub failure_rate: f64,
    /// Pose classification service; classification is off when unset.
    pub classify_endpoint: Option<String>,
    pub api_endpoint: String,
    pub request_timeout_secs: u64,
    pub store_path: PathBuf,
    pub export_dir: PathBuf,
    pub bind_address: SocketAddr,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            frame_rate: DEFAULT_FRAME_RATE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            goal_line_x: DEFAULT_GOAL_LINE_X,
            frame_width: 640,
            frame_height: 480,
            clip_duration: 6.0,
            seed: 0,
            failure_rate: 0.0,
            classify_endpoint: None,
            api_endpoint: default_api_endpoint(),
            request_timeout_secs: 10,
            store_path: PathBuf::from("tools/data/local_store.json"),
            export_dir: PathBuf::from("tools/data"),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(tick_interval_ms: u64, clip_duration: f64, seed: u64) -> Self {
        Self {
            tick_interval_ms,
            clip_duration,
            seed,
            ..Default::default()
        }
    }

    pub fn to_analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            confidence_threshold: self.confidence_threshold,
            goal_line_x: self.goal_line_x,
            frame_rate: self.frame_rate,
        }
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }
}
