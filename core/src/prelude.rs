use serde::{Deserialize, Serialize};

/// Keypoints at or below this score are ignored by drawing, history and role picking.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Demo goal line sits near the left edge of the frame.
pub const DEFAULT_GOAL_LINE_X: f64 = 5.0;

pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Shared configuration for the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub confidence_threshold: f64,
    pub goal_line_x: f64,
    pub frame_rate: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            goal_line_x: DEFAULT_GOAL_LINE_X,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// Common error type for analysis sessions.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("pose estimator unavailable: {0}")]
    EstimatorUnavailable(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("pose estimation failed: {0}")]
    Estimation(String),
    #[error("command rejected: {0}")]
    InvalidCommand(String),
    #[error("store failure: {0}")]
    Store(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Speech(#[from] crate::speech::SpeechError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
