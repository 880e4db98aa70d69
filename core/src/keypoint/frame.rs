use crate::keypoint::Pose;
use crate::prelude::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Metadata for the frame currently under the playhead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FrameInfo {
    pub index: u64,
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
}

impl FrameInfo {
    pub fn new(index: u64, timestamp: f64, width: u32, height: u32) -> Self {
        Self {
            index,
            timestamp,
            width,
            height,
        }
    }

    /// A source whose metadata has not been decoded yet reports zero dimensions.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// External pose-estimation capability. The model is loaded once and reused.
pub trait PoseEstimator {
    fn is_ready(&self) -> bool;
    fn estimate(&mut self, frame: &FrameInfo) -> AnalysisResult<Vec<Pose>>;
}
