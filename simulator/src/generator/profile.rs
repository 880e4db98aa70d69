use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use varcore::keypoint::{FrameInfo, Keypoint, KeypointName, Pose, PoseEstimator};
use varcore::prelude::{AnalysisError, AnalysisResult};

/// Standing pose relative to the hip centre, in pixels for a 480px-high frame.
const BODY_TEMPLATE: [(KeypointName, f64, f64); 17] = [
    (KeypointName::Nose, 0.0, -170.0),
    (KeypointName::LeftEye, -6.0, -178.0),
    (KeypointName::RightEye, 6.0, -178.0),
    (KeypointName::LeftEar, -14.0, -172.0),
    (KeypointName::RightEar, 14.0, -172.0),
    (KeypointName::LeftShoulder, -30.0, -130.0),
    (KeypointName::RightShoulder, 30.0, -130.0),
    (KeypointName::LeftElbow, -45.0, -85.0),
    (KeypointName::RightElbow, 45.0, -85.0),
    (KeypointName::LeftWrist, -50.0, -40.0),
    (KeypointName::RightWrist, 50.0, -40.0),
    (KeypointName::LeftHip, -20.0, 0.0),
    (KeypointName::RightHip, 20.0, 0.0),
    (KeypointName::LeftKnee, -24.0, 55.0),
    (KeypointName::RightKnee, 24.0, 55.0),
    (KeypointName::LeftAnkle, -26.0, 110.0),
    (KeypointName::RightAnkle, 26.0, 110.0),
];

/// Configuration for the synthetic single-pose detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Seconds for the subject to cross the frame once.
    pub sweep_secs: f64,
    /// Pixel jitter applied to every keypoint.
    pub noise: f64,
    /// Lowest score the detector reports.
    pub min_score: f64,
    pub failure_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            sweep_secs: 4.0,
            noise: 3.0,
            min_score: 0.15,
            failure_rate: 0.0,
        }
    }
}

/// Stands in for the external pose model: one runner crossing the pitch.
pub struct SyntheticEstimator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl SyntheticEstimator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    fn build_pose(&mut self, frame: &FrameInfo) -> Pose {
        let width = frame.width as f64;
        let height = frame.height as f64;
        let scale = height / 480.0;
        let sweep = self.config.sweep_secs.max(f64::EPSILON);
        let progress = (frame.timestamp / sweep).fract();
        let center_x = width * (0.15 + 0.7 * progress);
        let center_y = height * 0.6;
        let stride = (frame.timestamp * std::f64::consts::TAU).sin() * 18.0;

        let noise = self.config.noise.abs();
        let min_score = self.config.min_score.clamp(0.0, 0.99);
        let keypoints = BODY_TEMPLATE
            .iter()
            .map(|&(name, dx, dy)| {
                let swing = match name {
                    KeypointName::LeftAnkle | KeypointName::LeftKnee => stride,
                    KeypointName::RightAnkle | KeypointName::RightKnee => -stride,
                    _ => 0.0,
                };
                let jitter_x = if noise > 0.0 {
                    self.rng.gen_range(-noise..=noise)
                } else {
                    0.0
                };
                let jitter_y = if noise > 0.0 {
                    self.rng.gen_range(-noise..=noise)
                } else {
                    0.0
                };
                let x = (center_x + (dx + swing) * scale + jitter_x).clamp(0.0, width);
                let y = (center_y + dy * scale + jitter_y).clamp(0.0, height);
                Keypoint::new(name, x, y, self.rng.gen_range(min_score..=1.0))
            })
            .collect();

        Pose::new(keypoints)
    }
}

impl PoseEstimator for SyntheticEstimator {
    fn is_ready(&self) -> bool {
        true
    }

    fn estimate(&mut self, frame: &FrameInfo) -> AnalysisResult<Vec<Pose>> {
        if !frame.has_dimensions() {
            return Err(AnalysisError::InvalidFrame(format!(
                "frame {} has no dimensions",
                frame.index
            )));
        }
        let failure_rate = self.config.failure_rate.clamp(0.0, 1.0);
        if failure_rate > 0.0 && self.rng.gen_bool(failure_rate) {
            return Err(AnalysisError::Estimation(format!(
                "detector dropped frame {}",
                frame.index
            )));
        }
        Ok(vec![self.build_pose(frame)])
    }
}
