use crate::keypoint::Keypoint;
use crate::math::GeometryHelper;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Intensity given to every observation in the heat map.
pub const SAMPLE_INTENSITY: f32 = 50.0;

/// One confident keypoint observation on a 0..=100 grid relative to the frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MovementSample {
    pub x: u8,
    pub y: u8,
    pub intensity: f32,
}

/// Session-long record of where confident keypoints were seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementHistory {
    samples: Vec<MovementSample>,
}

impl MovementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalises against the native frame size, not the display size.
    pub fn record(&mut self, keypoints: &[Keypoint], frame_width: u32, frame_height: u32) {
        self.samples.extend(keypoints.iter().map(|kp| MovementSample {
            x: GeometryHelper::to_percent(kp.x, frame_width as f64),
            y: GeometryHelper::to_percent(kp.y, frame_height as f64),
            intensity: SAMPLE_INTENSITY,
        }));
    }

    pub fn samples(&self) -> &[MovementSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Accumulated intensity per cell; rows follow `y`, columns follow `x`.
    pub fn density(&self, bins: usize) -> Array2<f32> {
        let bins = bins.max(1);
        let mut grid = Array2::<f32>::zeros((bins, bins));
        for sample in &self.samples {
            let col = (sample.x as usize * bins / 100).min(bins - 1);
            let row = (sample.y as usize * bins / 100).min(bins - 1);
            grid[[row, col]] += sample.intensity;
        }
        grid
    }
}
