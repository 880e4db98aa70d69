use serde::{Deserialize, Serialize};
use std::fmt;

/// Body-part labels emitted by MoveNet-style single-pose detectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const ALL: [KeypointName; 17] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "left_eye",
            KeypointName::RightEye => "right_eye",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
        }
    }

    pub fn is_ankle(&self) -> bool {
        matches!(self, KeypointName::LeftAnkle | KeypointName::RightAnkle)
    }
}

impl fmt::Display for KeypointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairs joined by a skeleton edge when both ends pass the confidence filter.
pub const SKELETON_EDGES: [(KeypointName, KeypointName); 18] = [
    (KeypointName::Nose, KeypointName::LeftEye),
    (KeypointName::Nose, KeypointName::RightEye),
    (KeypointName::LeftEye, KeypointName::LeftEar),
    (KeypointName::RightEye, KeypointName::RightEar),
    (KeypointName::Nose, KeypointName::LeftShoulder),
    (KeypointName::Nose, KeypointName::RightShoulder),
    (KeypointName::LeftShoulder, KeypointName::LeftElbow),
    (KeypointName::RightShoulder, KeypointName::RightElbow),
    (KeypointName::LeftElbow, KeypointName::LeftWrist),
    (KeypointName::RightElbow, KeypointName::RightWrist),
    (KeypointName::LeftShoulder, KeypointName::LeftHip),
    (KeypointName::RightShoulder, KeypointName::RightHip),
    (KeypointName::LeftHip, KeypointName::LeftKnee),
    (KeypointName::RightHip, KeypointName::RightKnee),
    (KeypointName::LeftKnee, KeypointName::LeftAnkle),
    (KeypointName::RightKnee, KeypointName::RightAnkle),
    (KeypointName::LeftShoulder, KeypointName::RightShoulder),
    (KeypointName::LeftHip, KeypointName::RightHip),
];

/// A named, scored 2D landmark in native frame pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f64, y: f64, score: f64) -> Self {
        Self { name, x, y, score }
    }

    pub fn is_confident(&self, threshold: f64) -> bool {
        self.score > threshold
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Keypoints for one detected subject in one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Keypoints scoring strictly above `threshold`; the pose itself is left intact.
    pub fn confident(&self, threshold: f64) -> Vec<Keypoint> {
        confident_keypoints(&self.keypoints, threshold)
    }
}

pub fn confident_keypoints(keypoints: &[Keypoint], threshold: f64) -> Vec<Keypoint> {
    keypoints
        .iter()
        .filter(|kp| kp.is_confident(threshold))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_filter_is_strict() {
        let pose = Pose::new(vec![
            Keypoint::new(KeypointName::Nose, 1.0, 1.0, 0.3),
            Keypoint::new(KeypointName::LeftEye, 2.0, 2.0, 0.31),
            Keypoint::new(KeypointName::RightEye, 3.0, 3.0, 0.1),
        ]);

        let kept = pose.confident(0.3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, KeypointName::LeftEye);
        assert_eq!(pose.keypoints.len(), 3);
    }

    #[test]
    fn names_serialize_as_snake_case() {
        let kp = Keypoint::new(KeypointName::RightAnkle, 0.0, 0.0, 1.0);
        let json = serde_json::to_string(&kp).unwrap();
        assert!(json.contains("\"right_ankle\""));
        assert_eq!(KeypointName::RightAnkle.to_string(), "right_ankle");
    }
}
