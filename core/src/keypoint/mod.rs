pub mod frame;
pub mod pose;

pub use frame::{FrameInfo, PoseEstimator};
pub use pose::{confident_keypoints, Keypoint, KeypointName, Pose, SKELETON_EDGES};
