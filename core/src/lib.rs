//! Frame analysis core for VAR-style incident review.
//!
//! Pose estimation stays an external collaborator behind [`keypoint::PoseEstimator`].
//! This crate turns its output into filtered keypoints, rule verdicts, overlay
//! draw commands and an exportable review record, with all session state held
//! in an explicit [`pipeline::SessionContext`].

pub mod annotation;
pub mod history;
pub mod keypoint;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod render;
pub mod rules;
pub mod speech;
pub mod telemetry;

pub use prelude::{AnalysisConfig, AnalysisError, AnalysisResult};
