pub mod clock;
pub mod decision;
pub mod frame_pipeline;
pub mod movement;
pub mod session;

pub use clock::VideoClock;
pub use decision::{Classification, DecisionPanel, Factor};
pub use frame_pipeline::{FrameAnalysis, FramePipeline, SkipReason, TickOutcome};
pub use movement::{MovementHistory, MovementSample};
pub use session::{CommandEffect, ModeFlags, ReviewCommand, SessionContext, SessionState};
