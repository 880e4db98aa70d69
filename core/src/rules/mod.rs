pub mod goal_line;
pub mod offside;
pub mod severity;

pub use goal_line::GoalLineVerdict;
pub use offside::{OffsideOutcome, OffsideVerdict};
pub use severity::{Severity, SeverityAssessment, FACTOR_LABELS};
