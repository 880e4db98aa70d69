use crate::keypoint::Keypoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GoalLineVerdict {
    pub ball: Keypoint,
    pub line_x: f64,
    pub goal: bool,
}

impl GoalLineVerdict {
    pub fn label(&self) -> &'static str {
        if self.goal {
            "GOAL"
        } else {
            "NO GOAL"
        }
    }
}

/// Checks a manually selected ball against the vertical goal line.
///
/// There is no automatic ball here: without a manual pick the rule is skipped.
pub fn evaluate(manual_ball: Option<&Keypoint>, line_x: f64) -> Option<GoalLineVerdict> {
    let ball = *manual_ball?;
    Some(GoalLineVerdict {
        ball,
        line_x,
        goal: ball.x < line_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::KeypointName;

    #[test]
    fn ball_past_line_is_a_goal() {
        let ball = Keypoint::new(KeypointName::LeftAnkle, 3.0, 200.0, 0.9);
        let verdict = evaluate(Some(&ball), 5.0).unwrap();
        assert!(verdict.goal);
        assert_eq!(verdict.label(), "GOAL");
    }

    #[test]
    fn ball_on_line_is_not_a_goal() {
        let ball = Keypoint::new(KeypointName::LeftAnkle, 5.0, 200.0, 0.9);
        assert!(!evaluate(Some(&ball), 5.0).unwrap().goal);
    }

    #[test]
    fn missing_ball_skips_the_rule() {
        assert!(evaluate(None, 5.0).is_none());
    }
}
