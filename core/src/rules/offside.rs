use crate::annotation::AnnotationSelection;
use crate::keypoint::Keypoint;
use serde::{Deserialize, Serialize};

/// Roles used for an offside call and the resulting outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OffsideVerdict {
    pub attacker: Keypoint,
    pub defender: Keypoint,
    pub ball: Option<Keypoint>,
    pub offside: bool,
}

impl OffsideVerdict {
    pub fn label(&self) -> &'static str {
        if self.offside {
            "OFFSIDE"
        } else {
            "ONSIDE"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsideOutcome {
    Verdict(OffsideVerdict),
    /// Not enough confident keypoints to resolve attacker and defender.
    Indeterminate,
}

impl OffsideOutcome {
    pub fn verdict(&self) -> Option<&OffsideVerdict> {
        match self {
            OffsideOutcome::Verdict(verdict) => Some(verdict),
            OffsideOutcome::Indeterminate => None,
        }
    }
}

/// Resolves attacker, defender and ball, then applies the horizontal-ordering rule.
///
/// Manual selections win per role. Missing attacker or defender roles come from
/// the confident keypoints furthest right, in that order, skipping any keypoint
/// already picked by hand so one keypoint never fills both roles. The ball falls back
/// to a confident ankle and then to the attacker, but only when an automatic role
/// was needed; with both players picked by hand and no ball, the ball line is the
/// defender's.
pub fn evaluate(confident: &[Keypoint], selection: &AnnotationSelection) -> OffsideOutcome {
    let needs_auto = selection.attacker.is_none() || selection.defender.is_none();

    let (attacker, defender, auto_ball) = if needs_auto {
        let manual: Vec<_> = [selection.attacker, selection.defender]
            .iter()
            .flatten()
            .map(|kp| kp.name)
            .collect();
        let mut ordered: Vec<Keypoint> = confident
            .iter()
            .filter(|kp| !manual.contains(&kp.name))
            .copied()
            .collect();
        ordered.sort_by(|a, b| b.x.total_cmp(&a.x));
        let missing = 2 - manual.len();
        if ordered.len() < missing {
            return OffsideOutcome::Indeterminate;
        }
        let mut auto = ordered.into_iter();
        let (Some(attacker), Some(defender)) = (
            selection.attacker.or_else(|| auto.next()),
            selection.defender.or_else(|| auto.next()),
        ) else {
            return OffsideOutcome::Indeterminate;
        };
        let ankle = confident.iter().find(|kp| kp.name.is_ankle()).copied();
        (attacker, defender, Some(ankle.unwrap_or(attacker)))
    } else {
        match (selection.attacker, selection.defender) {
            (Some(attacker), Some(defender)) => (attacker, defender, None),
            _ => return OffsideOutcome::Indeterminate,
        }
    };

    let ball = selection.ball.or(auto_ball);
    let ball_x = ball.map(|kp| kp.x).unwrap_or(defender.x);
    let offside = attacker.x > defender.x && attacker.x > ball_x;

    OffsideOutcome::Verdict(OffsideVerdict {
        attacker,
        defender,
        ball,
        offside,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::KeypointName;

    fn kp(name: KeypointName, x: f64) -> Keypoint {
        Keypoint::new(name, x, 100.0, 0.9)
    }

    #[test]
    fn attacker_beyond_defender_and_ball_is_offside() {
        let selection = AnnotationSelection {
            attacker: Some(kp(KeypointName::Nose, 80.0)),
            defender: Some(kp(KeypointName::LeftHip, 50.0)),
            ball: Some(kp(KeypointName::LeftAnkle, 40.0)),
        };
        let outcome = evaluate(&[], &selection);
        assert!(outcome.verdict().unwrap().offside);
        assert_eq!(outcome.verdict().unwrap().label(), "OFFSIDE");
    }

    #[test]
    fn level_with_defender_is_onside() {
        let selection = AnnotationSelection {
            attacker: Some(kp(KeypointName::Nose, 50.0)),
            defender: Some(kp(KeypointName::LeftHip, 50.0)),
            ball: None,
        };
        let outcome = evaluate(&[], &selection);
        let verdict = outcome.verdict().unwrap();
        assert!(!verdict.offside);
        assert!(verdict.ball.is_none());
    }

    #[test]
    fn fewer_than_two_confident_keypoints_is_indeterminate() {
        let outcome = evaluate(
            &[kp(KeypointName::Nose, 10.0)],
            &AnnotationSelection::default(),
        );
        assert_eq!(outcome, OffsideOutcome::Indeterminate);
    }

    #[test]
    fn automatic_roles_use_rightmost_keypoints_and_ankle_ball() {
        let confident = [
            kp(KeypointName::LeftShoulder, 120.0),
            kp(KeypointName::RightAnkle, 90.0),
            kp(KeypointName::Nose, 300.0),
            kp(KeypointName::LeftWrist, 250.0),
        ];
        let outcome = evaluate(&confident, &AnnotationSelection::default());
        let verdict = outcome.verdict().unwrap();
        assert_eq!(verdict.attacker.name, KeypointName::Nose);
        assert_eq!(verdict.defender.name, KeypointName::LeftWrist);
        assert_eq!(verdict.ball.unwrap().name, KeypointName::RightAnkle);
        assert!(verdict.offside);
    }

    #[test]
    fn without_ankle_the_ball_is_the_attacker() {
        let confident = [kp(KeypointName::Nose, 300.0), kp(KeypointName::LeftWrist, 250.0)];
        let outcome = evaluate(&confident, &AnnotationSelection::default());
        let verdict = outcome.verdict().unwrap();
        assert_eq!(verdict.ball.unwrap().name, KeypointName::Nose);
        assert!(!verdict.offside);
    }

    #[test]
    fn manual_role_overrides_only_its_own_slot() {
        let confident = [kp(KeypointName::Nose, 300.0), kp(KeypointName::LeftWrist, 250.0)];
        let selection = AnnotationSelection {
            attacker: None,
            defender: Some(kp(KeypointName::RightHip, 20.0)),
            ball: Some(kp(KeypointName::RightAnkle, 10.0)),
        };
        let verdict = *evaluate(&confident, &selection).verdict().unwrap();
        assert_eq!(verdict.attacker.name, KeypointName::Nose);
        assert_eq!(verdict.defender.name, KeypointName::RightHip);
        assert!(verdict.offside);
    }

    #[test]
    fn manual_role_is_not_reused_for_the_missing_one() {
        let confident = [kp(KeypointName::Nose, 300.0), kp(KeypointName::LeftWrist, 250.0)];
        let selection = AnnotationSelection {
            attacker: None,
            defender: Some(kp(KeypointName::Nose, 300.0)),
            ball: None,
        };
        let verdict = *evaluate(&confident, &selection).verdict().unwrap();
        assert_eq!(verdict.attacker.name, KeypointName::LeftWrist);
        assert_eq!(verdict.defender.name, KeypointName::Nose);
        assert!(!verdict.offside);

        let lone = AnnotationSelection {
            attacker: Some(kp(KeypointName::LeftWrist, 250.0)),
            defender: None,
            ball: None,
        };
        assert_eq!(
            evaluate(&[kp(KeypointName::LeftWrist, 250.0)], &lone),
            OffsideOutcome::Indeterminate
        );
    }
}
