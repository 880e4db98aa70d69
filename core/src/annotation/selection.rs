use crate::keypoint::{Keypoint, Pose};
use crate::math::GeometryHelper;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a manually picked keypoint plays in the offside and goal-line rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRole {
    Attacker,
    Defender,
    Ball,
}

impl SelectionRole {
    fn label(&self) -> &'static str {
        match self {
            SelectionRole::Attacker => "Attacker",
            SelectionRole::Defender => "Defender",
            SelectionRole::Ball => "Ball",
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Click on the {} keypoint on the video.",
            self.label().to_lowercase()
        )
    }
}

impl fmt::Display for SelectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User overrides for the automatically picked roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnotationSelection {
    pub attacker: Option<Keypoint>,
    pub defender: Option<Keypoint>,
    pub ball: Option<Keypoint>,
}

impl AnnotationSelection {
    pub fn get(&self, role: SelectionRole) -> Option<&Keypoint> {
        match role {
            SelectionRole::Attacker => self.attacker.as_ref(),
            SelectionRole::Defender => self.defender.as_ref(),
            SelectionRole::Ball => self.ball.as_ref(),
        }
    }

    pub fn set(&mut self, role: SelectionRole, keypoint: Keypoint) {
        let slot = match role {
            SelectionRole::Attacker => &mut self.attacker,
            SelectionRole::Defender => &mut self.defender,
            SelectionRole::Ball => &mut self.ball,
        };
        *slot = Some(keypoint);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.attacker.is_none() && self.defender.is_none() && self.ball.is_none()
    }
}

/// Selection plus the role waiting for the next click.
#[derive(Debug, Clone, Default)]
pub struct AnnotationState {
    pub selection: AnnotationSelection,
    pending: Option<SelectionRole>,
    status: String,
}

impl AnnotationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<SelectionRole> {
        self.pending
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn begin(&mut self, role: SelectionRole) {
        self.pending = Some(role);
        self.status = role.prompt();
    }

    /// Assigns the keypoint nearest to `(x, y)` (frame pixels) to the pending role.
    ///
    /// Every keypoint of the pose is a candidate, regardless of score. Returns
    /// the picked keypoint, or `None` when nothing is pending or the pose is empty.
    pub fn pick(&mut self, pose: Option<&Pose>, x: f64, y: f64) -> Option<Keypoint> {
        let role = self.pending?;
        let pose = pose?;

        let nearest = pose
            .keypoints
            .iter()
            .min_by(|a, b| a.distance_to(x, y).total_cmp(&b.distance_to(x, y)))
            .copied()?;

        self.selection.set(role, nearest);
        self.status = format!("{} selected: {}", role, nearest.name);
        self.pending = None;
        Some(nearest)
    }

    /// Drops every override; used when offside review is switched off.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.pending = None;
        self.status.clear();
    }
}

/// Converts a click on a display surface of arbitrary size into native frame pixels.
pub fn surface_to_frame(
    click_x: f64,
    click_y: f64,
    surface_width: f64,
    surface_height: f64,
    frame_width: u32,
    frame_height: u32,
) -> (f64, f64) {
    (
        GeometryHelper::rescale(click_x, surface_width, frame_width as f64),
        GeometryHelper::rescale(click_y, surface_height, frame_height as f64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::KeypointName;

    fn pose() -> Pose {
        Pose::new(vec![
            Keypoint::new(KeypointName::Nose, 100.0, 100.0, 0.9),
            Keypoint::new(KeypointName::LeftAnkle, 300.0, 400.0, 0.2),
            Keypoint::new(KeypointName::RightAnkle, 500.0, 400.0, 0.8),
        ])
    }

    #[test]
    fn pick_assigns_nearest_keypoint_to_pending_role() {
        let mut state = AnnotationState::new();
        state.begin(SelectionRole::Ball);
        assert_eq!(state.status(), "Click on the ball keypoint on the video.");

        let picked = state.pick(Some(&pose()), 310.0, 390.0).unwrap();
        assert_eq!(picked.name, KeypointName::LeftAnkle);
        assert_eq!(state.selection.ball.unwrap().name, KeypointName::LeftAnkle);
        assert_eq!(state.status(), "Ball selected: left_ankle");
        assert!(state.pending().is_none());
    }

    #[test]
    fn pick_without_pending_role_is_ignored() {
        let mut state = AnnotationState::new();
        assert!(state.pick(Some(&pose()), 100.0, 100.0).is_none());
        assert!(state.selection.is_empty());
    }

    #[test]
    fn pick_without_pose_keeps_role_pending() {
        let mut state = AnnotationState::new();
        state.begin(SelectionRole::Attacker);
        assert!(state.pick(None, 0.0, 0.0).is_none());
        assert_eq!(state.pending(), Some(SelectionRole::Attacker));
    }

    #[test]
    fn surface_clicks_scale_to_native_frame() {
        let (x, y) = surface_to_frame(160.0, 120.0, 320.0, 240.0, 1280, 720);
        assert_eq!((x, y), (640.0, 360.0));
    }

    #[test]
    fn reset_clears_overrides() {
        let mut state = AnnotationState::new();
        state.begin(SelectionRole::Defender);
        state.pick(Some(&pose()), 500.0, 400.0);
        state.reset();
        assert!(state.selection.is_empty());
    }
}
