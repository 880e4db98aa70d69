use crate::keypoint::{FrameInfo, Keypoint, Pose, SKELETON_EDGES};
use crate::render::display_list::{DrawCommand, Point, Rgba, Surface};
use crate::rules::{GoalLineVerdict, OffsideOutcome, OffsideVerdict};
use serde::{Deserialize, Serialize};

const MARKER_RADIUS: f64 = 5.0;
const EDGE_WIDTH: f64 = 2.0;
const ROLE_RING_RADIUS: f64 = 12.0;
const BALL_RING_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeSlot {
    Offside,
    GoalLine,
}

/// Verdict indicator owned by the renderer; only its contents change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub slot: BadgeSlot,
    pub text: String,
    pub color: Rgba,
    pub visible: bool,
}

impl Badge {
    fn hidden(slot: BadgeSlot) -> Self {
        Self {
            slot,
            text: String::new(),
            color: Rgba::ONSIDE,
            visible: false,
        }
    }

    fn show(&mut self, text: &str, color: Rgba) {
        self.text = text.to_string();
        self.color = color;
        self.visible = true;
    }
}

/// Which rule overlays to draw on top of the skeleton this pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRequest<'a> {
    pub offside: Option<&'a OffsideVerdict>,
    pub goal_line_x: Option<f64>,
}

/// Draws frames, skeletons and rule overlays; owns the verdict badge slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayRenderer {
    confidence_threshold: f64,
    offside_badge: Badge,
    goal_line_badge: Badge,
}

impl OverlayRenderer {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            offside_badge: Badge::hidden(BadgeSlot::Offside),
            goal_line_badge: Badge::hidden(BadgeSlot::GoalLine),
        }
    }

    pub fn badge(&self, slot: BadgeSlot) -> &Badge {
        match slot {
            BadgeSlot::Offside => &self.offside_badge,
            BadgeSlot::GoalLine => &self.goal_line_badge,
        }
    }

    pub fn badges(&self) -> [&Badge; 2] {
        [&self.offside_badge, &self.goal_line_badge]
    }

    pub fn hide(&mut self, slot: BadgeSlot) {
        match slot {
            BadgeSlot::Offside => self.offside_badge.visible = false,
            BadgeSlot::GoalLine => self.goal_line_badge.visible = false,
        }
    }

    /// `None` means the rule did not run this pass and the badge keeps its state.
    pub fn apply_offside(&mut self, outcome: Option<&OffsideOutcome>) {
        match outcome {
            None => {}
            Some(OffsideOutcome::Indeterminate) => self.offside_badge.visible = false,
            Some(OffsideOutcome::Verdict(verdict)) => {
                let color = if verdict.offside {
                    Rgba::OFFSIDE
                } else {
                    Rgba::ONSIDE
                };
                self.offside_badge.show(verdict.label(), color);
            }
        }
    }

    pub fn apply_goal_line(&mut self, verdict: Option<&GoalLineVerdict>) {
        if let Some(verdict) = verdict {
            let color = if verdict.goal {
                Rgba::GOAL
            } else {
                Rgba::NO_GOAL
            };
            self.goal_line_badge.show(verdict.label(), color);
        }
    }

    /// Redraws the whole surface for one frame. Only `poses[0]` is drawn.
    pub fn render<S: Surface>(
        &self,
        surface: &mut S,
        frame: &FrameInfo,
        poses: &[Pose],
        request: OverlayRequest<'_>,
    ) {
        surface.draw(DrawCommand::Clear {
            width: frame.width,
            height: frame.height,
        });
        surface.draw(DrawCommand::Frame {
            index: frame.index,
            timestamp: frame.timestamp,
            width: frame.width,
            height: frame.height,
        });

        if let Some(pose) = poses.first() {
            for keypoint in pose
                .keypoints
                .iter()
                .filter(|kp| kp.is_confident(self.confidence_threshold))
            {
                surface.draw(DrawCommand::Marker {
                    center: point(keypoint),
                    radius: MARKER_RADIUS,
                    color: Rgba::GREEN,
                });
            }
            self.draw_skeleton(surface, pose);
        }

        if let Some(verdict) = request.offside {
            draw_offside(surface, verdict, frame.height as f64);
        }
        if let Some(line_x) = request.goal_line_x {
            surface.draw(DrawCommand::Line {
                from: Point::new(line_x, 0.0),
                to: Point::new(line_x, frame.height as f64),
                color: Rgba::GOLD,
                width: 5.0,
            });
        }
    }

    fn draw_skeleton<S: Surface>(&self, surface: &mut S, pose: &Pose) {
        for (start, end) in SKELETON_EDGES.iter() {
            let (Some(a), Some(b)) = (pose.get(*start), pose.get(*end)) else {
                continue;
            };
            if a.is_confident(self.confidence_threshold) && b.is_confident(self.confidence_threshold)
            {
                surface.draw(DrawCommand::Line {
                    from: point(a),
                    to: point(b),
                    color: Rgba::GREEN,
                    width: EDGE_WIDTH,
                });
            }
        }
    }
}

fn point(keypoint: &Keypoint) -> Point {
    Point::new(keypoint.x, keypoint.y)
}

fn draw_offside<S: Surface>(surface: &mut S, verdict: &OffsideVerdict, height: f64) {
    surface.draw(DrawCommand::Line {
        from: Point::new(verdict.defender.x, 0.0),
        to: Point::new(verdict.defender.x, height),
        color: Rgba::RED,
        width: 3.0,
    });
    surface.draw(DrawCommand::Ring {
        center: point(&verdict.attacker),
        radius: ROLE_RING_RADIUS,
        color: Rgba::GREEN,
        width: 4.0,
    });
    surface.draw(DrawCommand::Ring {
        center: point(&verdict.defender),
        radius: ROLE_RING_RADIUS,
        color: Rgba::RED,
        width: 4.0,
    });
    if let Some(ball) = &verdict.ball {
        surface.draw(DrawCommand::Ring {
            center: point(ball),
            radius: BALL_RING_RADIUS,
            color: Rgba::BLUE,
            width: 3.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::{Keypoint, KeypointName};
    use crate::render::DisplayList;

    fn frame() -> FrameInfo {
        FrameInfo::new(3, 0.1, 640, 480)
    }

    fn pose() -> Pose {
        Pose::new(vec![
            Keypoint::new(KeypointName::LeftShoulder, 100.0, 100.0, 0.9),
            Keypoint::new(KeypointName::LeftElbow, 120.0, 150.0, 0.8),
            Keypoint::new(KeypointName::LeftWrist, 130.0, 200.0, 0.2),
        ])
    }

    #[test]
    fn draws_only_confident_markers_and_edges() {
        let renderer = OverlayRenderer::new(0.3);
        let mut list = DisplayList::new();
        renderer.render(&mut list, &frame(), &[pose()], OverlayRequest::default());

        assert!(matches!(list.commands[0], DrawCommand::Clear { .. }));
        assert!(matches!(list.commands[1], DrawCommand::Frame { .. }));
        assert_eq!(list.count(|c| matches!(c, DrawCommand::Marker { .. })), 2);
        assert_eq!(list.count(|c| matches!(c, DrawCommand::Line { .. })), 1);
    }

    #[test]
    fn empty_pose_list_still_draws_the_frame() {
        let renderer = OverlayRenderer::new(0.3);
        let mut list = DisplayList::new();
        renderer.render(&mut list, &frame(), &[], OverlayRequest::default());
        assert_eq!(list.commands.len(), 2);
    }

    #[test]
    fn goal_line_is_drawn_without_a_pose() {
        let renderer = OverlayRenderer::new(0.3);
        let mut list = DisplayList::new();
        renderer.render(
            &mut list,
            &frame(),
            &[],
            OverlayRequest {
                offside: None,
                goal_line_x: Some(5.0),
            },
        );
        assert_eq!(list.commands.len(), 3);
        assert_eq!(
            list.commands[2],
            DrawCommand::Line {
                from: Point::new(5.0, 0.0),
                to: Point::new(5.0, 480.0),
                color: Rgba::GOLD,
                width: 5.0,
            }
        );
    }

    #[test]
    fn offside_overlay_adds_reference_line_and_rings() {
        let renderer = OverlayRenderer::new(0.3);
        let verdict = OffsideVerdict {
            attacker: Keypoint::new(KeypointName::Nose, 300.0, 50.0, 0.9),
            defender: Keypoint::new(KeypointName::LeftHip, 200.0, 60.0, 0.9),
            ball: None,
            offside: true,
        };
        let mut list = DisplayList::new();
        renderer.render(
            &mut list,
            &frame(),
            &[pose()],
            OverlayRequest {
                offside: Some(&verdict),
                goal_line_x: Some(5.0),
            },
        );
        assert_eq!(list.count(|c| matches!(c, DrawCommand::Ring { .. })), 2);
        assert!(list.commands.contains(&DrawCommand::Line {
            from: Point::new(200.0, 0.0),
            to: Point::new(200.0, 480.0),
            color: Rgba::RED,
            width: 3.0,
        }));
        assert!(list
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Line { color, .. } if *color == Rgba::GOLD)));
    }

    #[test]
    fn badge_visibility_follows_evaluator_output() {
        let mut renderer = OverlayRenderer::new(0.3);
        let verdict = OffsideVerdict {
            attacker: Keypoint::new(KeypointName::Nose, 300.0, 50.0, 0.9),
            defender: Keypoint::new(KeypointName::LeftHip, 200.0, 60.0, 0.9),
            ball: None,
            offside: false,
        };
        renderer.apply_offside(Some(&OffsideOutcome::Verdict(verdict)));
        assert!(renderer.badge(BadgeSlot::Offside).visible);
        assert_eq!(renderer.badge(BadgeSlot::Offside).text, "ONSIDE");

        renderer.apply_offside(None);
        assert!(renderer.badge(BadgeSlot::Offside).visible);

        renderer.apply_offside(Some(&OffsideOutcome::Indeterminate));
        assert!(!renderer.badge(BadgeSlot::Offside).visible);

        renderer.apply_goal_line(None);
        assert!(!renderer.badge(BadgeSlot::GoalLine).visible);
    }
}
