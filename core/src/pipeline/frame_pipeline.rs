use crate::keypoint::{FrameInfo, Keypoint, PoseEstimator};
use crate::pipeline::session::{SessionContext, SessionState};
use crate::render::OverlayRequest;
use crate::rules::{goal_line, offside, GoalLineVerdict, OffsideOutcome};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EstimatorUnavailable,
    NoSource,
    NoFrameDimensions,
}

/// Result of one analysis pass over the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub frame: FrameInfo,
    pub generation: u64,
    /// Every keypoint of the primary pose, for the classification backend.
    pub keypoints: Option<Vec<Keypoint>>,
    pub confident_count: usize,
    pub offside: Option<OffsideOutcome>,
    pub goal_line: Option<GoalLineVerdict>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    /// The estimator failed; logged and counted, the next tick proceeds normally.
    Failed,
    Analyzed(FrameAnalysis),
}

/// One timer tick: estimate, filter, record movement, evaluate rules, render.
pub struct FramePipeline {
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl FramePipeline {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            logger: LogManager::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn tick<E: PoseEstimator + ?Sized>(
        &self,
        session: &mut SessionContext,
        estimator: &mut E,
        force_overlay: bool,
    ) -> TickOutcome {
        if !estimator.is_ready() {
            return self.skip(SkipReason::EstimatorUnavailable);
        }
        if session.state == SessionState::Idle {
            return self.skip(SkipReason::NoSource);
        }
        let frame = session.clock.frame();
        if !frame.has_dimensions() {
            return self.skip(SkipReason::NoFrameDimensions);
        }

        let poses = match estimator.estimate(&frame) {
            Ok(poses) => poses,
            Err(err) => {
                self.logger
                    .warn(&format!("pose estimation failed on frame {}: {}", frame.index, err));
                self.metrics.record_error();
                return TickOutcome::Failed;
            }
        };

        let threshold = session.config.confidence_threshold;
        let primary = poses.first();
        let keypoints = primary.map(|pose| pose.keypoints.clone());
        let confident = primary
            .map(|pose| pose.confident(threshold))
            .unwrap_or_default();
        session
            .movement
            .record(&confident, frame.width, frame.height);

        let review_frame = session.clock.paused || force_overlay;
        // No pose leaves `confident` empty, which the evaluator reports as indeterminate.
        let offside_outcome = if session.modes.offside && review_frame {
            Some(offside::evaluate(&confident, &session.annotation.selection))
        } else {
            None
        };
        let goal_line_active = session.modes.goal_line && review_frame;
        let goal_line_verdict = if goal_line_active {
            goal_line::evaluate(
                session.annotation.selection.ball.as_ref(),
                session.config.goal_line_x,
            )
        } else {
            None
        };

        if let Some(outcome) = &offside_outcome {
            session.last_offside = outcome.verdict().copied();
        }
        session.renderer.apply_offside(offside_outcome.as_ref());
        session.renderer.apply_goal_line(goal_line_verdict.as_ref());

        let request = OverlayRequest {
            offside: offside_outcome.as_ref().and_then(|o| o.verdict()),
            goal_line_x: goal_line_active.then_some(session.config.goal_line_x),
        };
        session.last_poses = poses;
        session.last_frame = Some(frame);
        session
            .renderer
            .render(&mut session.display, &frame, &session.last_poses, request);

        self.metrics.record_processed();
        self.logger.record(&format!(
            "frame {} analysed: {} confident keypoints, offside {:?}, goal line {:?}",
            frame.index,
            confident.len(),
            offside_outcome.as_ref().and_then(|o| o.verdict()).map(|v| v.offside),
            goal_line_verdict.as_ref().map(|v| v.goal),
        ));

        TickOutcome::Analyzed(FrameAnalysis {
            frame,
            generation: session.generation(),
            keypoints,
            confident_count: confident.len(),
            offside: offside_outcome,
            goal_line: goal_line_verdict,
        })
    }

    fn skip(&self, reason: SkipReason) -> TickOutcome {
        self.logger.debug(&format!("tick skipped: {:?}", reason));
        self.metrics.record_skipped();
        TickOutcome::Skipped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::{Keypoint, KeypointName, Pose};
    use crate::pipeline::session::ReviewCommand;
    use crate::prelude::{AnalysisConfig, AnalysisError, AnalysisResult};
    use crate::render::{BadgeSlot, DrawCommand};

    struct FixedEstimator {
        ready: bool,
        fail: bool,
        poses: Vec<Pose>,
    }

    impl PoseEstimator for FixedEstimator {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn estimate(&mut self, _frame: &FrameInfo) -> AnalysisResult<Vec<Pose>> {
            if self.fail {
                return Err(AnalysisError::Estimation("model crashed".into()));
            }
            Ok(self.poses.clone())
        }
    }

    fn estimator(keypoints: Vec<Keypoint>) -> FixedEstimator {
        FixedEstimator {
            ready: true,
            fail: false,
            poses: vec![Pose::new(keypoints)],
        }
    }

    fn session() -> SessionContext {
        let mut session = SessionContext::with_seed(AnalysisConfig::default(), 11);
        session
            .apply(ReviewCommand::Load {
                name: "clip".into(),
                duration: 5.0,
                width: 640,
                height: 480,
            })
            .unwrap();
        session
    }

    fn players() -> Vec<Keypoint> {
        vec![
            Keypoint::new(KeypointName::Nose, 500.0, 100.0, 0.9),
            Keypoint::new(KeypointName::LeftHip, 300.0, 250.0, 0.8),
            Keypoint::new(KeypointName::RightAnkle, 200.0, 400.0, 0.7),
            Keypoint::new(KeypointName::LeftAnkle, 600.0, 400.0, 0.3),
        ]
    }

    #[test]
    fn skips_without_estimator_or_source() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut est = estimator(players());
        est.ready = false;
        let mut s = session();
        assert_eq!(
            pipeline.tick(&mut s, &mut est, false),
            TickOutcome::Skipped(SkipReason::EstimatorUnavailable)
        );

        let mut idle = SessionContext::with_seed(AnalysisConfig::default(), 1);
        est.ready = true;
        assert_eq!(
            pipeline.tick(&mut idle, &mut est, false),
            TickOutcome::Skipped(SkipReason::NoSource)
        );

        let mut undecoded = session();
        undecoded
            .apply(ReviewCommand::Load {
                name: "pending".into(),
                duration: 5.0,
                width: 0,
                height: 0,
            })
            .unwrap();
        assert_eq!(
            pipeline.tick(&mut undecoded, &mut est, false),
            TickOutcome::Skipped(SkipReason::NoFrameDimensions)
        );
        assert_eq!(pipeline.metrics().snapshot().skipped, 3);
    }

    #[test]
    fn estimator_failure_is_counted_and_recoverable() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut est = estimator(players());
        est.fail = true;
        let mut s = session();
        assert_eq!(pipeline.tick(&mut s, &mut est, false), TickOutcome::Failed);

        est.fail = false;
        assert!(matches!(
            pipeline.tick(&mut s, &mut est, false),
            TickOutcome::Analyzed(_)
        ));
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!((snapshot.processed, snapshot.errors), (1, 1));
    }

    #[test]
    fn running_tick_records_movement_without_rules() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        s.apply(ReviewCommand::SetOffsideMode { enabled: true }).unwrap();
        s.apply(ReviewCommand::Start).unwrap();

        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(players()), false)
        else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.confident_count, 3);
        assert_eq!(analysis.keypoints.unwrap().len(), 4);
        assert!(analysis.offside.is_none());
        assert_eq!(s.movement.len(), 3);
        assert_eq!(s.last_poses[0].keypoints.len(), 4);
        assert!(!s.renderer.badge(BadgeSlot::Offside).visible);
    }

    #[test]
    fn paused_offside_review_sets_badge_and_last_result() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        s.apply(ReviewCommand::SetOffsideMode { enabled: true }).unwrap();

        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(players()), true)
        else {
            panic!("expected analysis");
        };
        let verdict = *analysis.offside.unwrap().verdict().unwrap();
        assert_eq!(verdict.attacker.name, KeypointName::Nose);
        assert_eq!(verdict.defender.name, KeypointName::LeftHip);
        assert_eq!(verdict.ball.unwrap().name, KeypointName::RightAnkle);
        assert!(verdict.offside);
        assert_eq!(s.last_offside, Some(verdict));

        let badge = s.renderer.badge(BadgeSlot::Offside);
        assert!(badge.visible);
        assert_eq!(badge.text, "OFFSIDE");
        assert!(s
            .display
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Ring { .. })));
    }

    #[test]
    fn single_confident_keypoint_hides_offside_badge() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        s.apply(ReviewCommand::SetOffsideMode { enabled: true }).unwrap();
        pipeline.tick(&mut s, &mut estimator(players()), true);
        assert!(s.renderer.badge(BadgeSlot::Offside).visible);

        let lone = vec![Keypoint::new(KeypointName::Nose, 10.0, 10.0, 0.9)];
        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(lone), true)
        else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.offside, Some(OffsideOutcome::Indeterminate));
        assert!(!s.renderer.badge(BadgeSlot::Offside).visible);
        assert!(s.last_offside.is_none());
    }

    #[test]
    fn goal_line_needs_a_manual_ball() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        s.apply(ReviewCommand::SetGoalLineMode { enabled: true }).unwrap();

        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(players()), true)
        else {
            panic!("expected analysis");
        };
        assert!(analysis.goal_line.is_none());
        assert!(!s.renderer.badge(BadgeSlot::GoalLine).visible);

        s.annotation.selection.ball = Some(Keypoint::new(KeypointName::LeftAnkle, 3.0, 400.0, 0.9));
        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(players()), true)
        else {
            panic!("expected analysis");
        };
        assert!(analysis.goal_line.unwrap().goal);
        assert_eq!(s.renderer.badge(BadgeSlot::GoalLine).text, "GOAL");

        s.annotation.selection.ball = None;
        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut estimator(players()), true)
        else {
            panic!("expected analysis");
        };
        assert!(analysis.goal_line.is_none());
        let badge = s.renderer.badge(BadgeSlot::GoalLine);
        assert!(badge.visible);
        assert_eq!(badge.text, "GOAL");
    }

    #[test]
    fn frame_without_pose_hides_previous_offside_verdict() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        s.apply(ReviewCommand::SetOffsideMode { enabled: true }).unwrap();
        pipeline.tick(&mut s, &mut estimator(players()), true);
        assert!(s.renderer.badge(BadgeSlot::Offside).visible);
        assert!(s.last_offside.is_some());

        let mut empty = FixedEstimator {
            ready: true,
            fail: false,
            poses: Vec::new(),
        };
        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut empty, true) else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.offside, Some(OffsideOutcome::Indeterminate));
        assert!(!s.renderer.badge(BadgeSlot::Offside).visible);
        assert!(s.last_offside.is_none());
        assert!(!s
            .display
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Ring { .. })));
    }

    #[test]
    fn empty_pose_list_still_renders_frame() {
        let pipeline = FramePipeline::new(Arc::new(MetricsRecorder::new()));
        let mut s = session();
        let mut est = FixedEstimator {
            ready: true,
            fail: false,
            poses: Vec::new(),
        };
        let TickOutcome::Analyzed(analysis) = pipeline.tick(&mut s, &mut est, false) else {
            panic!("expected analysis");
        };
        assert!(analysis.keypoints.is_none());
        assert_eq!(s.display.commands.len(), 2);
        assert!(s.movement.is_empty());
    }
}
