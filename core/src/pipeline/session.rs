use crate::annotation::{surface_to_frame, AnnotationState, SelectionRole};
use crate::keypoint::{FrameInfo, Pose};
use crate::pipeline::clock::VideoClock;
use crate::pipeline::decision::{Classification, DecisionPanel};
use crate::pipeline::movement::MovementHistory;
use crate::prelude::{AnalysisConfig, AnalysisError, AnalysisResult};
use crate::render::{BadgeSlot, DisplayList, OverlayRenderer, OverlayRequest};
use crate::rules::{OffsideVerdict, Severity};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No source loaded.
    Idle,
    /// Source loaded, analysis stopped.
    Armed,
    /// Playback and the analysis timer are running.
    Running,
    /// Paused for frame-by-frame review.
    Stepping,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeFlags {
    pub offside: bool,
    pub goal_line: bool,
}

/// User and control inputs accepted by a review session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ReviewCommand {
    Load {
        name: String,
        duration: f64,
        width: u32,
        height: u32,
    },
    Start,
    Stop,
    StepForward,
    StepBackward,
    SetOffsideMode {
        enabled: bool,
    },
    SetGoalLineMode {
        enabled: bool,
    },
    BeginSelection {
        role: SelectionRole,
    },
    /// Click on a display surface of the given size.
    Click {
        x: f64,
        y: f64,
        surface_width: f64,
        surface_height: f64,
    },
    SetSeverity {
        severity: Severity,
    },
}

/// Follow-up work the caller owes after a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandEffect {
    /// Run one analysis pass now with rule overlays forced on.
    pub force_tick: bool,
}

/// All mutable state of one review session, owned in one place.
#[derive(Debug)]
pub struct SessionContext {
    pub config: AnalysisConfig,
    pub state: SessionState,
    pub source: Option<String>,
    pub clock: VideoClock,
    pub modes: ModeFlags,
    pub annotation: AnnotationState,
    pub last_poses: Vec<Pose>,
    pub last_frame: Option<FrameInfo>,
    pub movement: MovementHistory,
    pub last_offside: Option<OffsideVerdict>,
    pub decision: DecisionPanel,
    pub renderer: OverlayRenderer,
    pub display: DisplayList,
    generation: u64,
    rng: StdRng,
}

impl SessionContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: AnalysisConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: AnalysisConfig, rng: StdRng) -> Self {
        let renderer = OverlayRenderer::new(config.confidence_threshold);
        Self {
            clock: VideoClock::new(0.0, config.frame_rate, 0, 0),
            config,
            state: SessionState::Idle,
            source: None,
            modes: ModeFlags::default(),
            annotation: AnnotationState::new(),
            last_poses: Vec::new(),
            last_frame: None,
            movement: MovementHistory::new(),
            last_offside: None,
            decision: DecisionPanel::default(),
            renderer,
            display: DisplayList::new(),
            generation: 0,
            rng,
        }
    }

    /// Bumped whenever in-flight results would no longer apply (stop, reload).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn apply(&mut self, command: ReviewCommand) -> AnalysisResult<CommandEffect> {
        debug!("session command {:?} in state {:?}", command, self.state);
        match command {
            ReviewCommand::Load {
                name,
                duration,
                width,
                height,
            } => {
                self.load(name, duration, width, height);
                Ok(CommandEffect::default())
            }
            ReviewCommand::Start => self.start(),
            ReviewCommand::Stop => {
                self.stop();
                Ok(CommandEffect::default())
            }
            ReviewCommand::StepForward => self.step(true),
            ReviewCommand::StepBackward => self.step(false),
            ReviewCommand::SetOffsideMode { enabled } => Ok(self.set_offside_mode(enabled)),
            ReviewCommand::SetGoalLineMode { enabled } => Ok(self.set_goal_line_mode(enabled)),
            ReviewCommand::BeginSelection { role } => {
                if !self.modes.offside {
                    return Err(AnalysisError::InvalidCommand(
                        "manual selection requires offside mode".into(),
                    ));
                }
                self.annotation.begin(role);
                Ok(CommandEffect::default())
            }
            ReviewCommand::Click {
                x,
                y,
                surface_width,
                surface_height,
            } => {
                let (fx, fy) = surface_to_frame(
                    x,
                    y,
                    surface_width,
                    surface_height,
                    self.clock.width,
                    self.clock.height,
                );
                if let Some(keypoint) = self.annotation.pick(self.last_poses.first(), fx, fy) {
                    info!("{}", self.annotation.status());
                    debug!("picked {} at ({:.1}, {:.1})", keypoint.name, keypoint.x, keypoint.y);
                }
                Ok(CommandEffect::default())
            }
            ReviewCommand::SetSeverity { severity } => {
                let assessment = severity.assess(&mut self.rng);
                self.decision.apply_assessment(&assessment);
                Ok(CommandEffect::default())
            }
        }
    }

    fn load(&mut self, name: String, duration: f64, width: u32, height: u32) {
        info!("loaded source {} ({}x{}, {:.2}s)", name, width, height, duration);
        self.generation += 1;
        self.source = Some(name);
        self.clock = VideoClock::new(duration, self.config.frame_rate, width, height);
        self.state = SessionState::Armed;
        self.movement.clear();
        self.last_poses.clear();
        self.last_frame = None;
        self.display = DisplayList::new();
    }

    fn start(&mut self) -> AnalysisResult<CommandEffect> {
        match self.state {
            SessionState::Idle => Err(AnalysisError::InvalidCommand(
                "no source loaded".into(),
            )),
            SessionState::Running => Ok(CommandEffect::default()),
            SessionState::Armed | SessionState::Stepping => {
                self.state = SessionState::Running;
                self.clock.play();
                Ok(CommandEffect::default())
            }
        }
    }

    /// Movement history and selections survive a stop.
    fn stop(&mut self) {
        if matches!(self.state, SessionState::Running | SessionState::Stepping) {
            self.generation += 1;
            self.state = SessionState::Armed;
        }
        self.clock.pause();
    }

    fn step(&mut self, forward: bool) -> AnalysisResult<CommandEffect> {
        if self.state == SessionState::Idle {
            return Err(AnalysisError::InvalidCommand("no source loaded".into()));
        }
        if forward {
            self.clock.step_forward();
        } else {
            self.clock.step_backward();
        }
        self.state = SessionState::Stepping;
        Ok(CommandEffect { force_tick: true })
    }

    fn set_offside_mode(&mut self, enabled: bool) -> CommandEffect {
        self.modes.offside = enabled;
        if enabled {
            return CommandEffect {
                force_tick: self.clock.paused && self.state != SessionState::Idle,
            };
        }
        self.annotation.reset();
        self.renderer.hide(BadgeSlot::Offside);
        self.redraw();
        CommandEffect::default()
    }

    fn set_goal_line_mode(&mut self, enabled: bool) -> CommandEffect {
        self.modes.goal_line = enabled;
        if enabled {
            return CommandEffect {
                force_tick: self.state != SessionState::Idle,
            };
        }
        self.renderer.hide(BadgeSlot::GoalLine);
        self.redraw();
        CommandEffect::default()
    }

    /// Re-renders the last analysed frame without rule overlays.
    pub fn redraw(&mut self) {
        if let Some(frame) = self.last_frame {
            self.renderer.render(
                &mut self.display,
                &frame,
                &self.last_poses,
                OverlayRequest::default(),
            );
        }
    }

    /// Applies a backend classification unless the session moved on since it was requested.
    pub fn apply_classification(&mut self, generation: u64, classification: &Classification) -> bool {
        if generation != self.generation {
            debug!(
                "discarding classification from generation {} (now {})",
                generation, self.generation
            );
            return false;
        }
        self.decision.apply_classification(classification);
        true
    }
}
