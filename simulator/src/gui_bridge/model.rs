use crate::workflow::runner::Runner;
use serde::{Deserialize, Serialize};
use varcore::annotation::{AnnotationSelection, SelectionRole};
use varcore::history::TranscriptEntry;
use varcore::pipeline::{DecisionPanel, ModeFlags, SessionState};
use varcore::render::{Badge, DisplayList};
use varcore::rules::OffsideVerdict;
use varcore::telemetry::MetricsSnapshot;

/// Cells per side of the movement heat map.
pub const HEATMAP_BINS: usize = 20;

/// Everything the visualizer needs to draw one refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationModel {
    pub state: SessionState,
    pub source: Option<String>,
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub modes: ModeFlags,
    pub selection: AnnotationSelection,
    pub selection_status: String,
    pub pending_role: Option<SelectionRole>,
    pub display: DisplayList,
    pub badges: Vec<Badge>,
    pub last_offside: Option<OffsideVerdict>,
    pub decision: DecisionPanel,
    pub xai: String,
    /// Row-major `HEATMAP_BINS` x `HEATMAP_BINS` movement density.
    pub heatmap: Vec<f32>,
    pub movement_samples: usize,
    pub transcripts: Vec<TranscriptEntry>,
    pub dark_mode: bool,
    pub speech_status: String,
    pub metrics: MetricsSnapshot,
}

impl VisualizationModel {
    pub fn capture(runner: &Runner) -> anyhow::Result<Self> {
        let transcripts = runner.transcripts()?;
        let dark_mode = runner.dark_mode()?;
        let speech_status = runner.speech_status()?;
        let metrics = runner.metrics();
        runner.with_session(|session| Self {
            state: session.state,
            source: session.source.clone(),
            current_time: session.clock.current_time,
            duration: session.clock.duration,
            paused: session.clock.paused,
            modes: session.modes,
            selection: session.annotation.selection.clone(),
            selection_status: session.annotation.status().to_string(),
            pending_role: session.annotation.pending(),
            display: session.display.clone(),
            badges: session.renderer.badges().into_iter().cloned().collect(),
            last_offside: session.last_offside,
            decision: session.decision.clone(),
            xai: session.decision.xai_text(),
            heatmap: session.movement.density(HEATMAP_BINS).iter().copied().collect(),
            movement_samples: session.movement.len(),
            transcripts,
            dark_mode,
            speech_status,
            metrics,
        })
    }
}
