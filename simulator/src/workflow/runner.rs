use crate::cloud::client::CloudClient;
use crate::workflow::config::WorkflowConfig;
use anyhow::{anyhow, Context};
use log::{debug, info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use varcore::history::{
    export_snapshot, ExportReport, FileReportSink, LocalStore, ThemePreference, TranscriptEntry,
    TranscriptStore,
};
use varcore::keypoint::PoseEstimator;
use varcore::pipeline::{CommandEffect, FramePipeline, ReviewCommand, SessionContext, TickOutcome};
use varcore::speech::{RecognitionBackend, SpeechSupervisor};
use varcore::telemetry::{MetricsRecorder, MetricsSnapshot};

pub type SharedEstimator = Box<dyn PoseEstimator + Send>;

/// Outcome of one timer tick plus the classification it may have started.
pub struct TickReport {
    pub outcome: TickOutcome,
    pub classification: Option<JoinHandle<()>>,
}

/// Owns a review session and everything that feeds it.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    session: Arc<Mutex<SessionContext>>,
    pipeline: Arc<FramePipeline>,
    metrics: Arc<MetricsRecorder>,
    estimator: Arc<Mutex<SharedEstimator>>,
    cloud: Arc<CloudClient>,
    /// One outstanding classification request at a time.
    classify_permit: Arc<Semaphore>,
    store: LocalStore,
    transcripts: Arc<Mutex<TranscriptStore>>,
    speech: Arc<Mutex<SpeechSupervisor>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> anyhow::Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| anyhow!("{} lock poisoned", what))
}

impl Runner {
    pub fn new(config: WorkflowConfig, estimator: SharedEstimator) -> anyhow::Result<Self> {
        let store = LocalStore::open(&config.store_path)
            .with_context(|| format!("opening local store {}", config.store_path.display()))?;
        Self::with_store(config, estimator, store)
    }

    pub fn with_store(
        config: WorkflowConfig,
        estimator: SharedEstimator,
        store: LocalStore,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(MetricsRecorder::new());
        let cloud = CloudClient::new(
            config.classify_endpoint.clone(),
            &config.api_endpoint,
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )?;
        let transcripts =
            TranscriptStore::open(store.clone()).context("loading saved transcripts")?;
        let session = SessionContext::with_seed(config.to_analysis_config(), config.seed);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            pipeline: Arc::new(FramePipeline::new(metrics.clone())),
            metrics,
            estimator: Arc::new(Mutex::new(estimator)),
            cloud: Arc::new(cloud),
            classify_permit: Arc::new(Semaphore::new(1)),
            store,
            transcripts: Arc::new(Mutex::new(transcripts)),
            speech: Arc::new(Mutex::new(SpeechSupervisor::new(true))),
            config,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn cloud(&self) -> &CloudClient {
        &self.cloud
    }

    /// Runs `f` against the session under its lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&SessionContext) -> R) -> anyhow::Result<R> {
        let session = lock(&self.session, "session")?;
        Ok(f(&session))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_running(&self) -> anyhow::Result<bool> {
        self.with_session(SessionContext::is_running)
    }

    /// Loads a synthetic clip with the configured dimensions.
    pub fn load_clip(&self, name: &str) -> anyhow::Result<()> {
        self.apply(ReviewCommand::Load {
            name: name.to_string(),
            duration: self.config.clip_duration,
            width: self.config.frame_width,
            height: self.config.frame_height,
        })?;
        Ok(())
    }

    /// Applies a command and runs the forced analysis pass it asks for.
    pub fn apply(&self, command: ReviewCommand) -> anyhow::Result<CommandEffect> {
        let effect = lock(&self.session, "session")?.apply(command)?;
        if effect.force_tick {
            self.tick(true)?;
        }
        Ok(effect)
    }

    /// Like [`Runner::apply`], but a forced pass also asks for a classification.
    pub async fn dispatch(&self, command: ReviewCommand) -> anyhow::Result<CommandEffect> {
        let effect = lock(&self.session, "session")?.apply(command)?;
        if effect.force_tick {
            self.tick_and_classify(true)?;
        }
        Ok(effect)
    }

    /// One pipeline pass. The session lock is held throughout, so passes never overlap.
    pub fn tick(&self, force_overlay: bool) -> anyhow::Result<TickOutcome> {
        let mut session = lock(&self.session, "session")?;
        let mut estimator = lock(&self.estimator, "estimator")?;
        Ok(self
            .pipeline
            .tick(&mut session, &mut **estimator, force_overlay))
    }

    /// Moves the playhead by one tick period; a finished clip stops the session.
    pub fn advance_playback(&self) -> anyhow::Result<bool> {
        let ended = {
            let mut session = lock(&self.session, "session")?;
            if !session.is_running() {
                return Ok(false);
            }
            session.clock.advance(self.config.tick_seconds())
        };
        if ended {
            info!("clip finished, stopping analysis");
            self.apply(ReviewCommand::Stop)?;
        }
        Ok(ended)
    }

    /// Runs a pass and, when a pose was found, sends it for classification
    /// unless a previous request is still outstanding.
    pub fn tick_and_classify(&self, force_overlay: bool) -> anyhow::Result<TickReport> {
        let outcome = self.tick(force_overlay)?;
        let classification = match &outcome {
            TickOutcome::Analyzed(analysis) if self.cloud.can_classify() => {
                match analysis.keypoints.clone() {
                    Some(keypoints) => self.spawn_classification(analysis.generation, keypoints),
                    None => None,
                }
            }
            _ => None,
        };
        Ok(TickReport {
            outcome,
            classification,
        })
    }

    fn spawn_classification(
        &self,
        generation: u64,
        keypoints: Vec<varcore::keypoint::Keypoint>,
    ) -> Option<JoinHandle<()>> {
        let permit = match self.classify_permit.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("classification still in flight, skipping");
                self.metrics.record_throttled();
                return None;
            }
        };
        let cloud = self.cloud.clone();
        let session = self.session.clone();
        let metrics = self.metrics.clone();
        Some(tokio::spawn(async move {
            let result = cloud.classify_pose(&keypoints).await;
            drop(permit);
            let Some(classification) = result else {
                return;
            };
            match session.lock() {
                Ok(mut session) => {
                    if !session.apply_classification(generation, &classification) {
                        metrics.record_stale();
                    }
                }
                Err(_) => warn!("session lock poisoned, dropping classification"),
            }
        }))
    }

    /// Drives playback and analysis at the configured period until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if !self.is_running()? {
                        continue;
                    }
                    if self.advance_playback()? {
                        continue;
                    }
                    self.tick_and_classify(false)?;
                }
            }
        }
        info!("analysis loop stopped");
        Ok(())
    }

    pub fn record_transcript(&self, text: &str) -> anyhow::Result<()> {
        lock(&self.transcripts, "transcript")?.record(text)?;
        Ok(())
    }

    pub fn clear_transcripts(&self) -> anyhow::Result<()> {
        lock(&self.transcripts, "transcript")?.clear()?;
        Ok(())
    }

    pub fn transcripts(&self) -> anyhow::Result<Vec<TranscriptEntry>> {
        Ok(lock(&self.transcripts, "transcript")?.load())
    }

    /// Enables capture if needed and drains `backend` into the transcript.
    pub fn capture_speech<B: RecognitionBackend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> anyhow::Result<usize> {
        let mut speech = lock(&self.speech, "speech")?;
        let mut transcripts = lock(&self.transcripts, "transcript")?;
        if !speech.is_enabled() {
            speech.toggle(backend)?;
        }
        let processed = speech.run(backend, &mut transcripts)?;
        if speech.is_enabled() {
            speech.toggle(backend)?;
        }
        Ok(processed)
    }

    pub fn speech_status(&self) -> anyhow::Result<String> {
        Ok(lock(&self.speech, "speech")?.status().to_string())
    }

    pub fn dark_mode(&self) -> anyhow::Result<bool> {
        Ok(ThemePreference::load(&self.store)?.is_dark())
    }

    pub fn set_dark_mode(&self, enabled: bool) -> anyhow::Result<()> {
        ThemePreference::from_enabled(enabled).save(&self.store)?;
        Ok(())
    }

    pub fn report(&self) -> anyhow::Result<ExportReport> {
        self.with_session(|session| ExportReport::snapshot(session, chrono::Utc::now()))
    }

    /// Writes the decision report into the configured export directory.
    pub fn export(&self) -> anyhow::Result<PathBuf> {
        let mut sink = FileReportSink::new(&self.config.export_dir);
        let session = lock(&self.session, "session")?;
        let path = export_snapshot(&session, &mut sink).context("exporting decision report")?;
        info!("decision report written to {}", path.display());
        Ok(path)
    }
}
