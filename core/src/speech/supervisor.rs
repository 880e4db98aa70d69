use crate::history::TranscriptStore;
use crate::prelude::AnalysisResult;
use log::{debug, warn};

const IDLE_STATUS: &str = "Click to start recording";
const RECORDING_STATUS: &str = "Recording...";
const UNSUPPORTED_STATUS: &str = "Speech recognition not supported";

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("speech recognition not supported")]
    Unsupported,
    #[error("recognition session failed to start: {0}")]
    Start(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result { text: String, is_final: bool },
    /// The backend closed the session on its own.
    End,
    Error(String),
}

/// Continuous speech-to-text session.
pub trait RecognitionBackend {
    fn start(&mut self) -> Result<(), SpeechError>;
    fn stop(&mut self);
    /// Next pending event, or `None` when the backend has nothing more to report.
    fn next_event(&mut self) -> Option<RecognitionEvent>;
}

/// Restart policy for commentary capture: sessions that end while enabled are
/// restarted, errors switch capture off and are surfaced as status text.
#[derive(Debug, Clone)]
pub struct SpeechSupervisor {
    supported: bool,
    enabled: bool,
    status: String,
    restarts: usize,
}

impl SpeechSupervisor {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            enabled: false,
            status: if supported {
                IDLE_STATUS.to_string()
            } else {
                UNSUPPORTED_STATUS.to_string()
            },
            restarts: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Starts or stops capture; returns whether capture is now enabled.
    pub fn toggle<B: RecognitionBackend + ?Sized>(&mut self, backend: &mut B) -> AnalysisResult<bool> {
        if !self.supported {
            return Err(SpeechError::Unsupported.into());
        }
        if self.enabled {
            backend.stop();
            self.enabled = false;
            self.status = IDLE_STATUS.to_string();
        } else {
            backend.start()?;
            self.enabled = true;
            self.status = RECORDING_STATUS.to_string();
        }
        Ok(self.enabled)
    }

    /// Applies one backend event; final utterances land in the transcript.
    pub fn handle<B: RecognitionBackend + ?Sized>(
        &mut self,
        event: RecognitionEvent,
        backend: &mut B,
        transcripts: &mut TranscriptStore,
    ) -> AnalysisResult<()> {
        match event {
            RecognitionEvent::Result { text, is_final } => {
                let text = text.trim();
                if is_final && !text.is_empty() {
                    transcripts.record(text)?;
                }
            }
            RecognitionEvent::End if self.enabled => match backend.start() {
                Ok(()) => {
                    self.restarts += 1;
                    debug!("recognition session restarted ({})", self.restarts);
                }
                Err(err) => self.fail(&err.to_string()),
            },
            RecognitionEvent::End => {
                self.status = IDLE_STATUS.to_string();
            }
            RecognitionEvent::Error(message) => self.fail(&message),
        }
        Ok(())
    }

    /// Drains the backend, returning how many events were processed.
    pub fn run<B: RecognitionBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        transcripts: &mut TranscriptStore,
    ) -> AnalysisResult<usize> {
        let mut processed = 0;
        while self.enabled {
            let Some(event) = backend.next_event() else {
                break;
            };
            self.handle(event, backend, transcripts)?;
            processed += 1;
        }
        Ok(processed)
    }

    fn fail(&mut self, message: &str) {
        warn!("speech recognition error: {}", message);
        self.status = format!("Error: {}", message);
        self.enabled = false;
    }
}
