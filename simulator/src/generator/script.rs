use anyhow::Context;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use varcore::speech::{RecognitionBackend, RecognitionEvent, SpeechError};

/// Replays commentary from a text file as a recognition session.
///
/// Each non-empty line is one final utterance. A line `--` ends the session
/// (exercising the restart policy) and `!message` reports a recognition error.
pub struct ScriptedRecognizer {
    events: VecDeque<RecognitionEvent>,
    running: bool,
}

impl ScriptedRecognizer {
    pub fn from_text(script: &str) -> Self {
        let events = script
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line {
                "--" => RecognitionEvent::End,
                _ if line.starts_with('!') => RecognitionEvent::Error(line[1..].trim().to_string()),
                _ => RecognitionEvent::Result {
                    text: line.to_string(),
                    is_final: true,
                },
            })
            .collect();
        Self {
            events,
            running: false,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let script = fs::read_to_string(path_ref)
            .with_context(|| format!("reading transcript script {}", path_ref.display()))?;
        Ok(Self::from_text(&script))
    }
}

impl RecognitionBackend for ScriptedRecognizer {
    fn start(&mut self) -> Result<(), SpeechError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn next_event(&mut self) -> Option<RecognitionEvent> {
        if !self.running {
            return None;
        }
        let event = self.events.pop_front();
        if matches!(event, Some(RecognitionEvent::End)) {
            self.running = false;
        }
        event
    }
}
