pub mod supervisor;

pub use supervisor::{RecognitionBackend, RecognitionEvent, SpeechError, SpeechSupervisor};
