pub mod export;
pub mod preferences;
pub mod store;
pub mod transcript;

pub use export::{export_snapshot, ExportReport, FileReportSink, ReportSink, REPORT_FILE_NAME};
pub use preferences::ThemePreference;
pub use store::LocalStore;
pub use transcript::{TranscriptEntry, TranscriptStore, TRANSCRIPT_CAPACITY};
