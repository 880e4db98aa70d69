use crate::keypoint::Keypoint;
use crate::pipeline::SessionContext;
use crate::prelude::AnalysisResult;
use crate::rules::OffsideVerdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "var_decision_report.json";

/// Point-in-time snapshot of the review, offered to the user as a JSON download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub timestamp: DateTime<Utc>,
    pub offside_mode: bool,
    pub goal_line_mode: bool,
    pub manual_attacker: Option<Keypoint>,
    pub manual_defender: Option<Keypoint>,
    pub manual_ball: Option<Keypoint>,
    pub last_offside_result: Option<OffsideVerdict>,
    pub ai_decision: String,
    pub xai: String,
}

impl ExportReport {
    pub fn snapshot(session: &SessionContext, now: DateTime<Utc>) -> Self {
        let selection = &session.annotation.selection;
        Self {
            timestamp: now,
            offside_mode: session.modes.offside,
            goal_line_mode: session.modes.goal_line,
            manual_attacker: selection.attacker,
            manual_defender: selection.defender,
            manual_ball: selection.ball,
            last_offside_result: session.last_offside,
            ai_decision: session.decision.status.clone(),
            xai: session.decision.xai_text(),
        }
    }

    pub fn to_json(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Receives the serialised report; stands in for a client-side download.
pub trait ReportSink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> AnalysisResult<PathBuf>;
}

/// Writes reports into a directory.
pub struct FileReportSink {
    directory: PathBuf,
}

impl FileReportSink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}

impl ReportSink for FileReportSink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> AnalysisResult<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Builds the report from current state and hands it to `sink`.
pub fn export_snapshot<S: ReportSink + ?Sized>(
    session: &SessionContext,
    sink: &mut S,
) -> AnalysisResult<PathBuf> {
    let report = ExportReport::snapshot(session, Utc::now());
    sink.deliver(REPORT_FILE_NAME, &report.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::KeypointName;
    use crate::pipeline::ReviewCommand;
    use crate::prelude::AnalysisConfig;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn session() -> SessionContext {
        let mut session = SessionContext::with_seed(AnalysisConfig::default(), 5);
        session
            .apply(ReviewCommand::Load {
                name: "clip".into(),
                duration: 3.0,
                width: 640,
                height: 480,
            })
            .unwrap();
        session
            .apply(ReviewCommand::SetOffsideMode { enabled: true })
            .unwrap();
        session.annotation.selection.attacker =
            Some(Keypoint::new(KeypointName::Nose, 80.125, 10.0, 0.91));
        session.annotation.selection.defender =
            Some(Keypoint::new(KeypointName::LeftHip, 50.0, 12.5, 0.77));
        session
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        let report = ExportReport::snapshot(&session(), now);
        let parsed: ExportReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
        assert!(parsed.offside_mode);
        assert!(!parsed.goal_line_mode);
        assert!(parsed.manual_ball.is_none());
    }

    #[test]
    fn report_uses_camel_case_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        let json = ExportReport::snapshot(&session(), now).to_json().unwrap();
        assert!(json.contains("\"offsideMode\": true"));
        assert!(json.contains("\"lastOffsideResult\": null"));
        assert!(json.contains("\"aiDecision\": \"Awaiting analysis\""));
    }

    #[test]
    fn file_sink_writes_report() {
        let dir = tempdir().unwrap();
        let mut sink = FileReportSink::new(dir.path());
        let path = export_snapshot(&session(), &mut sink).unwrap();
        assert_eq!(path.file_name().unwrap(), REPORT_FILE_NAME);
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("manualAttacker"));
    }
}
