use crate::rules::{Severity, SeverityAssessment, FACTOR_LABELS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response of the pose classification backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Percentage in 0..=100.
    pub confidence: f64,
    #[serde(default)]
    pub importances: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factor {
    pub label: String,
    pub value: f64,
}

/// What the reviewer currently sees as the AI decision and its explanation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionPanel {
    pub status: String,
    pub confidence: f64,
    pub severity: Option<Severity>,
    pub badge: Option<String>,
    pub reasons: Vec<String>,
    pub detailed_reasoning: String,
    pub factors: Vec<Factor>,
}

impl Default for DecisionPanel {
    fn default() -> Self {
        Self {
            status: "Awaiting analysis".to_string(),
            confidence: 0.0,
            severity: None,
            badge: None,
            reasons: Vec::new(),
            detailed_reasoning: String::new(),
            factors: FACTOR_LABELS
                .iter()
                .map(|label| Factor {
                    label: label.to_string(),
                    value: 0.0,
                })
                .collect(),
        }
    }
}

impl DecisionPanel {
    pub fn apply_assessment(&mut self, assessment: &SeverityAssessment) {
        self.severity = Some(assessment.severity);
        self.badge = Some(assessment.badge.clone());
        self.confidence = assessment.confidence as f64;
        self.reasons = assessment.reasons.clone();
        self.detailed_reasoning = assessment.detailed_reasoning.clone();
        self.factors = FACTOR_LABELS
            .iter()
            .zip(assessment.factors.iter())
            .map(|(label, value)| Factor {
                label: label.to_string(),
                value: *value,
            })
            .collect();
    }

    /// Backend output replaces the status, confidence, reasoning and factors.
    pub fn apply_classification(&mut self, classification: &Classification) {
        self.status = classification.label.clone();
        self.confidence = classification.confidence.clamp(0.0, 100.0);
        self.reasons = std::iter::once(format!(
            "AI classified as: {} (confidence: {}%)",
            classification.label, classification.confidence
        ))
        .chain(
            classification
                .importances
                .iter()
                .map(|(factor, value)| format!("{}: {}%", factor, value)),
        )
        .collect();
        self.factors = classification
            .importances
            .iter()
            .map(|(label, value)| Factor {
                label: label.clone(),
                value: *value,
            })
            .collect();
    }

    /// Reasoning as one line per entry, used in exports.
    pub fn xai_text(&self) -> String {
        self.reasons.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn classification_replaces_reasoning_and_factors() {
        let mut panel = DecisionPanel::default();
        let mut importances = BTreeMap::new();
        importances.insert("Arm Position".to_string(), 40.0);
        importances.insert("Body Angle".to_string(), 25.0);
        panel.apply_classification(&Classification {
            label: "Simulated Contact".into(),
            confidence: 82.0,
            importances,
        });

        assert_eq!(panel.status, "Simulated Contact");
        assert_eq!(panel.confidence, 82.0);
        assert_eq!(
            panel.reasons[0],
            "AI classified as: Simulated Contact (confidence: 82%)"
        );
        assert_eq!(panel.reasons[1], "Arm Position: 40%");
        assert_eq!(panel.factors.len(), 2);
    }

    #[test]
    fn assessment_fills_badge_and_labelled_factors() {
        let mut panel = DecisionPanel::default();
        let assessment = Severity::Moderate.assess(&mut StdRng::seed_from_u64(1));
        panel.apply_assessment(&assessment);
        assert_eq!(panel.badge.as_deref(), Some("Moderate (Yellow Card)"));
        assert_eq!(panel.factors[4].label, "Contact Force");
        assert_eq!(panel.xai_text().lines().count(), 4);
    }
}
