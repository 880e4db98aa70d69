use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FACTOR_LABELS: [&str; 5] = [
    "Arm Position",
    "Hip Direction",
    "Fall Speed",
    "Body Angle",
    "Contact Force",
];

/// Half-width of the uniform jitter applied to factor values.
pub const FACTOR_JITTER: f64 = 5.0;

/// Demo-only incident classification chosen by the reviewer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub fn base_factors(&self) -> [f64; 5] {
        match self {
            Severity::Minor => [25.0, 15.0, 20.0, 10.0, 15.0],
            Severity::Moderate => [60.0, 55.0, 40.0, 50.0, 65.0],
            Severity::Severe => [90.0, 75.0, 85.0, 80.0, 95.0],
        }
    }

    pub fn reasons(&self) -> &'static [&'static str] {
        match self {
            Severity::Minor => &[
                "Player contact was minimal and unintentional",
                "Arm position was in natural position (confidence: 87%)",
                "Fall speed matched expected physics (confidence: 92%)",
                "Body angle indicated attempt to avoid contact",
            ],
            Severity::Moderate => &[
                "Moderate contact force detected in the collision",
                "Arm position slightly extended during contact (confidence: 76%)",
                "Hip rotation suggested slight intent (confidence: 68%)",
                "Player speed increased just before contact",
            ],
            Severity::Severe => &[
                "Excessive contact force detected in analysis",
                "Arm extended unnaturally during contact (confidence: 93%)",
                "Body angle showed clear intent to obstruct opponent",
                "Movement pattern shows pre-meditated action",
                "Contact point targeted vulnerable area",
            ],
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor (No action)",
            Severity::Moderate => "Moderate (Yellow Card)",
            Severity::Severe => "Severe (Red Card or Penalty)",
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Severity::Minor => "The system has determined this incident to be minor with high confidence. The analysis of player movement and contact shows natural patterns consistent with regular play.",
            Severity::Moderate => "This incident has been classified as moderate, warranting a yellow card. The analysis shows some concerning patterns that indicate potential intent, though not with absolute certainty.",
            Severity::Severe => "This incident has been classified as severe with high confidence, warranting a red card or penalty. The movement analysis shows clear patterns of intentional dangerous play.",
        }
    }

    /// Long-form explanation shown in the expanded reasoning view.
    pub fn detailed_reasoning(&self) -> String {
        let mut text = format!("{}\n\nKey factors in this decision:\n", self.summary());
        for reason in self.reasons() {
            text.push_str("- ");
            text.push_str(reason);
            text.push('\n');
        }
        text.push_str(
            "\nThe system analyzed 247 similar incidents from previous matches to train its classification algorithm.",
        );
        text
    }

    /// Builds the displayed assessment, jittering factors so the output is not static.
    pub fn assess<R: Rng + ?Sized>(&self, rng: &mut R) -> SeverityAssessment {
        let factors = jitter_factors(self.base_factors(), rng);
        SeverityAssessment {
            severity: *self,
            badge: self.badge().to_string(),
            confidence: 70 + rng.gen_range(0..25u8),
            factors,
            reasons: self.reasons().iter().map(|r| r.to_string()).collect(),
            detailed_reasoning: self.detailed_reasoning(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        };
        f.write_str(name)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

pub fn jitter_factors<R: Rng + ?Sized>(base: [f64; 5], rng: &mut R) -> [f64; 5] {
    base.map(|value| (value + rng.gen_range(-FACTOR_JITTER..=FACTOR_JITTER)).clamp(0.0, 100.0))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeverityAssessment {
    pub severity: Severity,
    pub badge: String,
    pub confidence: u8,
    pub factors: [f64; 5],
    pub reasons: Vec<String>,
    pub detailed_reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn severe_base_table_is_fixed() {
        assert_eq!(
            Severity::Severe.base_factors(),
            [90.0, 75.0, 85.0, 80.0, 95.0]
        );
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for severity in [Severity::Minor, Severity::Moderate, Severity::Severe] {
            let base = severity.base_factors();
            for _ in 0..200 {
                let assessment = severity.assess(&mut rng);
                for (value, base) in assessment.factors.iter().zip(base.iter()) {
                    assert!(*value >= (base - 5.0).max(0.0));
                    assert!(*value <= (base + 5.0).min(100.0));
                }
                assert!((70..95).contains(&assessment.confidence));
            }
        }
    }

    #[test]
    fn severity_parses_from_labels() {
        assert_eq!("Severe".parse::<Severity>().unwrap(), Severity::Severe);
        assert!("extreme".parse::<Severity>().is_err());
        assert_eq!(Severity::Moderate.to_string(), "moderate");
    }

    #[test]
    fn detailed_reasoning_lists_every_reason() {
        let text = Severity::Minor.detailed_reasoning();
        for reason in Severity::Minor.reasons() {
            assert!(text.contains(reason));
        }
        assert_eq!(Severity::Severe.reasons().len(), 5);
    }
}
