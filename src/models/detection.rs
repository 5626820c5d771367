use crate::services::classifier::ClassificationError;
use serde::{Deserialize, Serialize};

/// One labelled detection produced by a classifier.
///
/// Field names serialize in camelCase so the same struct is used on the
/// remote classification wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub id: String,
    pub category: String,
    pub confidence: f64,
    pub recyclable: bool,
    pub disposal_tip: String,
    /// Estimated CO₂ saving in kg
    pub co2_impact: f64,
    /// Estimated energy saving in kWh
    pub energy_impact: f64,
}

impl ClassificationResult {
    /// Create a result and check its numeric ranges.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        confidence: f64,
        recyclable: bool,
        disposal_tip: impl Into<String>,
        co2_impact: f64,
        energy_impact: f64,
    ) -> Result<Self, ClassificationError> {
        let result = Self {
            id: id.into(),
            category: category.into(),
            confidence,
            recyclable,
            disposal_tip: disposal_tip.into(),
            co2_impact,
            energy_impact,
        };
        result.validate()?;
        Ok(result)
    }

    /// Confidence must lie in [0, 1]; impacts must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ClassificationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ClassificationError::InvalidResult(format!(
                "{}: confidence {} outside [0, 1]",
                self.id, self.confidence
            )));
        }
        if !self.co2_impact.is_finite() || self.co2_impact < 0.0 {
            return Err(ClassificationError::InvalidResult(format!(
                "{}: negative or non-finite co2 impact {}",
                self.id, self.co2_impact
            )));
        }
        if !self.energy_impact.is_finite() || self.energy_impact < 0.0 {
            return Err(ClassificationError::InvalidResult(format!(
                "{}: negative or non-finite energy impact {}",
                self.id, self.energy_impact
            )));
        }
        Ok(())
    }

    /// Confidence as a rounded whole percentage, as shown on the image badge.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Headline summary of the primary (first) detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionHeadline {
    pub category: String,
    pub confidence_percent: u32,
    pub recyclable: bool,
    pub disposal_bin: String,
}

impl DetectionHeadline {
    /// Build the headline for a result list. An empty list yields the
    /// "Unknown" placeholder the result view falls back to.
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        match results.first() {
            Some(primary) => Self {
                category: primary.category.clone(),
                confidence_percent: primary.confidence_percent(),
                recyclable: primary.recyclable,
                disposal_bin: crate::services::guide::lookup(&primary.category)
                    .bin
                    .to_string(),
            },
            None => Self {
                category: "Unknown".to_string(),
                confidence_percent: 0,
                recyclable: false,
                disposal_bin: crate::services::guide::lookup("").bin.to_string(),
            },
        }
    }

    pub fn recyclable_label(&self) -> &'static str {
        if self.recyclable { "Yes" } else { "No" }
    }
}
