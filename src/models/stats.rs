use crate::models::ClassificationResult;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Cumulative statistics across every classification in a session.
///
/// Only [`fold`] produces new values (plus the explicit zeroing in
/// [`crate::state::StateManager::reset_stats`]). The recycling rate is not a
/// field: it is derived from the two counters every time it is read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    pub items_detected: u64,
    pub recyclable: u64,
    /// Cumulative CO₂ saved in kg, one decimal place
    pub co2_saved: f64,
    /// Cumulative energy saved in kWh, one decimal place
    pub energy_saved: f64,
}

impl AggregateStats {
    /// `round(recyclable / items_detected * 100)`, or 0 before anything has
    /// been detected.
    pub fn recycling_rate(&self) -> u32 {
        if self.items_detected == 0 {
            return 0;
        }
        ((self.recyclable as f64 / self.items_detected as f64) * 100.0).round() as u32
    }

    /// The five dashboard cards, in display order.
    pub fn dashboard_metrics(&self) -> Vec<DashboardMetric> {
        vec![
            DashboardMetric::new("Items Detected", self.items_detected.to_string()),
            DashboardMetric::new("Recyclable", self.recyclable.to_string()),
            DashboardMetric::new("Recycling Rate", format!("{}%", self.recycling_rate())),
            DashboardMetric::new("CO₂ Saved", format!("{} kg", self.co2_saved)),
            DashboardMetric::new("Energy Saved", format!("{} kWh", self.energy_saved)),
        ]
    }
}

impl Serialize for AggregateStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AggregateStats", 5)?;
        state.serialize_field("itemsDetected", &self.items_detected)?;
        state.serialize_field("recyclable", &self.recyclable)?;
        state.serialize_field("recyclingRate", &self.recycling_rate())?;
        state.serialize_field("co2Saved", &self.co2_saved)?;
        state.serialize_field("energySaved", &self.energy_saved)?;
        state.end()
    }
}

/// A titled dashboard value, already formatted with its unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DashboardMetric {
    pub title: &'static str,
    pub value: String,
}

impl DashboardMetric {
    fn new(title: &'static str, value: String) -> Self {
        Self { title, value }
    }
}

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fold a batch of results into the previous statistics.
///
/// Pure: the output depends only on the arguments. An empty batch returns
/// `previous` untouched so repeated empty folds cannot introduce rounding
/// drift.
pub fn fold(previous: &AggregateStats, results: &[ClassificationResult]) -> AggregateStats {
    if results.is_empty() {
        return previous.clone();
    }

    let recyclable_delta = results.iter().filter(|r| r.recyclable).count() as u64;
    let co2_delta: f64 = results.iter().map(|r| r.co2_impact).sum();
    let energy_delta: f64 = results.iter().map(|r| r.energy_impact).sum();

    tracing::debug!(
        "Folding {} results: recyclable +{}, co2 +{:.3} kg, energy +{:.3} kWh",
        results.len(),
        recyclable_delta,
        co2_delta,
        energy_delta
    );

    AggregateStats {
        items_detected: previous.items_detected + results.len() as u64,
        recyclable: previous.recyclable + recyclable_delta,
        co2_saved: round1(previous.co2_saved + co2_delta),
        energy_saved: round1(previous.energy_saved + energy_delta),
    }
}

/// Count results per category, in the order categories first appear.
pub fn category_breakdown(results: &[ClassificationResult]) -> IndexMap<String, u64> {
    let mut counts = IndexMap::new();
    for r in results {
        *counts.entry(r.category.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(recyclable: bool, co2: f64, energy: f64) -> ClassificationResult {
        ClassificationResult {
            id: "t".to_string(),
            category: if recyclable { "Plastic" } else { "Organic" }.to_string(),
            confidence: 0.9,
            recyclable,
            disposal_tip: String::new(),
            co2_impact: co2,
            energy_impact: energy,
        }
    }

    #[test]
    fn test_two_organic_items_from_zero() {
        let previous = AggregateStats::default();
        let results = vec![result(false, 0.3, 0.1), result(false, 0.3, 0.1)];

        let next = fold(&previous, &results);

        assert_eq!(next.items_detected, 2);
        assert_eq!(next.recyclable, 0);
        assert_eq!(next.recycling_rate(), 0);
        assert_eq!(next.co2_saved, 0.6);
        assert_eq!(next.energy_saved, 0.2);
    }

    #[test]
    fn test_followed_by_one_recyclable_item() {
        let first = fold(
            &AggregateStats::default(),
            &[result(false, 0.3, 0.1), result(false, 0.3, 0.1)],
        );

        let next = fold(&first, &[result(true, 0.5, 0.2)]);

        assert_eq!(next.items_detected, 3);
        assert_eq!(next.recyclable, 1);
        assert_eq!(next.recycling_rate(), 33);
        assert_eq!(next.co2_saved, 1.1);
        assert_eq!(next.energy_saved, 0.4);
    }

    #[test]
    fn test_empty_fold_is_identity() {
        let previous = AggregateStats {
            items_detected: 4,
            recyclable: 3,
            co2_saved: 1.7,
            energy_saved: 0.9,
        };
        assert_eq!(fold(&previous, &[]), previous);
    }

    #[test]
    fn test_rate_zero_without_items() {
        assert_eq!(AggregateStats::default().recycling_rate(), 0);
    }

    #[test]
    fn test_rate_rounds_half_up() {
        let stats = AggregateStats {
            items_detected: 8,
            recyclable: 5,
            ..Default::default()
        };
        // 62.5 -> 63
        assert_eq!(stats.recycling_rate(), 63);
    }

    #[test]
    fn test_dashboard_metrics_formatting() {
        let stats = fold(
            &AggregateStats::default(),
            &[result(false, 0.3, 0.1), result(false, 0.3, 0.1)],
        );
        let metrics = stats.dashboard_metrics();

        assert_eq!(metrics.len(), 5);
        assert_eq!(metrics[0].value, "2");
        assert_eq!(metrics[2].value, "0%");
        assert_eq!(metrics[3].value, "0.6 kg");
        assert_eq!(metrics[4].value, "0.2 kWh");
    }

    #[test]
    fn test_serialized_snapshot_includes_derived_rate() {
        let stats = AggregateStats {
            items_detected: 3,
            recyclable: 1,
            co2_saved: 1.1,
            energy_saved: 0.4,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["recyclingRate"], 33);
        assert_eq!(json["itemsDetected"], 3);
    }

    #[test]
    fn test_category_breakdown_keeps_first_seen_order() {
        let results = vec![
            result(false, 0.3, 0.1),
            result(true, 0.5, 0.2),
            result(false, 0.3, 0.1),
        ];

        let counts = category_breakdown(&results);
        let order: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(order, vec![("Organic", 2), ("Plastic", 1)]);
        assert!(category_breakdown(&[]).is_empty());
    }
}
