//! The shared metric table.
//!
//! Every derived ratio shown anywhere in the dashboard is defined here,
//! once, as a numerator and a denominator over [`CategoryTotals`]. Views
//! never compute a ratio themselves.

use crate::models::CategoryTotals;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the metric table. Bump whenever a formula changes.
pub const METRIC_TABLE_VERSION: u32 = 1;

/// A named metric of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Medical assistance over total interventions.
    MedicalShare,
    /// Fires over total interventions.
    FireShare,
    /// Traffic accidents over total interventions.
    TrafficAccidentShare,
    /// Other operations over total interventions.
    OtherOperationsShare,
    /// Carences over medical assistance.
    CarenceRate,
    /// Habitation fires over all fires.
    HabitationFireShare,
    /// Carences over home malaises (vital emergencies plus carences).
    HomeMalaiseCarenceShare,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Metric {
    /// Every metric of the table, in display order.
    pub const ALL: [Metric; 7] = [
        Metric::MedicalShare,
        Metric::FireShare,
        Metric::TrafficAccidentShare,
        Metric::OtherOperationsShare,
        Metric::CarenceRate,
        Metric::HabitationFireShare,
        Metric::HomeMalaiseCarenceShare,
    ];

    /// Stable machine name, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::MedicalShare => "medical_share",
            Metric::FireShare => "fire_share",
            Metric::TrafficAccidentShare => "traffic_accident_share",
            Metric::OtherOperationsShare => "other_operations_share",
            Metric::CarenceRate => "carence_rate",
            Metric::HabitationFireShare => "habitation_fire_share",
            Metric::HomeMalaiseCarenceShare => "home_malaise_carence_share",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MedicalShare => "Medical assistance share",
            Metric::FireShare => "Fire share",
            Metric::TrafficAccidentShare => "Traffic accident share",
            Metric::OtherOperationsShare => "Other operations share",
            Metric::CarenceRate => "Carence rate",
            Metric::HabitationFireShare => "Habitation fires / fires",
            Metric::HomeMalaiseCarenceShare => "Carences / home malaises",
        }
    }

    /// The formula, as documented in reports.
    pub fn formula(&self) -> &'static str {
        match self {
            Metric::MedicalShare => "(victim rescue + person rescue) / total interventions",
            Metric::FireShare => "fires / total interventions",
            Metric::TrafficAccidentShare => "traffic accidents / total interventions",
            Metric::OtherOperationsShare => "other operations / total interventions",
            Metric::CarenceRate => "carences / (victim rescue + person rescue)",
            Metric::HabitationFireShare => "habitation fires / fires",
            Metric::HomeMalaiseCarenceShare => "carences / (vital emergencies + carences)",
        }
    }

    pub fn numerator(&self, totals: &CategoryTotals) -> u64 {
        match self {
            Metric::MedicalShare => totals.medical_assistance,
            Metric::FireShare => totals.fires,
            Metric::TrafficAccidentShare => totals.traffic_accidents,
            Metric::OtherOperationsShare => totals.other_operations,
            Metric::CarenceRate | Metric::HomeMalaiseCarenceShare => totals.carences,
            Metric::HabitationFireShare => totals.habitation_fires,
        }
    }

    pub fn denominator(&self, totals: &CategoryTotals) -> u64 {
        match self {
            Metric::MedicalShare
            | Metric::FireShare
            | Metric::TrafficAccidentShare
            | Metric::OtherOperationsShare => totals.total_interventions,
            Metric::CarenceRate => totals.medical_assistance,
            Metric::HabitationFireShare => totals.fires,
            Metric::HomeMalaiseCarenceShare => {
                totals.vital_emergencies.saturating_add(totals.carences)
            }
        }
    }

    /// Evaluate the metric on summed totals.
    pub fn evaluate(&self, totals: &CategoryTotals) -> f64 {
        ratio(self.numerator(totals), self.denominator(totals))
    }
}

/// Ratio of two counts, in `[0, 1]`.
///
/// A zero denominator yields `0.0`. A numerator larger than its
/// denominator only happens on inconsistent rows, which the quality pass
/// reports; the ratio is capped at `1.0`.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    (numerator as f64 / denominator as f64).min(1.0)
}

/// A metric together with its computed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub metric: Metric,
    pub value: f64,
}

/// Evaluate the whole metric table on summed totals.
pub fn evaluate_all(totals: &CategoryTotals) -> Vec<MetricValue> {
    Metric::ALL
        .iter()
        .map(|metric| MetricValue {
            metric: *metric,
            value: metric.evaluate(totals),
        })
        .collect()
}

/// Format a ratio as a percentage with one decimal.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(total: u64, medical: u64, carences: u64) -> CategoryTotals {
        CategoryTotals {
            total_interventions: total,
            victim_rescue: medical,
            medical_assistance: medical,
            carences,
            ..Default::default()
        }
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(12, 0), 0.0);
    }

    #[test]
    fn test_ratio_is_capped() {
        assert_eq!(ratio(15, 10), 1.0);
        assert_eq!(ratio(5, 10), 0.5);
    }

    #[test]
    fn test_carence_rate_uses_medical_denominator() {
        let t = totals(100, 80, 10);
        assert_eq!(Metric::CarenceRate.evaluate(&t), 0.125);
        assert_eq!(Metric::MedicalShare.evaluate(&t), 0.8);
    }

    #[test]
    fn test_home_malaise_carence_share() {
        let t = CategoryTotals {
            vital_emergencies: 30,
            carences: 10,
            ..Default::default()
        };
        assert_eq!(Metric::HomeMalaiseCarenceShare.evaluate(&t), 0.25);
    }

    #[test]
    fn test_evaluate_all_covers_table() {
        let values = evaluate_all(&CategoryTotals::default());
        assert_eq!(values.len(), Metric::ALL.len());
        assert!(values.iter().all(|v| v.value == 0.0));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Metric::ALL.iter().map(|m| m.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Metric::ALL.len());
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.125), "12.5%");
        assert_eq!(format_percent(0.0), "0.0%");
    }
}
