//! Data-quality checks.
//!
//! A single pass over the loaded dataset that counts anomalies and flags
//! special-case rows. Nothing is corrected or discarded: the dashboard
//! stays usable and the report explains what the totals are made of.

use crate::dataset::Dataset;
use crate::loader::Column;
use crate::models::{Field, InterventionRecord, MilitaryUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// How many raw invalid values are kept per column as examples.
const MAX_INVALID_SAMPLES: usize = 3;

/// Names and codes identifying the military-operated brigades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialUnitMarkers {
    /// Markers for the Paris brigade.
    pub bspp: Vec<String>,
    /// Markers for the Marseille battalion.
    pub bmpm: Vec<String>,
}

impl Default for SpecialUnitMarkers {
    fn default() -> Self {
        Self {
            bspp: vec!["BSPP".to_string(), "Sapeurs-pompiers de Paris".to_string()],
            bmpm: vec!["BMPM".to_string(), "Marins-pompiers de Marseille".to_string()],
        }
    }
}

impl SpecialUnitMarkers {
    /// Identify a military-operated brigade row.
    ///
    /// A marker matches when it equals the department code or appears in
    /// the department name, ignoring case.
    pub fn detect(&self, record: &InterventionRecord) -> Option<MilitaryUnit> {
        if Self::matches_any(&self.bspp, record) {
            Some(MilitaryUnit::Bspp)
        } else if Self::matches_any(&self.bmpm, record) {
            Some(MilitaryUnit::Bmpm)
        } else {
            None
        }
    }

    fn matches_any(markers: &[String], record: &InterventionRecord) -> bool {
        let code = record.department_code.as_value().map(|c| c.to_lowercase());
        let name = record.department.as_value().map(|n| n.to_lowercase());

        markers.iter().any(|marker| {
            let marker = marker.trim().to_lowercase();
            if marker.is_empty() {
                return false;
            }
            code.as_deref() == Some(marker.as_str())
                || name.as_deref().is_some_and(|n| n.contains(&marker))
        })
    }
}

/// The checks run by the quality pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    /// Expected column absent from the header.
    MissingColumns,
    /// Empty cells.
    MissingValues,
    /// Cells that could not be parsed.
    InvalidValues,
    /// Category sum larger than total interventions.
    CategorySumExceedsTotal,
    /// Carences larger than medical assistance.
    CarencesExceedMedical,
    /// Habitation fires larger than fires.
    HabitationFiresExceedFires,
    /// Military-operated brigade rows (annotation, not an anomaly).
    SpecialUnits,
}

impl fmt::Display for QualityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityCheck::MissingColumns => write!(f, "Missing columns"),
            QualityCheck::MissingValues => write!(f, "Missing values"),
            QualityCheck::InvalidValues => write!(f, "Invalid values"),
            QualityCheck::CategorySumExceedsTotal => write!(f, "Category sum exceeds total"),
            QualityCheck::CarencesExceedMedical => write!(f, "Carences exceed medical assistance"),
            QualityCheck::HabitationFiresExceedFires => write!(f, "Habitation fires exceed fires"),
            QualityCheck::SpecialUnits => write!(f, "Military-operated units"),
        }
    }
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 7] = [
        QualityCheck::MissingColumns,
        QualityCheck::MissingValues,
        QualityCheck::InvalidValues,
        QualityCheck::CategorySumExceedsTotal,
        QualityCheck::CarencesExceedMedical,
        QualityCheck::HabitationFiresExceedFires,
        QualityCheck::SpecialUnits,
    ];

    /// Whether a positive count of this check is a data anomaly.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, QualityCheck::SpecialUnits)
    }
}

/// Missing and invalid cell counts for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub column: Column,
    pub missing: usize,
    pub invalid: usize,
    /// A few raw invalid values, for the report.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_samples: Vec<String>,
}

/// A row breaking a sub-count invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAnomaly {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub department: String,
    /// The value the row should not exceed.
    pub limit: u64,
    pub actual: u64,
}

/// A row belonging to a military-operated brigade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialUnitRow {
    pub row: usize,
    pub department: String,
    pub region: String,
    pub unit: MilitaryUnit,
}

/// Result of the quality pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub record_count: usize,
    pub missing_columns: Vec<Column>,
    /// One entry per expected column.
    pub columns: Vec<ColumnQuality>,
    pub category_sum_violations: Vec<RowAnomaly>,
    pub carence_violations: Vec<RowAnomaly>,
    pub habitation_fire_violations: Vec<RowAnomaly>,
    pub special_units: Vec<SpecialUnitRow>,
}

impl QualityReport {
    /// Number of findings for a check.
    pub fn count(&self, check: QualityCheck) -> usize {
        match check {
            QualityCheck::MissingColumns => self.missing_columns.len(),
            QualityCheck::MissingValues => self.columns.iter().map(|c| c.missing).sum(),
            QualityCheck::InvalidValues => self.columns.iter().map(|c| c.invalid).sum(),
            QualityCheck::CategorySumExceedsTotal => self.category_sum_violations.len(),
            QualityCheck::CarencesExceedMedical => self.carence_violations.len(),
            QualityCheck::HabitationFiresExceedFires => self.habitation_fire_violations.len(),
            QualityCheck::SpecialUnits => self.special_units.len(),
        }
    }

    /// Counts for every check, in display order.
    pub fn summary(&self) -> Vec<(QualityCheck, usize)> {
        QualityCheck::ALL
            .iter()
            .map(|check| (*check, self.count(*check)))
            .collect()
    }

    /// Total number of anomalies (annotations excluded).
    pub fn anomaly_count(&self) -> usize {
        QualityCheck::ALL
            .iter()
            .filter(|check| check.is_anomaly())
            .map(|check| self.count(*check))
            .sum()
    }

    pub fn has_anomalies(&self) -> bool {
        self.anomaly_count() > 0
    }

    /// Columns with at least one missing or invalid cell.
    pub fn columns_with_issues(&self) -> impl Iterator<Item = &ColumnQuality> {
        self.columns.iter().filter(|c| c.missing > 0 || c.invalid > 0)
    }
}

/// Run every check over the dataset.
pub fn check(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport {
        record_count: dataset.len(),
        missing_columns: dataset.missing_columns().to_vec(),
        columns: Column::ALL
            .iter()
            .map(|column| ColumnQuality {
                column: *column,
                missing: 0,
                invalid: 0,
                invalid_samples: Vec::new(),
            })
            .collect(),
        ..Default::default()
    };

    for (index, record) in dataset.records().iter().enumerate() {
        let row = index + 1;
        count_cells(&mut report.columns, record);
        check_invariants(&mut report, row, record);

        if let Some(unit) = record.special_unit {
            debug!("Row {} flagged as {}", row, unit);
            report.special_units.push(SpecialUnitRow {
                row,
                department: record.department_label(),
                region: record.region.label().to_string(),
                unit,
            });
        }
    }

    let anomalies = report.anomaly_count();
    if anomalies > 0 {
        warn!(
            "Data quality: {} anomalies across {} records",
            anomalies, report.record_count
        );
    } else {
        info!("Data quality: no anomalies in {} records", report.record_count);
    }

    report
}

fn count_cells(columns: &mut [ColumnQuality], record: &InterventionRecord) {
    for quality in columns.iter_mut() {
        match cell_status(record, quality.column) {
            CellStatus::Missing => quality.missing += 1,
            CellStatus::Invalid(raw) => {
                quality.invalid += 1;
                if quality.invalid_samples.len() < MAX_INVALID_SAMPLES {
                    quality.invalid_samples.push(raw.to_string());
                }
            }
            CellStatus::Ok => {}
        }
    }
}

/// Sub-count invariants are only checked when every field involved holds a
/// parsed value; missing and invalid cells are already counted above.
fn check_invariants(report: &mut QualityReport, row: usize, record: &InterventionRecord) {
    let category_fields = [
        &record.victim_rescue,
        &record.person_rescue,
        &record.fires,
        &record.traffic_accidents,
        &record.other_operations,
    ];
    if let Field::Value(total) = record.total_interventions {
        if category_fields.iter().all(|f| f.as_value().is_some()) {
            let sum = record.category_sum();
            if sum > total {
                report.category_sum_violations.push(RowAnomaly {
                    row,
                    department: record.department_label(),
                    limit: total,
                    actual: sum,
                });
            }
        }
    }

    if let (Field::Value(carences), Some(_), Some(_)) = (
        &record.carences,
        record.victim_rescue.as_value(),
        record.person_rescue.as_value(),
    ) {
        let medical = record.medical_assistance();
        if *carences > medical {
            report.carence_violations.push(RowAnomaly {
                row,
                department: record.department_label(),
                limit: medical,
                actual: *carences,
            });
        }
    }

    if let (Field::Value(habitation), Field::Value(fires)) =
        (&record.habitation_fires, &record.fires)
    {
        if habitation > fires {
            report.habitation_fire_violations.push(RowAnomaly {
                row,
                department: record.department_label(),
                limit: *fires,
                actual: *habitation,
            });
        }
    }
}

enum CellStatus<'a> {
    Ok,
    Missing,
    Invalid(&'a str),
}

fn status<T>(field: &Field<T>) -> CellStatus<'_> {
    match field {
        Field::Value(_) => CellStatus::Ok,
        Field::Missing => CellStatus::Missing,
        Field::Invalid(raw) => CellStatus::Invalid(raw),
    }
}

fn cell_status(record: &InterventionRecord, column: Column) -> CellStatus<'_> {
    match column {
        Column::Year => status(&record.year),
        Column::Region => status(&record.region),
        Column::DepartmentCode => status(&record.department_code),
        Column::Department => status(&record.department),
        Column::TerritoryType => status(&record.territory_type),
        Column::DemographicCategory => status(&record.demographic_category),
        Column::VictimRescue => status(&record.victim_rescue),
        Column::PersonRescue => status(&record.person_rescue),
        Column::Fires => status(&record.fires),
        Column::HabitationFires => status(&record.habitation_fires),
        Column::TrafficAccidents => status(&record.traffic_accidents),
        Column::VitalEmergencies => status(&record.vital_emergencies),
        Column::Carences => status(&record.carences),
        Column::OtherOperations => status(&record.other_operations),
        Column::TotalInterventions => status(&record.total_interventions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordBuilder;

    fn column<'a>(report: &'a QualityReport, column: Column) -> &'a ColumnQuality {
        report
            .columns
            .iter()
            .find(|c| c.column == column)
            .unwrap()
    }

    #[test]
    fn test_clean_dataset_has_no_anomalies() {
        let dataset = Dataset::from_records(vec![RecordBuilder::new("A", "One")
            .code("01")
            .territory(crate::models::TerritoryType::Urban)
            .category("A")
            .total(100)
            .medical(80)
            .carences(10)
            .fires(5)
            .habitation_fires(2)
            .build()]);

        let report = check(&dataset);
        assert_eq!(report.record_count, 1);
        assert!(!report.has_anomalies());
        assert_eq!(report.anomaly_count(), 0);
    }

    #[test]
    fn test_category_sum_violation_is_flagged_not_dropped() {
        let dataset = Dataset::from_records(vec![
            RecordBuilder::new("A", "One").total(10).medical(8).fires(5).build(),
            RecordBuilder::new("A", "Two").total(10).medical(8).build(),
        ]);

        let report = check(&dataset);
        assert_eq!(report.category_sum_violations.len(), 1);
        assert_eq!(report.category_sum_violations[0].row, 1);
        assert_eq!(report.category_sum_violations[0].limit, 10);
        assert_eq!(report.category_sum_violations[0].actual, 13);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_sub_count_violations() {
        let dataset = Dataset::from_records(vec![RecordBuilder::new("A", "One")
            .total(100)
            .medical(5)
            .carences(9)
            .fires(3)
            .habitation_fires(4)
            .build()]);

        let report = check(&dataset);
        assert_eq!(report.count(QualityCheck::CarencesExceedMedical), 1);
        assert_eq!(report.count(QualityCheck::HabitationFiresExceedFires), 1);
        assert_eq!(report.count(QualityCheck::CategorySumExceedsTotal), 0);
    }

    #[test]
    fn test_missing_and_invalid_counts() {
        let mut record = RecordBuilder::new("A", "One").total(10).build();
        record.fires = Field::Invalid("12a".to_string());
        record.carences = Field::Missing;

        let report = check(&Dataset::from_records(vec![record]));

        let fires = column(&report, Column::Fires);
        assert_eq!(fires.invalid, 1);
        assert_eq!(fires.invalid_samples, vec!["12a"]);
        assert_eq!(column(&report, Column::Carences).missing, 1);
        assert!(report.count(QualityCheck::InvalidValues) >= 1);
        assert!(report.has_anomalies());
    }

    #[test]
    fn test_invariants_skip_unparsed_fields() {
        let mut record = RecordBuilder::new("A", "One").medical(50).build();
        record.total_interventions = Field::Invalid("?".to_string());

        let report = check(&Dataset::from_records(vec![record]));
        assert_eq!(report.count(QualityCheck::CategorySumExceedsTotal), 0);
    }

    #[test]
    fn test_special_units_are_annotations() {
        let dataset = Dataset::from_records(vec![
            RecordBuilder::new("Île-de-France", "BSPP")
                .code("75")
                .special_unit(MilitaryUnit::Bspp)
                .build(),
            RecordBuilder::new("PACA", "Var").code("83").build(),
        ]);

        let report = check(&dataset);
        assert_eq!(report.special_units.len(), 1);
        assert_eq!(report.special_units[0].unit, MilitaryUnit::Bspp);
        assert_eq!(report.special_units[0].department, "75 - BSPP");
        assert_eq!(report.count(QualityCheck::SpecialUnits), 1);
    }

    #[test]
    fn test_marker_detection() {
        let markers = SpecialUnitMarkers::default();

        let paris = RecordBuilder::new("Île-de-France", "BSPP - Paris").build();
        let marseille = RecordBuilder::new("PACA", "Bataillon de Marins-Pompiers de Marseille")
            .build();
        let var = RecordBuilder::new("PACA", "Var").code("83").build();

        assert_eq!(markers.detect(&paris), Some(MilitaryUnit::Bspp));
        assert_eq!(markers.detect(&marseille), Some(MilitaryUnit::Bmpm));
        assert_eq!(markers.detect(&var), None);

        let by_code = SpecialUnitMarkers {
            bspp: vec!["75".to_string()],
            bmpm: Vec::new(),
        };
        let seventy_five = RecordBuilder::new("Île-de-France", "Paris").code("75").build();
        assert_eq!(by_code.detect(&seventy_five), Some(MilitaryUnit::Bspp));
    }

    #[test]
    fn test_missing_columns_are_anomalies() {
        let dataset = Dataset::new(Vec::new(), None, vec![Column::TerritoryType]);
        let report = check(&dataset);

        assert_eq!(report.count(QualityCheck::MissingColumns), 1);
        assert!(report.has_anomalies());
    }
}
