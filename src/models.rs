//! Data models for the intervention dashboard.
//!
//! This module contains the typed record schema loaded from the source
//! file, and the result structures produced by the aggregation engine
//! and consumed by the report generator.

use crate::analysis::metrics::{Metric, MetricValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown wherever a text value is absent from the source file.
pub const UNKNOWN_LABEL: &str = "Non renseigné";

/// A single parsed cell from the source file.
///
/// Malformed values are kept with their raw text so that they can be
/// counted by the quality pass instead of disappearing from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "value")]
pub enum Field<T> {
    /// A well-formed value.
    Value(T),
    /// The cell was empty or the column is absent.
    Missing,
    /// The cell could not be parsed; holds the raw text.
    Invalid(String),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> Field<T> {
    /// Returns the parsed value, if any.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl Field<u64> {
    /// Returns the count, reading missing and invalid cells as zero.
    pub fn count(&self) -> u64 {
        match self {
            Field::Value(v) => *v,
            _ => 0,
        }
    }
}

impl Field<String> {
    /// Returns the text, or [`UNKNOWN_LABEL`] when absent or invalid.
    pub fn label(&self) -> &str {
        match self {
            Field::Value(v) => v,
            _ => UNKNOWN_LABEL,
        }
    }
}

/// Territory classification of a department (`Zone` column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TerritoryType {
    Urban,
    Rural,
    Mixed,
}

impl fmt::Display for TerritoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerritoryType::Urban => write!(f, "Urban"),
            TerritoryType::Rural => write!(f, "Rural"),
            TerritoryType::Mixed => write!(f, "Mixed"),
        }
    }
}

impl TerritoryType {
    /// Parse a territory label as written in the source file.
    ///
    /// Accepts the French labels (`urbain`, `rurale`, `mixte`, ...) as well
    /// as the English ones. Suburban zones are classified as mixed.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['é', 'è'], "e");

        match normalized.as_str() {
            "urban" | "urbain" | "urbaine" | "u" => Some(TerritoryType::Urban),
            "rural" | "rurale" | "r" => Some(TerritoryType::Rural),
            "mixed" | "mixte" | "m" | "periurbain" | "periurbaine" | "peri-urbain" => {
                Some(TerritoryType::Mixed)
            }
            _ => None,
        }
    }
}

/// Military-operated brigades with their own reporting conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MilitaryUnit {
    /// Brigade de sapeurs-pompiers de Paris.
    Bspp,
    /// Bataillon de marins-pompiers de Marseille.
    Bmpm,
}

impl fmt::Display for MilitaryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilitaryUnit::Bspp => write!(f, "BSPP"),
            MilitaryUnit::Bmpm => write!(f, "BMPM"),
        }
    }
}

impl MilitaryUnit {
    /// Returns the full name of the brigade.
    pub fn full_name(&self) -> &'static str {
        match self {
            MilitaryUnit::Bspp => "Brigade de sapeurs-pompiers de Paris",
            MilitaryUnit::Bmpm => "Bataillon de marins-pompiers de Marseille",
        }
    }
}

/// One row of the source file: the interventions of one geographic unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterventionRecord {
    /// Reporting year (`Année`).
    pub year: Field<u16>,
    /// Administrative region.
    pub region: Field<String>,
    /// Department code (`Numéro`), zero-padded to two characters.
    pub department_code: Field<String>,
    /// Department name.
    pub department: Field<String>,
    /// Urban, rural or mixed territory.
    pub territory_type: Field<TerritoryType>,
    /// Demographic category of the SDIS (`Catégorie A`).
    pub demographic_category: Field<String>,
    /// Secours à victime.
    pub victim_rescue: Field<u64>,
    /// Secours à personne.
    pub person_rescue: Field<u64>,
    /// All fires.
    pub fires: Field<u64>,
    /// Fires in dwellings and offices, a subset of `fires`.
    pub habitation_fires: Field<u64>,
    pub traffic_accidents: Field<u64>,
    /// Home malaises handled as a vital emergency.
    pub vital_emergencies: Field<u64>,
    /// Home malaises handled in place of an unavailable ambulance.
    pub carences: Field<u64>,
    pub other_operations: Field<u64>,
    pub total_interventions: Field<u64>,
    /// Set when the row belongs to a military-operated brigade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_unit: Option<MilitaryUnit>,
}

impl InterventionRecord {
    /// Medical assistance count: victim rescue plus person rescue.
    pub fn medical_assistance(&self) -> u64 {
        self.victim_rescue
            .count()
            .saturating_add(self.person_rescue.count())
    }

    /// Sum of the top-level intervention categories.
    ///
    /// Carences and habitation fires are sub-counts of medical assistance
    /// and fires, so they are not added again.
    pub fn category_sum(&self) -> u64 {
        self.medical_assistance()
            .saturating_add(self.fires.count())
            .saturating_add(self.traffic_accidents.count())
            .saturating_add(self.other_operations.count())
    }

    /// Returns a short `code - name` label for the department.
    pub fn department_label(&self) -> String {
        match self.department_code.as_value() {
            Some(code) => format!("{} - {}", code, self.department.label()),
            None => self.department.label().to_string(),
        }
    }
}

/// Summed counts over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub total_interventions: u64,
    pub victim_rescue: u64,
    pub person_rescue: u64,
    /// Victim rescue plus person rescue.
    pub medical_assistance: u64,
    pub fires: u64,
    pub habitation_fires: u64,
    pub traffic_accidents: u64,
    pub vital_emergencies: u64,
    pub carences: u64,
    pub other_operations: u64,
}

impl CategoryTotals {
    /// Adds one record's counts.
    pub fn add(&mut self, record: &InterventionRecord) {
        self.total_interventions = self
            .total_interventions
            .saturating_add(record.total_interventions.count());
        self.victim_rescue = self
            .victim_rescue
            .saturating_add(record.victim_rescue.count());
        self.person_rescue = self
            .person_rescue
            .saturating_add(record.person_rescue.count());
        self.medical_assistance = self
            .medical_assistance
            .saturating_add(record.medical_assistance());
        self.fires = self.fires.saturating_add(record.fires.count());
        self.habitation_fires = self
            .habitation_fires
            .saturating_add(record.habitation_fires.count());
        self.traffic_accidents = self
            .traffic_accidents
            .saturating_add(record.traffic_accidents.count());
        self.vital_emergencies = self
            .vital_emergencies
            .saturating_add(record.vital_emergencies.count());
        self.carences = self.carences.saturating_add(record.carences.count());
        self.other_operations = self
            .other_operations
            .saturating_add(record.other_operations.count());
    }

    /// Creates totals from a list of records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InterventionRecord>,
    {
        let mut totals = Self::default();

        for record in records {
            totals.add(record);
        }

        totals
    }

    /// Evaluates a metric from the shared metric table on these totals.
    pub fn metric(&self, metric: Metric) -> f64 {
        metric.evaluate(self)
    }
}

/// Top-level intervention categories shown in the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCategory {
    VictimRescue,
    PersonRescue,
    Fires,
    TrafficAccidents,
    OtherOperations,
}

impl fmt::Display for InterventionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterventionCategory::VictimRescue => write!(f, "Victim rescue"),
            InterventionCategory::PersonRescue => write!(f, "Person rescue"),
            InterventionCategory::Fires => write!(f, "Fires"),
            InterventionCategory::TrafficAccidents => write!(f, "Traffic accidents"),
            InterventionCategory::OtherOperations => write!(f, "Other operations"),
        }
    }
}

impl InterventionCategory {
    pub const ALL: [InterventionCategory; 5] = [
        InterventionCategory::VictimRescue,
        InterventionCategory::PersonRescue,
        InterventionCategory::Fires,
        InterventionCategory::TrafficAccidents,
        InterventionCategory::OtherOperations,
    ];

    /// Returns an emoji representation of the category.
    pub fn emoji(&self) -> &'static str {
        match self {
            InterventionCategory::VictimRescue => "🚑",
            InterventionCategory::PersonRescue => "🏥",
            InterventionCategory::Fires => "🔥",
            InterventionCategory::TrafficAccidents => "🚗",
            InterventionCategory::OtherOperations => "🧰",
        }
    }

    /// Reads this category's count from summed totals.
    pub fn count(&self, totals: &CategoryTotals) -> u64 {
        match self {
            InterventionCategory::VictimRescue => totals.victim_rescue,
            InterventionCategory::PersonRescue => totals.person_rescue,
            InterventionCategory::Fires => totals.fires,
            InterventionCategory::TrafficAccidents => totals.traffic_accidents,
            InterventionCategory::OtherOperations => totals.other_operations,
        }
    }
}

/// One slice of the category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: InterventionCategory,
    pub count: u64,
    /// Share of total interventions, 0 when the total is zero.
    pub share: f64,
}

/// One row of the regional comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionComparison {
    pub region: String,
    pub department_count: usize,
    pub totals: CategoryTotals,
    pub medical_share: f64,
    pub carence_rate: f64,
}

/// Totals for one territory type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryBreakdown {
    /// `None` groups the rows whose territory is missing or invalid.
    pub territory: Option<TerritoryType>,
    pub totals: CategoryTotals,
    pub fire_share: f64,
    pub habitation_fire_share: f64,
}

impl TerritoryBreakdown {
    pub fn label(&self) -> String {
        self.territory
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}

/// One row of a department ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRanking {
    pub code: String,
    pub department: String,
    pub region: String,
    pub totals: CategoryTotals,
    /// Value of the ranking key for this department.
    pub value: f64,
}

/// Summary statistics of a per-department metric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDistribution {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Everything derived from one filtered subset.
///
/// Rebuilt from scratch on every filter change and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Number of records in the subset.
    pub record_count: usize,
    /// Number of distinct departments in the subset.
    pub department_count: usize,
    pub totals: CategoryTotals,
    /// Every metric of the shared metric table.
    pub metrics: Vec<MetricValue>,
    pub breakdown: Vec<CategoryShare>,
    /// Regions ranked by total interventions, then by name.
    pub regions: Vec<RegionComparison>,
    /// Regions ranked by carence rate, then by name.
    pub carence_ranking: Vec<RegionComparison>,
    pub territories: Vec<TerritoryBreakdown>,
}

impl AggregateResult {
    /// Returns true when no record matched the filters.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Returns the value of a metric, reading it from the computed table.
    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics
            .iter()
            .find(|m| m.metric == metric)
            .map(|m| m.value)
            .unwrap_or(0.0)
    }
}
