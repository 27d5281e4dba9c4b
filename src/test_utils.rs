//! Shared helpers for unit tests.

use crate::models::{Field, InterventionRecord, MilitaryUnit, TerritoryType};

/// Builds an [`InterventionRecord`] with every count set to zero.
pub(crate) struct RecordBuilder {
    record: InterventionRecord,
}

impl RecordBuilder {
    pub(crate) fn new(region: &str, department: &str) -> Self {
        Self {
            record: InterventionRecord {
                year: Field::Value(2023),
                region: Field::Value(region.to_string()),
                department: Field::Value(department.to_string()),
                victim_rescue: Field::Value(0),
                person_rescue: Field::Value(0),
                fires: Field::Value(0),
                habitation_fires: Field::Value(0),
                traffic_accidents: Field::Value(0),
                vital_emergencies: Field::Value(0),
                carences: Field::Value(0),
                other_operations: Field::Value(0),
                total_interventions: Field::Value(0),
                ..Default::default()
            },
        }
    }

    pub(crate) fn code(mut self, code: &str) -> Self {
        self.record.department_code = Field::Value(code.to_string());
        self
    }

    pub(crate) fn territory(mut self, territory: TerritoryType) -> Self {
        self.record.territory_type = Field::Value(territory);
        self
    }

    pub(crate) fn category(mut self, category: &str) -> Self {
        self.record.demographic_category = Field::Value(category.to_string());
        self
    }

    /// Sets medical assistance, counted entirely as victim rescue.
    pub(crate) fn medical(mut self, count: u64) -> Self {
        self.record.victim_rescue = Field::Value(count);
        self.record.person_rescue = Field::Value(0);
        self
    }

    pub(crate) fn victim_rescue(mut self, count: u64) -> Self {
        self.record.victim_rescue = Field::Value(count);
        self
    }

    pub(crate) fn person_rescue(mut self, count: u64) -> Self {
        self.record.person_rescue = Field::Value(count);
        self
    }

    pub(crate) fn fires(mut self, count: u64) -> Self {
        self.record.fires = Field::Value(count);
        self
    }

    pub(crate) fn habitation_fires(mut self, count: u64) -> Self {
        self.record.habitation_fires = Field::Value(count);
        self
    }

    pub(crate) fn traffic_accidents(mut self, count: u64) -> Self {
        self.record.traffic_accidents = Field::Value(count);
        self
    }

    pub(crate) fn vital_emergencies(mut self, count: u64) -> Self {
        self.record.vital_emergencies = Field::Value(count);
        self
    }

    pub(crate) fn carences(mut self, count: u64) -> Self {
        self.record.carences = Field::Value(count);
        self
    }

    pub(crate) fn other_operations(mut self, count: u64) -> Self {
        self.record.other_operations = Field::Value(count);
        self
    }

    pub(crate) fn total(mut self, count: u64) -> Self {
        self.record.total_interventions = Field::Value(count);
        self
    }

    pub(crate) fn special_unit(mut self, unit: MilitaryUnit) -> Self {
        self.record.special_unit = Some(unit);
        self
    }

    pub(crate) fn build(self) -> InterventionRecord {
        self.record
    }
}

/// The two-region dataset used across scenario tests.
pub(crate) fn two_region_dataset() -> Vec<InterventionRecord> {
    vec![
        RecordBuilder::new("A", "Alpha")
            .code("01")
            .total(100)
            .medical(80)
            .carences(10)
            .build(),
        RecordBuilder::new("B", "Bravo")
            .code("02")
            .total(50)
            .medical(40)
            .carences(20)
            .build(),
    ]
}
