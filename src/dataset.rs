//! The in-memory dataset.
//!
//! Loaded once per process and never mutated afterwards, so it can be
//! shared by reference with every view.

use crate::analysis::{aggregate, filter};
use crate::filter::FilterSelection;
use crate::loader::Column;
use crate::models::{AggregateResult, InterventionRecord, TerritoryType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Immutable set of intervention records.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<InterventionRecord>,
    source: Option<PathBuf>,
    missing_columns: Vec<Column>,
}

/// The values a user can pick from, per filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub territory_types: Vec<TerritoryType>,
    pub demographic_categories: Vec<String>,
}

impl Dataset {
    pub fn new(
        records: Vec<InterventionRecord>,
        source: Option<PathBuf>,
        missing_columns: Vec<Column>,
    ) -> Self {
        Self {
            records,
            source,
            missing_columns,
        }
    }

    /// Build a dataset from records already in memory.
    pub fn from_records(records: Vec<InterventionRecord>) -> Self {
        Self::new(records, None, Vec::new())
    }

    pub fn records(&self) -> &[InterventionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Path the dataset was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Expected columns that were absent from the file header.
    pub fn missing_columns(&self) -> &[Column] {
        &self.missing_columns
    }

    /// Records matching a selection.
    pub fn select(&self, selection: &FilterSelection) -> Vec<&InterventionRecord> {
        filter(&self.records, selection)
    }

    /// Filter then aggregate in one step.
    pub fn summarize(&self, selection: &FilterSelection) -> AggregateResult {
        aggregate(&self.select(selection))
    }

    /// Sorted distinct values per filter dimension, missing values excluded.
    pub fn filter_options(&self) -> FilterOptions {
        let mut regions = BTreeSet::new();
        let mut territory_types = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for record in &self.records {
            if let Some(region) = record.region.as_value() {
                regions.insert(region.clone());
            }
            if let Some(territory) = record.territory_type.as_value() {
                territory_types.insert(*territory);
            }
            if let Some(category) = record.demographic_category.as_value() {
                categories.insert(category.clone());
            }
        }

        FilterOptions {
            regions: regions.into_iter().collect(),
            territory_types: territory_types.into_iter().collect(),
            demographic_categories: categories.into_iter().collect(),
        }
    }
}
