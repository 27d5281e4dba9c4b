//! User filter selection.
//!
//! A [`FilterSelection`] is a plain value: the current session owns it and
//! hands it to [`crate::analysis::filter`] every time it changes.

use crate::models::{Field, InterventionRecord, TerritoryType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The regions, territory types and demographic categories selected by the
/// user. An empty set means the dimension is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub regions: BTreeSet<String>,
    #[serde(default)]
    pub territory_types: BTreeSet<TerritoryType>,
    #[serde(default)]
    pub demographic_categories: BTreeSet<String>,
}

impl FilterSelection {
    /// A selection with no filter on any dimension.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_territory_types<I>(mut self, territory_types: I) -> Self
    where
        I: IntoIterator<Item = TerritoryType>,
    {
        self.territory_types = territory_types.into_iter().collect();
        self
    }

    pub fn with_demographic_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.demographic_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true when no dimension is filtered.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.territory_types.is_empty()
            && self.demographic_categories.is_empty()
    }

    /// Check whether a record passes the selection.
    ///
    /// Dimensions combine with AND; values within a dimension combine with
    /// OR. A missing or invalid value never matches a filtered dimension.
    pub fn matches(&self, record: &InterventionRecord) -> bool {
        matches_dimension(&self.regions, &record.region)
            && matches_dimension(&self.territory_types, &record.territory_type)
            && matches_dimension(&self.demographic_categories, &record.demographic_category)
    }

    /// One-line description of the selection, for report headers.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "All records (no filter)".to_string();
        }

        let mut parts = Vec::new();

        if !self.regions.is_empty() {
            parts.push(format!("Region: {}", join(&self.regions)));
        }
        if !self.territory_types.is_empty() {
            parts.push(format!("Territory: {}", join(&self.territory_types)));
        }
        if !self.demographic_categories.is_empty() {
            parts.push(format!("Category: {}", join(&self.demographic_categories)));
        }

        parts.join(" | ")
    }
}

fn matches_dimension<T: Ord>(selected: &BTreeSet<T>, value: &Field<T>) -> bool {
    if selected.is_empty() {
        return true;
    }

    value.as_value().is_some_and(|v| selected.contains(v))
}

fn join<T: std::fmt::Display>(values: &BTreeSet<T>) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
