//! Filtering and aggregation of intervention records.
//!
//! This module turns the immutable dataset and a [`FilterSelection`] into
//! an [`AggregateResult`]. Every function here is pure: the same input
//! always produces the same output, down to the last bit of every ratio.

use crate::analysis::metrics::{evaluate_all, ratio, Metric};
use crate::filter::FilterSelection;
use crate::models::{
    AggregateResult, CategoryShare, CategoryTotals, DepartmentRanking, InterventionCategory,
    InterventionRecord, MetricDistribution, RegionComparison, TerritoryBreakdown, TerritoryType,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Select the records that pass the filter selection.
///
/// Returns an empty list when nothing matches; that is a valid state.
pub fn filter<'a>(
    dataset: &'a [InterventionRecord],
    selection: &FilterSelection,
) -> Vec<&'a InterventionRecord> {
    dataset.iter().filter(|r| selection.matches(r)).collect()
}

/// Compute every total, metric and comparison table for a subset.
pub fn aggregate(subset: &[&InterventionRecord]) -> AggregateResult {
    let totals = CategoryTotals::from_records(subset.iter().copied());
    let regions = compare_regions(subset);
    let carence_ranking = rank_regions_by_carence(&regions);

    AggregateResult {
        record_count: subset.len(),
        department_count: count_departments(subset),
        totals,
        metrics: evaluate_all(&totals),
        breakdown: category_breakdown(&totals),
        regions,
        carence_ranking,
        territories: territory_breakdown(subset),
    }
}

/// Shares of each top-level category in total interventions.
pub fn category_breakdown(totals: &CategoryTotals) -> Vec<CategoryShare> {
    InterventionCategory::ALL
        .iter()
        .map(|category| {
            let count = category.count(totals);
            CategoryShare {
                category: *category,
                count,
                share: ratio(count, totals.total_interventions),
            }
        })
        .collect()
}

/// Group by region and rank by total interventions (descending), breaking
/// ties by region name (ascending).
pub fn compare_regions(subset: &[&InterventionRecord]) -> Vec<RegionComparison> {
    let mut grouped: BTreeMap<String, (CategoryTotals, BTreeSet<String>)> = BTreeMap::new();

    for record in subset {
        let (totals, departments) = grouped
            .entry(record.region.label().to_string())
            .or_default();
        totals.add(record);
        departments.insert(record.department_label());
    }

    let mut regions: Vec<RegionComparison> = grouped
        .into_iter()
        .map(|(region, (totals, departments))| RegionComparison {
            region,
            department_count: departments.len(),
            medical_share: Metric::MedicalShare.evaluate(&totals),
            carence_rate: Metric::CarenceRate.evaluate(&totals),
            totals,
        })
        .collect();

    regions.sort_by(|a, b| {
        b.totals
            .total_interventions
            .cmp(&a.totals.total_interventions)
            .then_with(|| a.region.cmp(&b.region))
    });

    regions
}

/// Rank regions by carence rate (descending), breaking ties by region name
/// (ascending).
pub fn rank_regions_by_carence(regions: &[RegionComparison]) -> Vec<RegionComparison> {
    let mut ranked = regions.to_vec();

    ranked.sort_by(|a, b| {
        b.carence_rate
            .total_cmp(&a.carence_rate)
            .then_with(|| a.region.cmp(&b.region))
    });

    ranked
}

/// Totals and fire ratios per territory type.
///
/// Rows without a usable territory are grouped last.
pub fn territory_breakdown(subset: &[&InterventionRecord]) -> Vec<TerritoryBreakdown> {
    let mut grouped: BTreeMap<Option<TerritoryType>, CategoryTotals> = BTreeMap::new();

    for record in subset {
        grouped
            .entry(record.territory_type.as_value().copied())
            .or_default()
            .add(record);
    }

    let mut breakdown: Vec<TerritoryBreakdown> = grouped
        .into_iter()
        .map(|(territory, totals)| TerritoryBreakdown {
            territory,
            fire_share: Metric::FireShare.evaluate(&totals),
            habitation_fire_share: Metric::HabitationFireShare.evaluate(&totals),
            totals,
        })
        .collect();

    // `None` sorts first in a BTreeMap; show it after the known territories.
    breakdown.sort_by_key(|b| (b.territory.is_none(), b.territory));

    breakdown
}

/// Ranking key for department tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "key", content = "metric")]
pub enum DepartmentKey {
    TotalInterventions,
    MedicalAssistance,
    Fires,
    Carences,
    /// Any metric of the shared table.
    Metric(Metric),
}

impl DepartmentKey {
    /// Value of the key for one department's totals.
    pub fn value(&self, totals: &CategoryTotals) -> f64 {
        match self {
            DepartmentKey::TotalInterventions => totals.total_interventions as f64,
            DepartmentKey::MedicalAssistance => totals.medical_assistance as f64,
            DepartmentKey::Fires => totals.fires as f64,
            DepartmentKey::Carences => totals.carences as f64,
            DepartmentKey::Metric(metric) => metric.evaluate(totals),
        }
    }

    /// Whether the value is a ratio (rendered as a percentage).
    pub fn is_ratio(&self) -> bool {
        matches!(self, DepartmentKey::Metric(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DepartmentKey::TotalInterventions => "Total interventions",
            DepartmentKey::MedicalAssistance => "Medical assistance",
            DepartmentKey::Fires => "Fires",
            DepartmentKey::Carences => "Carences",
            DepartmentKey::Metric(metric) => metric.label(),
        }
    }
}

/// Group by department and rank by the given key (descending), breaking
/// ties by department name, then code (ascending). `limit` keeps the top N.
pub fn rank_departments(
    subset: &[&InterventionRecord],
    key: DepartmentKey,
    limit: Option<usize>,
) -> Vec<DepartmentRanking> {
    let mut grouped: BTreeMap<(String, String), (String, CategoryTotals)> = BTreeMap::new();

    for record in subset {
        let code = record
            .department_code
            .as_value()
            .cloned()
            .unwrap_or_default();
        let department = record.department.label().to_string();

        let (_, totals) = grouped
            .entry((code, department))
            .or_insert_with(|| (record.region.label().to_string(), CategoryTotals::default()));
        totals.add(record);
    }

    let mut ranking: Vec<DepartmentRanking> = grouped
        .into_iter()
        .map(|((code, department), (region, totals))| DepartmentRanking {
            value: key.value(&totals),
            code,
            department,
            region,
            totals,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.department.cmp(&b.department))
            .then_with(|| a.code.cmp(&b.code))
    });

    if let Some(n) = limit {
        ranking.truncate(n);
    }

    ranking
}

/// Mean, median, minimum and maximum of a metric column.
///
/// Returns `None` for an empty column.
pub fn metric_distribution(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    Some(MetricDistribution {
        mean: sorted.iter().sum::<f64>() / n as f64,
        median,
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Number of distinct departments in a subset.
fn count_departments(subset: &[&InterventionRecord]) -> usize {
    subset
        .iter()
        .map(|r| r.department_label())
        .collect::<BTreeSet<_>>()
        .len()
}
