//! Dashboard report building.
//!
//! A [`DashboardReport`] gathers, for the requested pages, everything the
//! renderers need. All numbers come from the aggregation engine or the
//! quality report; the renderers only format them.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

use crate::analysis::{
    aggregate, metric_distribution, rank_departments, DepartmentKey, Metric,
    METRIC_TABLE_VERSION,
};
use crate::config::ReportConfig;
use crate::dataset::Dataset;
use crate::filter::FilterSelection;
use crate::models::{AggregateResult, DepartmentRanking, MetricDistribution};
use crate::quality::QualityReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A page of the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// National figures, unfiltered.
    Context,
    Overview,
    Medical,
    Fires,
    Geography,
    Quality,
    /// Every page above.
    #[default]
    All,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Context => write!(f, "Context"),
            Page::Overview => write!(f, "Overview"),
            Page::Medical => write!(f, "Medical emergencies"),
            Page::Fires => write!(f, "Fires"),
            Page::Geography => write!(f, "Geographic analysis"),
            Page::Quality => write!(f, "Data quality"),
            Page::All => write!(f, "All pages"),
        }
    }
}

impl Page {
    /// The concrete pages a selection expands to.
    pub fn expand(&self) -> Vec<Page> {
        match self {
            Page::All => vec![
                Page::Context,
                Page::Overview,
                Page::Medical,
                Page::Fires,
                Page::Geography,
                Page::Quality,
            ],
            page => vec![*page],
        }
    }
}

/// Metric shown on the geography page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum GeographyMetric {
    #[default]
    CarenceRate,
    Total,
    MedicalShare,
    Fires,
    /// Medical assistance count.
    Medical,
    Carences,
}

impl GeographyMetric {
    pub fn key(&self) -> DepartmentKey {
        match self {
            GeographyMetric::CarenceRate => DepartmentKey::Metric(Metric::CarenceRate),
            GeographyMetric::Total => DepartmentKey::TotalInterventions,
            GeographyMetric::MedicalShare => DepartmentKey::Metric(Metric::MedicalShare),
            GeographyMetric::Fires => DepartmentKey::Fires,
            GeographyMetric::Medical => DepartmentKey::MedicalAssistance,
            GeographyMetric::Carences => DepartmentKey::Carences,
        }
    }
}

/// Options controlling report content.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub page: Page,
    pub geography_metric: GeographyMetric,
    pub settings: ReportConfig,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            page: Page::All,
            geography_metric: GeographyMetric::default(),
            settings: ReportConfig::default(),
        }
    }
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dataset file, or `in-memory`.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub metric_table_version: u32,
    pub records_loaded: usize,
    pub records_selected: usize,
    pub filters: FilterSelection,
    pub filter_description: String,
    pub pages: Vec<Page>,
}

/// Thresholds used to annotate KPIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub carence_alert: f64,
    pub medical_highlight: f64,
}

/// Department table on the geography page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographyView {
    pub metric: GeographyMetric,
    pub key: DepartmentKey,
    /// Statistics over every department of the selection.
    pub distribution: Option<MetricDistribution>,
    /// Top departments for the metric.
    pub departments: Vec<DepartmentRanking>,
}

/// Everything rendered for one filter selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub thresholds: Thresholds,
    /// Whole-dataset aggregate for the context page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national: Option<AggregateResult>,
    /// Aggregate of the filtered selection.
    pub selection: AggregateResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_departments: Vec<DepartmentRanking>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_fire_departments: Vec<DepartmentRanking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geography: Option<GeographyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityReport>,
}

impl DashboardReport {
    /// Build the report for a selection.
    ///
    /// Runs one filter pass and one aggregation pass; the department
    /// rankings reuse the same filtered subset.
    pub fn build(
        dataset: &Dataset,
        selection: &FilterSelection,
        quality: &QualityReport,
        options: &ReportOptions,
    ) -> Self {
        let pages = options.page.expand();
        let wants = |page: Page| pages.contains(&page);

        let subset = dataset.select(selection);
        let result = aggregate(&subset);
        let settings = &options.settings;

        let national = wants(Page::Context).then(|| dataset.summarize(&FilterSelection::new()));

        let top_departments = if wants(Page::Overview) {
            rank_departments(
                &subset,
                DepartmentKey::TotalInterventions,
                Some(settings.top_departments),
            )
        } else {
            Vec::new()
        };

        let top_fire_departments = if wants(Page::Fires) {
            rank_departments(
                &subset,
                DepartmentKey::Fires,
                Some(settings.top_fire_departments),
            )
        } else {
            Vec::new()
        };

        let geography = wants(Page::Geography).then(|| {
            let key = options.geography_metric.key();
            let all_departments = rank_departments(&subset, key, None);
            let values: Vec<f64> = all_departments.iter().map(|d| d.value).collect();

            GeographyView {
                metric: options.geography_metric,
                key,
                distribution: metric_distribution(&values),
                departments: all_departments
                    .into_iter()
                    .take(settings.geography_top)
                    .collect(),
            }
        });

        let metadata = ReportMetadata {
            source: dataset
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in-memory".to_string()),
            generated_at: Utc::now(),
            metric_table_version: METRIC_TABLE_VERSION,
            records_loaded: dataset.len(),
            records_selected: result.record_count,
            filters: selection.clone(),
            filter_description: selection.describe(),
            pages: pages.clone(),
        };

        Self {
            metadata,
            thresholds: Thresholds {
                carence_alert: settings.carence_alert_threshold,
                medical_highlight: settings.medical_highlight_threshold,
            },
            national,
            selection: result,
            top_departments,
            top_fire_departments,
            geography,
            quality: wants(Page::Quality).then(|| quality.clone()),
        }
    }

    /// Whether a page is part of this report.
    pub fn includes(&self, page: Page) -> bool {
        self.metadata.pages.contains(&page)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::quality;
    use crate::test_utils::RecordBuilder;

    pub(crate) fn sample_dataset() -> Dataset {
        Dataset::from_records(vec![
            RecordBuilder::new("Bretagne", "Finistère")
                .code("29")
                .territory(crate::models::TerritoryType::Rural)
                .total(1000)
                .victim_rescue(300)
                .person_rescue(450)
                .fires(80)
                .habitation_fires(30)
                .traffic_accidents(60)
                .other_operations(110)
                .vital_emergencies(90)
                .carences(60)
                .build(),
            RecordBuilder::new("Bretagne", "Morbihan")
                .code("56")
                .territory(crate::models::TerritoryType::Mixed)
                .total(800)
                .victim_rescue(200)
                .person_rescue(380)
                .fires(70)
                .habitation_fires(20)
                .traffic_accidents(50)
                .other_operations(100)
                .vital_emergencies(70)
                .carences(30)
                .build(),
            RecordBuilder::new("Normandie", "Manche")
                .code("50")
                .territory(crate::models::TerritoryType::Rural)
                .total(600)
                .victim_rescue(150)
                .person_rescue(270)
                .fires(60)
                .habitation_fires(25)
                .traffic_accidents(40)
                .other_operations(80)
                .vital_emergencies(40)
                .carences(10)
                .build(),
        ])
    }

    pub(crate) fn sample_report(page: Page, selection: &FilterSelection) -> DashboardReport {
        let dataset = sample_dataset();
        let quality = quality::check(&dataset);
        let options = ReportOptions {
            page,
            ..Default::default()
        };

        DashboardReport::build(&dataset, selection, &quality, &options)
    }

    #[test]
    fn test_page_expand() {
        assert_eq!(Page::All.expand().len(), 6);
        assert_eq!(Page::Fires.expand(), vec![Page::Fires]);
    }

    #[test]
    fn test_build_all_pages() {
        let report = sample_report(Page::All, &FilterSelection::new());

        assert_eq!(report.metadata.records_loaded, 3);
        assert_eq!(report.metadata.records_selected, 3);
        assert_eq!(report.metadata.metric_table_version, METRIC_TABLE_VERSION);
        assert!(report.national.is_some());
        assert_eq!(report.top_departments[0].department, "Finistère");
        assert_eq!(report.top_fire_departments.len(), 3);
        assert!(report.quality.is_some());

        let geography = report.geography.unwrap();
        assert_eq!(geography.key, DepartmentKey::Metric(Metric::CarenceRate));
        assert_eq!(geography.departments[0].department, "Finistère");
        assert!(geography.distribution.is_some());
    }

    #[test]
    fn test_build_single_page_skips_others() {
        let report = sample_report(Page::Medical, &FilterSelection::new());

        assert!(report.includes(Page::Medical));
        assert!(!report.includes(Page::Overview));
        assert!(report.national.is_none());
        assert!(report.top_departments.is_empty());
        assert!(report.geography.is_none());
        assert!(report.quality.is_none());
    }

    #[test]
    fn test_national_ignores_filters() {
        let selection = FilterSelection::new().with_regions(["Normandie"]);
        let report = sample_report(Page::All, &selection);

        assert_eq!(report.selection.totals.total_interventions, 600);
        assert_eq!(
            report.national.unwrap().totals.total_interventions,
            2400
        );
    }

    #[test]
    fn test_geography_metric_keys() {
        assert_eq!(GeographyMetric::Total.key(), DepartmentKey::TotalInterventions);
        assert_eq!(GeographyMetric::Fires.key(), DepartmentKey::Fires);
        assert_eq!(
            GeographyMetric::MedicalShare.key(),
            DepartmentKey::Metric(Metric::MedicalShare)
        );
        assert_eq!(
            GeographyMetric::Medical.key(),
            DepartmentKey::MedicalAssistance
        );
        assert_eq!(GeographyMetric::Carences.key(), DepartmentKey::Carences);
    }

    #[test]
    fn test_geography_by_carence_count() {
        let dataset = sample_dataset();
        let quality = quality::check(&dataset);
        let options = ReportOptions {
            page: Page::Geography,
            geography_metric: GeographyMetric::Carences,
            ..Default::default()
        };

        let report = DashboardReport::build(&dataset, &FilterSelection::new(), &quality, &options);
        let geography = report.geography.unwrap();

        assert!(!geography.key.is_ratio());
        let values: Vec<f64> = geography.departments.iter().map(|d| d.value).collect();
        assert_eq!(values, vec![60.0, 30.0, 10.0]);
        assert_eq!(geography.distribution.unwrap().median, 30.0);
    }
}
