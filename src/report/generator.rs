//! Markdown and JSON report generation.
//!
//! This module renders a [`DashboardReport`] page by page. Percentages
//! are read from the metric table values carried by the report.

use super::{DashboardReport, GeographyView, Page, ReportMetadata, Thresholds};
use crate::analysis::metrics::format_percent;
use crate::analysis::{DepartmentKey, Metric};
use crate::models::{AggregateResult, DepartmentRanking};
use crate::quality::{QualityCheck, QualityReport};
use anyhow::Result;

const NO_DATA_NOTICE: &str = "> ℹ️ No data for this filter combination.\n\n";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Fire & Rescue Interventions Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    for page in &report.metadata.pages {
        let section = match page {
            Page::Context => report
                .national
                .as_ref()
                .map(|national| generate_context_section(national, &report.metadata))
                .unwrap_or_default(),
            Page::Overview => generate_overview_section(report),
            Page::Medical => generate_medical_section(&report.selection, &report.thresholds),
            Page::Fires => generate_fires_section(report),
            Page::Geography => report
                .geography
                .as_ref()
                .map(|view| generate_geography_section(view, report.selection.is_empty()))
                .unwrap_or_default(),
            Page::Quality => report
                .quality
                .as_ref()
                .map(generate_quality_section)
                .unwrap_or_default(),
            Page::All => String::new(),
        };
        output.push_str(&section);
    }

    output.push_str(&generate_metric_table_section());
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Filters:** {}\n", metadata.filter_description));
    section.push_str(&format!(
        "- **Records:** {} selected of {}\n",
        metadata.records_selected, metadata.records_loaded
    ));
    section.push_str(&format!(
        "- **Metric table:** v{}\n",
        metadata.metric_table_version
    ));
    section.push('\n');

    section
}

/// National figures, independent of the filters.
fn generate_context_section(national: &AggregateResult, metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Context\n\n");
    section.push_str(&format!(
        "National figures over {} departments ({} records in `{}`).\n\n",
        national.department_count, metadata.records_loaded, metadata.source
    ));
    section.push_str("| 🚨 Interventions | 🏥 Medical share | 🔥 Fires |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        format_count(national.totals.total_interventions),
        format_percent(national.metric(Metric::MedicalShare)),
        format_count(national.totals.fires),
    ));

    section
}

/// Headline KPIs, category breakdown and rankings.
fn generate_overview_section(report: &DashboardReport) -> String {
    let result = &report.selection;
    let mut section = String::new();

    section.push_str("## Overview\n\n");

    if result.is_empty() {
        section.push_str(NO_DATA_NOTICE);
        return section;
    }

    let medical_share = result.metric(Metric::MedicalShare);
    let medical_note = if medical_share > report.thresholds.medical_highlight {
        " ↗"
    } else {
        ""
    };

    section.push_str("| 🚨 Total | 🏥 Medical | 🔥 Fires | 🚗 Traffic accidents |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {}{} | {} ({}) | {} ({}) |\n\n",
        format_count(result.totals.total_interventions),
        format_percent(medical_share),
        medical_note,
        format_count(result.totals.fires),
        format_percent(result.metric(Metric::FireShare)),
        format_count(result.totals.traffic_accidents),
        format_percent(result.metric(Metric::TrafficAccidentShare)),
    ));

    section.push_str("### Interventions by Type\n\n");
    section.push_str("| Category | Count | Share |\n");
    section.push_str("|:---|---:|---:|\n");
    for share in &result.breakdown {
        section.push_str(&format!(
            "| {} {} | {} | {} |\n",
            share.category.emoji(),
            share.category,
            format_count(share.count),
            format_percent(share.share)
        ));
    }
    section.push('\n');

    if !report.top_departments.is_empty() {
        section.push_str(&format!(
            "### Top {} Departments by Interventions\n\n",
            report.top_departments.len()
        ));
        section.push_str("| # | Department | Interventions | Medical | Fires |\n");
        section.push_str("|---:|:---|---:|---:|---:|\n");
        for (i, dept) in report.top_departments.iter().enumerate() {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                department_name(dept),
                format_count(dept.totals.total_interventions),
                format_count(dept.totals.medical_assistance),
                format_count(dept.totals.fires),
            ));
        }
        section.push('\n');
    }

    section.push_str("### Regional Comparison\n\n");
    section.push_str("| Region | Departments | Interventions | Medical share | Carence rate |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for region in &result.regions {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            region.region,
            region.department_count,
            format_count(region.totals.total_interventions),
            format_percent(region.medical_share),
            format_percent(region.carence_rate),
        ));
    }
    section.push('\n');

    section
}

/// Medical assistance and carences.
fn generate_medical_section(result: &AggregateResult, thresholds: &Thresholds) -> String {
    let mut section = String::new();

    section.push_str("## Medical Emergencies\n\n");

    if result.is_empty() {
        section.push_str(NO_DATA_NOTICE);
        return section;
    }

    let carence_rate = result.metric(Metric::CarenceRate);
    let status = if carence_rate > thresholds.carence_alert {
        "⚠️ Critical"
    } else {
        "✓ Acceptable"
    };

    section.push_str(
        "| 🚑 Victim rescue | 🏥 Person rescue | ⚠️ Vital emergencies | 📉 Carences | Carence rate |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} ({}) |\n\n",
        format_count(result.totals.victim_rescue),
        format_count(result.totals.person_rescue),
        format_count(result.totals.vital_emergencies),
        format_count(result.totals.carences),
        format_percent(carence_rate),
        status,
    ));

    section.push_str(&format!(
        "Medical assistance accounts for **{}** of interventions. \
         Carences represent **{}** of home malaises.\n\n",
        format_percent(result.metric(Metric::MedicalShare)),
        format_percent(result.metric(Metric::HomeMalaiseCarenceShare)),
    ));

    section.push_str("### Regions by Carence Rate\n\n");
    section.push_str("| # | Region | Carence rate | Carences | Medical assistance |\n");
    section.push_str("|---:|:---|---:|---:|---:|\n");
    for (i, region) in result.carence_ranking.iter().enumerate() {
        let flag = if region.carence_rate > thresholds.carence_alert {
            " ⚠️"
        } else {
            ""
        };
        section.push_str(&format!(
            "| {} | {}{} | {} | {} | {} |\n",
            i + 1,
            region.region,
            flag,
            format_percent(region.carence_rate),
            format_count(region.totals.carences),
            format_count(region.totals.medical_assistance),
        ));
    }
    section.push('\n');

    section
}

/// Fires, habitation fires and the territory breakdown.
fn generate_fires_section(report: &DashboardReport) -> String {
    let result = &report.selection;
    let mut section = String::new();

    section.push_str("## Fires\n\n");

    if result.is_empty() {
        section.push_str(NO_DATA_NOTICE);
        return section;
    }

    let other_fires = result
        .totals
        .fires
        .saturating_sub(result.totals.habitation_fires);

    section.push_str("| 🔥 Fires | 🏠 Habitation fires | Other fires | Fire share | Habitation / fires |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        format_count(result.totals.fires),
        format_count(result.totals.habitation_fires),
        format_count(other_fires),
        format_percent(result.metric(Metric::FireShare)),
        format_percent(result.metric(Metric::HabitationFireShare)),
    ));

    if !report.top_fire_departments.is_empty() {
        section.push_str(&format!(
            "### Top {} Departments by Fires\n\n",
            report.top_fire_departments.len()
        ));
        section.push_str("| # | Department | Fires | Habitation fires |\n");
        section.push_str("|---:|:---|---:|---:|\n");
        for (i, dept) in report.top_fire_departments.iter().enumerate() {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                i + 1,
                department_name(dept),
                format_count(dept.totals.fires),
                format_count(dept.totals.habitation_fires),
            ));
        }
        section.push('\n');
    }

    section.push_str("### Fires by Territory\n\n");
    section.push_str("| Territory | Fires | Habitation fires | Interventions | Fire share |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for territory in &result.territories {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            territory.label(),
            format_count(territory.totals.fires),
            format_count(territory.totals.habitation_fires),
            format_count(territory.totals.total_interventions),
            format_percent(territory.fire_share),
        ));
    }
    section.push('\n');

    section
}

/// Per-department metric table with summary statistics.
fn generate_geography_section(view: &GeographyView, no_data: bool) -> String {
    let mut section = String::new();

    section.push_str("## Geographic Analysis\n\n");

    if no_data {
        section.push_str(NO_DATA_NOTICE);
        return section;
    }

    let label = view.key.label();
    section.push_str(&format!("Metric: **{}**\n\n", label));

    if let Some(dist) = view.distribution {
        section.push_str("| Mean | Median | Maximum | Minimum |\n");
        section.push_str("|:---:|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n\n",
            format_key_value(&view.key, dist.mean),
            format_key_value(&view.key, dist.median),
            format_key_value(&view.key, dist.max),
            format_key_value(&view.key, dist.min),
        ));
    }

    section.push_str(&format!(
        "| Code | Department | Interventions | Medical | Fires | Medical share | {} |\n",
        label
    ));
    section.push_str("|:---|:---|---:|---:|---:|---:|---:|\n");
    for dept in &view.departments {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            dept.code,
            dept.department,
            format_count(dept.totals.total_interventions),
            format_count(dept.totals.medical_assistance),
            format_count(dept.totals.fires),
            format_percent(dept.totals.metric(Metric::MedicalShare)),
            format_key_value(&view.key, dept.value),
        ));
    }
    section.push('\n');

    section
}

/// Anomaly counts and flagged rows.
fn generate_quality_section(quality: &QualityReport) -> String {
    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str(&format!(
        "{} records checked, {} anomalies found.\n\n",
        quality.record_count,
        quality.anomaly_count()
    ));

    section.push_str("| Check | Count |\n");
    section.push_str("|:---|---:|\n");
    for (check, count) in quality.summary() {
        section.push_str(&format!("| {} | {} |\n", check, count));
    }
    section.push('\n');

    if !quality.missing_columns.is_empty() {
        section.push_str("### Missing Columns\n\n");
        for column in &quality.missing_columns {
            section.push_str(&format!("- `{}`\n", column.header()));
        }
        section.push('\n');
    }

    let columns: Vec<_> = quality.columns_with_issues().collect();
    if !columns.is_empty() {
        section.push_str("### Missing and Invalid Values\n\n");
        section.push_str("| Column | Missing | Invalid | Examples |\n");
        section.push_str("|:---|---:|---:|:---|\n");
        for column in columns {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                column.column.header(),
                column.missing,
                column.invalid,
                column
                    .invalid_samples
                    .iter()
                    .map(|s| format!("`{}`", s))
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }
        section.push('\n');
    }

    for (check, rows) in [
        (
            QualityCheck::CategorySumExceedsTotal,
            &quality.category_sum_violations,
        ),
        (QualityCheck::CarencesExceedMedical, &quality.carence_violations),
        (
            QualityCheck::HabitationFiresExceedFires,
            &quality.habitation_fire_violations,
        ),
    ] {
        if rows.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", check));
        section.push_str("| Row | Department | Limit | Actual |\n");
        section.push_str("|---:|:---|---:|---:|\n");
        for row in rows {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.row,
                row.department,
                format_count(row.limit),
                format_count(row.actual),
            ));
        }
        section.push('\n');
    }

    if !quality.special_units.is_empty() {
        section.push_str("### Military-Operated Units\n\n");
        section.push_str(
            "These rows follow their own reporting conventions and are kept in every total.\n\n",
        );
        for unit in &quality.special_units {
            section.push_str(&format!(
                "- **{}** ({}): row {}, {} / {}\n",
                unit.unit,
                unit.unit.full_name(),
                unit.row,
                unit.department,
                unit.region
            ));
        }
        section.push('\n');
    }

    section
}

/// Appendix listing every metric formula.
fn generate_metric_table_section() -> String {
    let mut section = String::new();

    section.push_str("## Metric Definitions\n\n");
    section.push_str("| Metric | Formula |\n");
    section.push_str("|:---|:---|\n");
    for metric in Metric::ALL {
        section.push_str(&format!(
            "| `{}` | {} |\n",
            metric.name(),
            metric.formula()
        ));
    }
    section.push_str("\nA ratio with a zero denominator is reported as 0%. ");
    section.push_str(
        "Ratios are capped at 100%; rows whose numerator exceeds its \
         denominator are listed on the data quality page.\n\n",
    );

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Source: Ministère de l'Intérieur, data.gouv.fr*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn department_name(dept: &DepartmentRanking) -> String {
    if dept.code.is_empty() {
        dept.department.clone()
    } else {
        format!("{} - {}", dept.code, dept.department)
    }
}

fn format_key_value(key: &DepartmentKey, value: f64) -> String {
    if key.is_ratio() {
        format_percent(value)
    } else {
        format!("{:.1}", value)
    }
}

/// Format a count with spaces as thousands separators (`1 234 567`).
fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }

    out
}
