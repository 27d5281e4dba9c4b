//! Core of a dashboard over the yearly fire-and-rescue (SDIS) intervention
//! statistics published by the French Ministry of the Interior.
//!
//! One row of the source file describes the activity of one department's
//! fire-and-rescue service: counts per intervention category plus the
//! department's region, territory type and demographic category.
//!
//! The crate is organised as a pipeline:
//!
//! * [`loader`] reads the semicolon-separated file into a [`Dataset`],
//!   keeping missing and malformed cells visible instead of dropping rows.
//! * [`filter`] selects records by region, territory type and demographic
//!   category.
//! * [`analysis`] sums counts over a selection and derives every ratio from
//!   a single metric table.
//! * [`quality`] reports anomalies in the raw data.
//! * [`report`] assembles dashboard pages and renders them as Markdown or
//!   JSON.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod quality;
pub mod report;
#[cfg(test)]
pub mod test_utils;

pub use analysis::{aggregate, Metric};
pub use dataset::Dataset;
pub use error::LoadError;
pub use filter::FilterSelection;
pub use models::{AggregateResult, InterventionRecord};
