//! Exploration dashboard and PDF report for a global space missions dataset.
//!
//! The loader turns a CSV file into an immutable [`loader::Dataset`];
//! [`reports::Analysis`] computes every aggregation once; [`figures`]
//! turns those into chart descriptions that both the HTML page
//! ([`page`], served by [`http`]) and the PDF report ([`report`], [`pdf`])
//! draw through [`render`].

pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod figures;
pub mod http;
pub mod loader;
pub mod narrative;
pub mod output;
pub mod page;
pub mod pdf;
pub mod render;
pub mod report;
pub mod reports;
pub mod types;
pub mod util;
