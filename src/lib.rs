//! ttk-sheet library: weapon spreadsheet extraction and time-to-kill metrics.
//!
//! Exposes sheet loading, extraction, the canonical model, metrics, optimizer,
//! store, diff and reports for use by the CLI and tests.

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod extract;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod report;
#[cfg(feature = "serve")]
pub mod serve;
pub mod sheet;
pub mod store;
pub mod util;
pub mod workbook;
