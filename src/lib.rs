//! NovaMart marketing analytics dashboard.
//!
//! Loads the pre-computed CSV datasets once, derives per-page summary tables,
//! evaluates the lead-scoring classifier and renders seven navigable pages as
//! HTML with Plotly figures.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod filter;
pub mod frame;
pub mod logging;
pub mod nav;
pub mod pages;
pub mod render;
pub mod server;

pub use config::DashboardConfig;
pub use data::{load_dataset, DataSet};
pub use error::DashboardError;
pub use nav::PageId;
