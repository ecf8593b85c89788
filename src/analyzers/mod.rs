//! Concentration analysis.
//!
//! This module classifies PM2.5 readings into severity classes, rolls hourly
//! records up into monthly and daily means, and compares the national
//! stations of each city against the reference monitor.

pub mod aggregate;
pub mod reconcile;
pub mod severity;
pub mod types;
pub mod utility;
