// src/reports/mod.rs
pub mod acquire;
pub mod client;
pub mod models;

pub use acquire::acquire;
pub use client::HttpReportSource;
pub use models::{AcquisitionKey, AcquisitionResult};
