// src/analysis/mod.rs
pub mod keywords;
pub mod pipeline;
pub mod sentiment;
pub mod table;
pub mod text;
pub mod topics;

pub use pipeline::AnalysisPipeline;
pub use table::ResultTable;
