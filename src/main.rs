// src/main.rs
mod analysis;
mod compare;
mod config;
mod extractors;
mod reports;
mod storage;
mod utils;

use clap::Parser;
use std::collections::BTreeSet;
use std::sync::Arc;

use analysis::sentiment::{ChunkScorer, VaderScorer};
use analysis::topics::LdaModeler;
use analysis::AnalysisPipeline;
use compare::TextEmbeddings;
use config::{AnalysisConfig, FailurePolicy};
use extractors::PdfTextExtractor;
use reports::HttpReportSource;
use storage::StorageManager;
use utils::AppError;

/// Sentiment, keyword and topic analysis of company annual reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Company identifiers (comma-separated), e.g. AAPL,MSFT
    #[arg(short, long, value_delimiter = ',', required = true)]
    companies: Vec<String>,

    /// Report years in analysis order (comma-separated), e.g. 2020,2021,2022
    #[arg(short, long, value_delimiter = ',', required = true)]
    years: Vec<String>,

    /// JSON configuration file (optional; defaults apply to missing fields)
    #[arg(long)]
    config: Option<String>,

    /// Number of concurrent download workers (overrides the config file)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Word-embedding text file for cross-year comparison (overrides the config file)
    #[arg(long)]
    embeddings: Option<String>,

    /// Output directory for result tables
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Compare each company's topics across years
    #[arg(long)]
    compare: bool,
}

impl Args {
    fn load_config(&self) -> Result<AnalysisConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.worker_pool_width = workers;
        }
        if let Some(path) = &self.embeddings {
            config.embedding_model_id = path.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "transformer")]
fn build_chunk_scorer(config: &AnalysisConfig) -> Result<Box<dyn ChunkScorer>, AppError> {
    let scorer = analysis::sentiment::BertChunkScorer::new(&config.sentiment_model_id)?;
    Ok(Box::new(scorer))
}

#[cfg(not(feature = "transformer"))]
fn build_chunk_scorer(config: &AnalysisConfig) -> Result<Box<dyn ChunkScorer>, AppError> {
    analysis::sentiment::ensure_supported_model(&config.sentiment_model_id)?;
    tracing::warn!(
        "Built without the `transformer` feature; scoring chunks with VADER instead of {}",
        config.sentiment_model_id
    );
    Ok(Box::new(analysis::sentiment::LexiconChunkScorer::new()))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments and configuration
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);
    let config = args.load_config()?;

    let companies: BTreeSet<String> = args
        .companies
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let years: Vec<String> = args
        .years
        .iter()
        .map(|y| y.trim().to_string())
        .filter(|y| !y.is_empty())
        .collect();
    if companies.is_empty() || years.is_empty() {
        return Err(AppError::Config("at least one company and one year are required".to_string()));
    }

    // 3. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 4. Acquire every report before any analysis starts
    let source = HttpReportSource::new(&config.source)
        .map_err(|e| AppError::Config(format!("Cannot build HTTP client: {}", e)))?;
    let acquired = reports::acquire(
        Arc::new(source),
        Arc::new(PdfTextExtractor::new()),
        &companies,
        &years,
        config.worker_pool_width,
    )
    .await;

    if acquired.is_empty() {
        return Err(AppError::Processing(format!(
            "No reports could be acquired for {} compan(ies) x {} year(s)",
            companies.len(),
            years.len()
        )));
    }

    // 5. Analyse each report sequentially
    let pipeline = AnalysisPipeline::new(
        &config,
        Box::new(VaderScorer::new()),
        build_chunk_scorer(&config)?,
        Box::new(LdaModeler::new(config.topics.clone())),
    );
    let table = tokio::task::block_in_place(|| pipeline.run(&acquired, &companies, &years))?;

    if table.is_empty() {
        return Err(AppError::Processing(format!(
            "Failed to analyse any of {} acquired report(s)",
            acquired.len()
        )));
    }

    // 6. Save results
    storage.save_table_json(&table)?;
    storage.save_table_csv(&table)?;

    // 7. Optional cross-year comparison
    if args.compare {
        match TextEmbeddings::from_file(&config.embedding_model_id) {
            Ok(embeddings) => {
                for company in table.companies() {
                    let matrix = compare::compare(company, &table, &embeddings);
                    storage.save_similarity(&matrix)?;
                }
            }
            Err(e) if config.on_capability_error == FailurePolicy::Skip => {
                tracing::error!("Skipping cross-year comparison: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Processing finished. Acquired: {}, analysed: {}, requested: {}",
        acquired.len(),
        table.len(),
        companies.len() * years.len()
    );

    Ok(())
}
