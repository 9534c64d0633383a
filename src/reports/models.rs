// src/reports/models.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::config::SourceConfig;

/// Identifies one annual report: a company identifier and a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcquisitionKey {
    pub company: String,
    pub year: String,
}

impl AcquisitionKey {
    pub fn new(company: impl Into<String>, year: impl Into<String>) -> Self {
        Self { company: company.into(), year: year.into() }
    }
}

impl fmt::Display for AcquisitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.company, self.year)
    }
}

/// Builds report URLs following the annualreports.com hosting layout.
#[derive(Debug, Clone)]
pub struct UrlScheme {
    base_url: String,
    exchange: String,
    latest_year: String,
}

impl UrlScheme {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            exchange: config.exchange.clone(),
            latest_year: config.latest_year.clone(),
        }
    }

    pub fn is_latest(&self, key: &AcquisitionKey) -> bool {
        key.year == self.latest_year
    }

    fn file_name(&self, key: &AcquisitionKey) -> String {
        format!("{}_{}_{}.pdf", self.exchange, key.company, key.year)
    }

    /// URL of a current-year report.
    pub fn latest_url(&self, key: &AcquisitionKey) -> String {
        format!("{}/HostedData/AnnualReports/PDF/{}", self.base_url, self.file_name(key))
    }

    /// URL of an archived report under a single-letter directory.
    pub fn archive_url(&self, key: &AcquisitionKey, letter: char) -> String {
        format!(
            "{}/HostedData/AnnualReportArchive/{}/{}",
            self.base_url,
            letter,
            self.file_name(key)
        )
    }

    /// Every URL to try for `key`, in request order.
    pub fn candidate_urls(&self, key: &AcquisitionKey) -> Vec<String> {
        if self.is_latest(key) {
            vec![self.latest_url(key)]
        } else {
            ('a'..='z').map(|letter| self.archive_url(key, letter)).collect()
        }
    }
}

/// Extracted report text keyed by company and year.
///
/// Only documents whose extraction produced non-empty text are present.
#[derive(Debug, Default)]
pub struct AcquisitionResult {
    texts: HashMap<AcquisitionKey, String>,
}

impl AcquisitionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document; empty text is refused. Returns whether the key was stored.
    pub fn insert(&mut self, key: AcquisitionKey, text: String) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if self.texts.contains_key(&key) {
            tracing::warn!("Duplicate result for {}, keeping the first", key);
            return false;
        }
        self.texts.insert(key, text);
        true
    }

    pub fn get(&self, key: &AcquisitionKey) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &AcquisitionKey) -> bool {
        self.texts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Present keys in driving order: companies ascending, then years as given.
    pub fn ordered_keys(&self, companies: &BTreeSet<String>, years: &[String]) -> Vec<AcquisitionKey> {
        companies
            .iter()
            .flat_map(|company| years.iter().map(move |year| AcquisitionKey::new(company, year)))
            .filter(|key| self.contains(key))
            .collect()
    }
}
