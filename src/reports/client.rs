// src/reports/client.rs
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::reports::models::{AcquisitionKey, UrlScheme};
use crate::utils::error::FetchError;

/// Anything that can hand over the raw bytes of one report.
///
/// Implementations swallow ordinary fetch failures and return `None`.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, key: &AcquisitionKey) -> Option<Vec<u8>>;
}

/// Downloads reports over plain HTTP GET.
pub struct HttpReportSource {
    client: reqwest::Client,
    urls: UrlScheme,
    request_delay: Duration,
}

impl HttpReportSource {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            urls: UrlScheme::from_config(config),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Issues one GET; anything but 200 OK is an error.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/pdf,*/*")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            if status == StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url.to_string()));
            }
            return Err(FetchError::Http(status));
        }

        let body = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn fetch(&self, key: &AcquisitionKey) -> Option<Vec<u8>> {
        let candidates = self.urls.candidate_urls(key);
        let attempts = candidates.len();

        for url in candidates {
            match self.download(&url).await {
                Ok(bytes) => {
                    tracing::info!("Fetched report for {} from {}", key, url);
                    return Some(bytes);
                }
                Err(e) => tracing::debug!("No report for {} at {}: {}", key, url, e),
            }
        }

        tracing::warn!("Failed to fetch report for {} after {} attempt(s)", key, attempts);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn source_for(server: &mockito::ServerGuard) -> HttpReportSource {
        HttpReportSource::new(&SourceConfig {
            base_url: server.url(),
            request_delay_ms: 0,
            request_timeout_secs: 5,
            ..SourceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn latest_year_issues_exactly_one_request() {
        let mut server = mockito::Server::new_async().await;
        let direct = server
            .mock("GET", "/HostedData/AnnualReports/PDF/NASDAQ_AAPL_2022.pdf")
            .with_status(200)
            .with_body("%PDF-1.4 current")
            .expect(1)
            .create_async()
            .await;
        let archive = server
            .mock("GET", Matcher::Regex(r"^/HostedData/AnnualReportArchive/".to_string()))
            .expect(0)
            .create_async()
            .await;

        let bytes = source_for(&server).fetch(&AcquisitionKey::new("AAPL", "2022")).await;

        assert_eq!(bytes.as_deref(), Some(&b"%PDF-1.4 current"[..]));
        direct.assert_async().await;
        archive.assert_async().await;
    }

    #[tokio::test]
    async fn archive_search_stops_at_first_success() {
        let mut server = mockito::Server::new_async().await;
        let miss_a = server
            .mock("GET", "/HostedData/AnnualReportArchive/a/NASDAQ_AAPL_2020.pdf")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let miss_b = server
            .mock("GET", "/HostedData/AnnualReportArchive/b/NASDAQ_AAPL_2020.pdf")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let hit_c = server
            .mock("GET", "/HostedData/AnnualReportArchive/c/NASDAQ_AAPL_2020.pdf")
            .with_status(200)
            .with_body("%PDF-1.4 archived")
            .expect(1)
            .create_async()
            .await;
        let later = server
            .mock("GET", Matcher::Regex(r"^/HostedData/AnnualReportArchive/[d-z]/".to_string()))
            .expect(0)
            .create_async()
            .await;

        let bytes = source_for(&server).fetch(&AcquisitionKey::new("AAPL", "2020")).await;

        assert_eq!(bytes.as_deref(), Some(&b"%PDF-1.4 archived"[..]));
        miss_a.assert_async().await;
        miss_b.assert_async().await;
        hit_c.assert_async().await;
        later.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_archive_search_returns_none_after_26_requests() {
        let mut server = mockito::Server::new_async().await;
        let all = server
            .mock("GET", Matcher::Regex(r"^/HostedData/AnnualReportArchive/[a-z]/".to_string()))
            .with_status(404)
            .expect(26)
            .create_async()
            .await;

        let bytes = source_for(&server).fetch(&AcquisitionKey::new("AAPL", "2019")).await;

        assert!(bytes.is_none());
        all.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_success_codes_are_failures() {
        let mut server = mockito::Server::new_async().await;
        let partial = server
            .mock("GET", "/HostedData/AnnualReports/PDF/NASDAQ_MSFT_2022.pdf")
            .with_status(206)
            .with_body("partial")
            .expect(1)
            .create_async()
            .await;

        let bytes = source_for(&server).fetch(&AcquisitionKey::new("MSFT", "2022")).await;

        assert!(bytes.is_none());
        partial.assert_async().await;
    }

    /// Base URL of a local port that nothing listens on.
    fn unreachable_base_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    fn unreachable_source() -> HttpReportSource {
        HttpReportSource::new(&SourceConfig {
            base_url: unreachable_base_url(),
            request_delay_ms: 0,
            request_timeout_secs: 5,
            ..SourceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn refused_connection_for_latest_year_is_absent() {
        let bytes = unreachable_source().fetch(&AcquisitionKey::new("AAPL", "2022")).await;
        assert!(bytes.is_none());
    }

    #[tokio::test]
    async fn refused_connections_during_archive_search_are_absent() {
        let bytes = unreachable_source().fetch(&AcquisitionKey::new("AAPL", "2018")).await;
        assert!(bytes.is_none());
    }
}
