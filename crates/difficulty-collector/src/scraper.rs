//! Page fetching.
//!
//! [`Scraper`] is the seam between the controller and the network. The
//! production implementation is [`HttpScraper`]; tests script their own.

use difficulty_core::Score;
use rand::{Rng, seq::IndexedRandom};
use reqwest::{
  Client,
  header::{self, HeaderMap, HeaderValue},
};
use thiserror::Error;
use tracing::debug;

use crate::{config::ScraperConfig, extract::extract_score};

/// Browser user agents picked from when none is configured.
pub const USER_AGENTS: &[&str] = &[
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
  "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
  "Mozilla/5.0 (iPhone; CPU iPhone OS 17_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Mobile/15E148 Safari/604.1",
];

const REFERER: &str = "https://www.nytimes.com/crosswords";

// ─── Types ────────────────────────────────────────────────────────────────────

/// A fetched page body.
#[derive(Debug, Clone)]
pub struct Page {
  pub url:  String,
  pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
  /// The page was fetched but carries no difficulty rating.
  #[error("no difficulty score found at {url}")]
  NotFound { url: String, page: Option<Page> },

  /// Network failure or non-success status; worth retrying later.
  #[error("fetching {url} failed: {reason}")]
  Transient { url: String, reason: String },
}

pub trait Scraper {
  async fn fetch(&self, url: &str) -> Result<Page, FetchError>;

  /// Fetch `url` and pull the score out of it.
  async fn fetch_and_extract(&self, url: &str) -> Result<Score, FetchError> {
    let page = self.fetch(url).await?;
    debug!(url, bytes = page.body.len(), "parsing page");
    match extract_score(&page.body) {
      Some(score) => Ok(score),
      None => Err(FetchError::NotFound {
        url:  url.to_string(),
        page: Some(page),
      }),
    }
  }
}

// ─── HTTP implementation ──────────────────────────────────────────────────────

pub struct HttpScraper {
  client: Client,
  config: ScraperConfig,
}

impl HttpScraper {
  pub fn new(config: ScraperConfig) -> Result<Self, reqwest::Error> {
    let mut builder = Client::builder()
      .timeout(config.timeout())
      .default_headers(browser_headers());
    if let Some(proxy) = &config.proxy {
      builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(Self { client: builder.build()?, config })
  }

  fn user_agent(&self) -> &str {
    match &self.config.user_agent {
      Some(agent) => agent.as_str(),
      None => USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]),
    }
  }

  fn send_referer(&self) -> bool {
    rand::rng().random_bool(self.config.referer_rate.clamp(0.0, 1.0))
  }
}

impl Scraper for HttpScraper {
  async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
    let transient = |reason: String| FetchError::Transient {
      url: url.to_string(),
      reason,
    };

    let mut req = self.client.get(url).header(header::USER_AGENT, self.user_agent());
    if self.send_referer() {
      req = req.header(header::REFERER, REFERER);
    }

    debug!(url, "fetching page");
    let resp = req.send().await.map_err(|e| transient(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(transient(format!("status {status}")));
    }

    let body = resp.text().await.map_err(|e| transient(e.to_string()))?;
    Ok(Page { url: url.to_string(), body })
  }
}

fn browser_headers() -> HeaderMap {
  let mut headers = HeaderMap::new();
  headers.insert(
    header::ACCEPT,
    HeaderValue::from_static(
      "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
  );
  headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
  headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
  headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
  headers.insert(header::DNT, HeaderValue::from_static("1"));
  headers
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn configured_user_agent_is_fixed() {
    let config = ScraperConfig {
      user_agent: Some("difficulty-test/1.0".into()),
      ..Default::default()
    };
    let scraper = HttpScraper::new(config).unwrap();
    for _ in 0..10 {
      assert_eq!(scraper.user_agent(), "difficulty-test/1.0");
    }
  }

  #[test]
  fn rotated_user_agent_comes_from_pool() {
    let scraper = HttpScraper::new(ScraperConfig::default()).unwrap();
    for _ in 0..20 {
      assert!(USER_AGENTS.contains(&scraper.user_agent()));
    }
  }

  #[test]
  fn referer_rate_extremes() {
    let never = HttpScraper::new(ScraperConfig { referer_rate: 0.0, ..Default::default() }).unwrap();
    let always = HttpScraper::new(ScraperConfig { referer_rate: 1.0, ..Default::default() }).unwrap();
    for _ in 0..20 {
      assert!(!never.send_referer());
      assert!(always.send_referer());
    }
  }
}
