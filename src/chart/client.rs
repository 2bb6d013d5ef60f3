use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::page::parse_chart_page;
use super::types::ChartEntry;
use crate::config::SourceConfig;
use crate::date;
use crate::error::FetchError;

/// Where chart entries come from when the cache can't answer.
#[async_trait]
pub trait ChartSource: Send + Sync {
  /// Fetch the number one for a single date.
  async fn fetch(&self, date: NaiveDate) -> Result<ChartEntry, FetchError>;
}

/// Client for the official UK singles chart pages.
#[derive(Clone)]
pub struct OfficialChartsClient {
  client: reqwest::Client,
  base_url: Url,
}

impl OfficialChartsClient {
  pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().map_err(FetchError::Client)?;

    Ok(Self {
      client,
      base_url: Self::normalize_base(&config.base_url)?,
    })
  }

  /// Ensure the base ends in `/` so joining appends rather than replaces.
  fn normalize_base(base: &str) -> Result<Url, FetchError> {
    if base.ends_with('/') {
      Ok(Url::parse(base)?)
    } else {
      Ok(Url::parse(&format!("{}/", base))?)
    }
  }

  /// Chart page for `date`, e.g. `.../singles-chart/20200801/7501/`.
  pub fn chart_url(&self, date: NaiveDate) -> Result<Url, FetchError> {
    Ok(self
      .base_url
      .join(&format!("{}/7501/", date::date_path(date)))?)
  }
}

#[async_trait]
impl ChartSource for OfficialChartsClient {
  async fn fetch(&self, date: NaiveDate) -> Result<ChartEntry, FetchError> {
    let url = self.chart_url(date)?;
    debug!(%date, %url, "Fetching chart page");

    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|source| FetchError::Http { date, source })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
      return Err(FetchError::Status {
        date,
        status: status.as_u16(),
      });
    }

    let html = response
      .text()
      .await
      .map_err(|source| FetchError::Http { date, source })?;

    parse_chart_page(date, &html)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  /// Serve one canned HTTP response on a local port and return the base URL.
  async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 4096];
      let _ = socket.read(&mut buf).await;
      let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.unwrap();
    });

    format!("http://{}/charts/", addr)
  }

  fn aug_1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 8, 1).unwrap()
  }

  #[tokio::test]
  async fn test_fetch_non_200_is_status_error() {
    let base = serve_once("404 Not Found", "gone").await;

    let err = client(&base).fetch(aug_1()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
  }

  #[tokio::test]
  async fn test_fetch_partial_page_is_missing_element() {
    let base = serve_once("200 OK", "<html><body><p>maintenance</p></body></html>").await;

    let err = client(&base).fetch(aug_1()).await.unwrap_err();
    assert!(matches!(
      err,
      FetchError::MissingElement {
        element: "chart week",
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_fetch_refused_connection_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/charts/", addr))
      .fetch(aug_1())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Http { .. }));
    assert!(!err.is_layout_change());
  }

  #[tokio::test]
  async fn test_fetch_parses_chart_page() {
    let base = serve_once(
      "200 OK",
      r#"<p class="article-date">31 July 2020 - 6 August 2020</p>
        <table class="chart-positions"><tr><td>
          <div class="title-artist">
            <div class="title"><a>HEAD &amp; HEART</a></div>
            <div class="artist"><a>JOEL CORRY FT MNEK</a></div>
          </div>
        </td></tr></table>"#,
    )
    .await;

    let entry = client(&base).fetch(aug_1()).await.unwrap();
    assert_eq!(entry.track, "Head & Heart");
    assert_eq!(entry.artist, "Joel Corry Ft Mnek");
    assert_eq!(
      entry.chart_week_start,
      NaiveDate::from_ymd_opt(2020, 7, 31).unwrap()
    );
  }

  fn client(base_url: &str) -> OfficialChartsClient {
    OfficialChartsClient::new(&SourceConfig {
      base_url: base_url.to_string(),
      ..SourceConfig::default()
    })
    .unwrap()
  }

  #[test]
  fn test_chart_url() {
    let date = NaiveDate::from_ymd_opt(1990, 6, 5).unwrap();
    let url = client("https://www.officialcharts.com/charts/singles-chart/")
      .chart_url(date)
      .unwrap();
    assert_eq!(
      url.as_str(),
      "https://www.officialcharts.com/charts/singles-chart/19900605/7501/"
    );
  }

  #[test]
  fn test_chart_url_without_trailing_slash() {
    let date = NaiveDate::from_ymd_opt(2020, 12, 25).unwrap();
    let url = client("http://localhost:8080/charts").chart_url(date).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/charts/20201225/7501/");
  }

  #[test]
  fn test_invalid_base_url() {
    let result = OfficialChartsClient::new(&SourceConfig {
      base_url: "::nope".to_string(),
      ..SourceConfig::default()
    });
    assert!(matches!(result, Err(FetchError::Url(_))));
  }
}
