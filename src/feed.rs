use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::advisory::RawAdvisory;

/// IBM FLRT advisory feed for AIX and VIOS.
pub const FLRT_FEED_URL: &str = "https://esupport.ibm.com/customercare/flrt/doc?page=aparJSON";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the advisory feed from a local JSON file.
pub fn load_file(path: &Path) -> Result<Vec<RawAdvisory>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_feed(&contents)
}

/// Fetches the advisory feed over HTTP. Anything other than a 200 response
/// within the timeout budget is a hard error; there is no retry.
pub async fn fetch_remote(url: &str, insecure: bool) -> Result<Vec<RawAdvisory>> {
    if insecure {
        warn!("TLS certificate validation disabled");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("aixadv/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .danger_accept_invalid_certs(insecure)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        bail!("HTTP status code {status} returned from {url}");
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;
    parse_feed(&body)
}

fn parse_feed(body: &str) -> Result<Vec<RawAdvisory>> {
    let records: Vec<RawAdvisory> =
        serde_json::from_str(body).context("failed to parse advisory feed JSON")?;
    debug!(count = records.len(), "parsed advisory feed");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED_BODY: &str = r#"[{
        "type": "sec",
        "issued": "20240601",
        "updated": "null",
        "apAbstract": "Vulnerability in sendmail",
        "bulletinUrl": "https://example.com/bulletin",
        "downloadUrl": "https://example.com/download",
        "reboot": "no",
        "cvss": []
    }]"#;

    #[tokio::test]
    async fn fetch_parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_BODY))
            .mount(&server)
            .await;

        let records = fetch_remote(&server.uri(), false).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "sec");
    }

    #[tokio::test]
    async fn fetch_rejects_non_200_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetch_remote(&server.uri(), false).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn fetch_rejects_other_success_status() {
        // Success means exactly 200; even a 204 is treated as a failure.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = fetch_remote(&server.uri(), false).await.unwrap_err();
        assert!(err.to_string().contains("204"));
    }

    #[tokio::test]
    async fn fetch_reports_unreachable_endpoint() {
        let err = fetch_remote("http://127.0.0.1:1/feed", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("request to"));
    }

    #[tokio::test]
    async fn fetch_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"an array\"}"))
            .mount(&server)
            .await;

        let err = fetch_remote(&server.uri(), false).await.unwrap_err();
        assert!(err.to_string().contains("parse advisory feed"));
    }

    #[test]
    fn load_file_reads_feed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FEED_BODY.as_bytes()).unwrap();

        let records = load_file(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ap_abstract, "Vulnerability in sendmail");
    }

    #[test]
    fn load_file_reports_missing_file() {
        let err = load_file(Path::new("/nonexistent/feed.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn empty_feed_array_is_valid() {
        let records = parse_feed("[]").unwrap();
        assert!(records.is_empty());
    }
}
