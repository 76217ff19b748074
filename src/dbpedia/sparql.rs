//! SPARQL endpoint client with retry, exponential backoff and timeout.

use super::client::{Binding, KnowledgeGraphClient, QueryError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Public DBpedia endpoint
pub const DEFAULT_ENDPOINT: &str = "https://dbpedia.org/sparql";

/// Configuration of the SPARQL transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparqlConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff in milliseconds (doubles each retry)
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl SparqlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// `application/sparql-results+json` document
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// Parse a SPARQL JSON results document into bindings.
pub fn parse_results(body: &str) -> Result<Vec<Binding>, QueryError> {
    let response: SparqlResponse = serde_json::from_str(body)
        .map_err(|e| QueryError::Permanent(format!("unreadable results: {e}")))?;

    Ok(response
        .results
        .bindings
        .into_iter()
        .map(|row| row.into_iter().map(|(var, v)| (var, v.value)).collect())
        .collect())
}

/// HTTP client for a SPARQL endpoint.
#[derive(Debug)]
pub struct SparqlClient {
    config: SparqlConfig,
    http: reqwest::Client,
}

impl SparqlClient {
    pub fn new(config: SparqlConfig) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| QueryError::Permanent(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SparqlConfig {
        &self.config
    }

    async fn attempt(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[("query", query), ("format", "application/sparql-results+json")])
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| QueryError::Recoverable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QueryError::Recoverable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Permanent(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Recoverable(e.to_string()))?;
        parse_results(&body)
    }
}

#[async_trait]
impl KnowledgeGraphClient for SparqlClient {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
        let mut backoff = self.config.initial_backoff();
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "sparql: retry attempt {}/{} after {:?}",
                    attempt,
                    self.config.max_retries,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.config.max_backoff());
            }

            match self.attempt(query).await {
                Ok(bindings) => return Ok(bindings),
                Err(QueryError::Recoverable(reason)) => last_err = reason,
                Err(permanent) => return Err(permanent),
            }
        }

        Err(QueryError::Recoverable(format!(
            "all {} retries exhausted: {last_err}",
            self.config.max_retries
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const RESULTS: &str = r#"{"head": {"vars": ["subject"]}, "results": {"bindings": [
        {"subject": {"type": "uri", "value": "http://dbpedia.org/resource/Category:Machine_learning"}}
    ]}}"#;

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/sparql-results+json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Local endpoint answering with `replies` in order, then repeating the
    /// last one. Returns its URL and the number of requests served.
    async fn endpoint(replies: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = Arc::new(AtomicUsize::new(0));
        let counter = served.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request: Vec<u8> = Vec::new();
                let mut buf = [0u8; 4096];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let response = &replies[n.min(replies.len() - 1)];
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/sparql"), served)
    }

    fn fast_client(endpoint: String, max_retries: u32) -> SparqlClient {
        SparqlClient::new(SparqlConfig {
            endpoint,
            timeout_secs: 5,
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn server_error_is_retried() {
        let (url, served) = endpoint(vec![
            reply("503 Service Unavailable", ""),
            reply("200 OK", RESULTS),
        ])
        .await;
        let client = fast_client(url, 3);

        let bindings = client.select("SELECT ?subject WHERE {}").await.unwrap();

        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings[0]["subject"],
            "http://dbpedia.org/resource/Category:Machine_learning"
        );
        assert_eq!(served.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let (url, served) = endpoint(vec![reply("400 Bad Request", "malformed query")]).await;
        let client = fast_client(url, 3);

        let err = client.select("SELECT").await.unwrap_err();

        assert!(matches!(err, QueryError::Permanent(ref msg) if msg.contains("400")));
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let (url, served) = endpoint(vec![reply("503 Service Unavailable", "")]).await;
        let client = fast_client(url, 2);

        let err = client.select("SELECT ?subject WHERE {}").await.unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn parses_bindings() {
        let body = r#"{
            "head": {"vars": ["broader", "related"]},
            "results": {"bindings": [
                {"broader": {"type": "uri", "value": "http://dbpedia.org/resource/Category:Artificial_intelligence"}},
                {"related": {"type": "uri", "value": "http://dbpedia.org/resource/Category:Statistics"}}
            ]}
        }"#;

        let bindings = parse_results(body).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(
            bindings[1]["related"],
            "http://dbpedia.org/resource/Category:Statistics"
        );
    }

    #[test]
    fn unreadable_results_are_permanent() {
        let err = parse_results("<html>").unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn default_config() {
        let config = SparqlConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_backoff(), Duration::from_secs(30));
    }
}
