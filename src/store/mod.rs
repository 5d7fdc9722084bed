use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::query::{self, QueryRequest, QueryResult};
use crate::record::Record;

pub const DEFAULT_TIMEOUT_SECONDS: usize = 10;

#[derive(Clone, Debug)]
pub enum RecordSource {
    /// JSON payload embedded by the caller.
    Inline(String),
    FilePath(String),
    Url(String),
    Records(Vec<Record>),
}

impl RecordSource {
    pub fn describe(&self) -> String {
        match self {
            RecordSource::Inline(_) => "inline payload".to_string(),
            RecordSource::FilePath(path) => format!("file {path}"),
            RecordSource::Url(url) => format!("url {url}"),
            RecordSource::Records(records) => format!("{} in-memory records", records.len()),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read records file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch records: {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("records endpoint answered with status {status}: {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed records payload: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("records payload must be an array or an object with a 'products' array")]
    UnexpectedShape,
}

/// Parses a records payload: either a bare JSON array or an object holding
/// the array under `products`.
pub fn parse_payload(text: &str) -> Result<Vec<Record>, LoadError> {
    let value: Value = serde_json::from_str(text).map_err(|e| LoadError::Parse { source: e })?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("products") {
            Some(Value::Array(items)) => items,
            _ => return Err(LoadError::UnexpectedShape),
        },
        _ => return Err(LoadError::UnexpectedShape),
    };
    Ok(items.iter().map(Record::from_value).collect())
}

pub async fn load_records(
    source: &RecordSource,
    timeout: Duration,
) -> Result<Vec<Record>, LoadError> {
    match source {
        RecordSource::Inline(text) => parse_payload(text),
        RecordSource::Records(records) => Ok(records.clone()),
        RecordSource::FilePath(path) => {
            let path = crate::config::expand_tilde(path);
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| LoadError::FileRead {
                    path: path.display().to_string(),
                    source: e,
                })?;
            parse_payload(&text)
        }
        RecordSource::Url(url) => {
            let client = build_client(timeout)?;
            let response = client.get(url).send().await.map_err(|e| LoadError::Fetch {
                url: url.clone(),
                source: e,
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::HttpStatus {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            let text = response.text().await.map_err(|e| LoadError::Fetch {
                url: url.clone(),
                source: e,
            })?;
            parse_payload(&text)
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, LoadError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("prodlist/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout)
        .build()
        .map_err(|e| LoadError::HttpClientBuild { source: e })
}

/// Product records, loaded from their source on first use.
///
/// The first query triggers the load while holding the store lock, so
/// concurrent queries wait for it instead of fetching twice. A failed load
/// leaves the store empty; queries then answer with no data rather than an
/// error until [`RecordStore::reload`] succeeds.
#[derive(Debug)]
pub struct RecordStore {
    source: RecordSource,
    timeout: Duration,
    records: Mutex<Option<Arc<[Record]>>>,
}

impl RecordStore {
    pub fn new(source: RecordSource) -> Self {
        Self::with_timeout(source, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS as u64))
    }

    pub fn with_timeout(source: RecordSource, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            records: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    pub async fn is_loaded(&self) -> bool {
        self.records.lock().await.is_some()
    }

    /// Number of loaded records; 0 before the first load.
    pub async fn record_count(&self) -> usize {
        self.records
            .lock()
            .await
            .as_ref()
            .map(|r| r.len())
            .unwrap_or(0)
    }

    /// Loaded records, loading them first if needed.
    pub async fn snapshot(&self) -> Arc<[Record]> {
        let mut guard = self.records.lock().await;
        if let Some(records) = guard.as_ref() {
            return Arc::clone(records);
        }
        let records = self.load().await;
        *guard = Some(Arc::clone(&records));
        records
    }

    pub async fn query(&self, req: &QueryRequest) -> QueryResult {
        let records = self.snapshot().await;
        let result = query::query(&records, req);
        tracing::debug!(
            page = req.page(),
            limit = req.limit(),
            search = %req.search,
            sort_field = ?req.sort_field,
            sort_dir = ?req.sort_dir,
            returned = result.data.len(),
            total = result.total,
            "query"
        );
        result
    }

    /// Loads the records again, replacing whatever was loaded before.
    /// Returns the new record count.
    pub async fn reload(&self) -> usize {
        let mut guard = self.records.lock().await;
        let records = self.load().await;
        let count = records.len();
        *guard = Some(records);
        count
    }

    async fn load(&self) -> Arc<[Record]> {
        let what = self.source.describe();
        tracing::info!(source = %what, "loading records");
        match load_records(&self.source, self.timeout).await {
            Ok(records) => {
                tracing::info!(source = %what, count = records.len(), "records loaded");
                Arc::from(records)
            }
            Err(e) => {
                tracing::warn!(
                    source = %what,
                    error = %e,
                    "failed to load records, continuing with an empty store"
                );
                Arc::from(Vec::new())
            }
        }
    }
}
