//! HTTP data source for a live Transaction Log Service.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{DataSource, FetchRequest, SourceError, Update};

/// Path prefix the service mounts its endpoints under.
pub const DEFAULT_API_PREFIX: &str = "/api/spring-tx-board";

/// Requests that may be queued before new ones are dropped.
const QUEUE_DEPTH: usize = 64;

/// Typed access to the service's REST endpoints.
#[derive(Debug, Clone)]
struct ServiceClient {
    client: Client,
    base: String,
}

impl ServiceClient {
    fn new(base_url: &str, api_prefix: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        let prefix = api_prefix.trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };
        Ok(Self {
            client,
            base: format!("{}{}", base_url.trim_end_matches('/'), prefix),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, SourceError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        response.json().await.map_err(|e| SourceError::Parse(e.to_string()))
    }

    async fn fetch(&self, request: FetchRequest) -> Result<Update, SourceError> {
        match request {
            FetchRequest::Threshold => {
                Ok(Update::Threshold(self.get_json("/config/alarming-threshold", &[]).await?))
            }
            FetchRequest::Summary => Ok(Update::Summary(self.get_json("/tx-summary", &[]).await?)),
            FetchRequest::Chart => Ok(Update::Chart(self.get_json("/tx-charts", &[]).await?)),
            FetchRequest::Transactions(query) => {
                query.validate()?;
                let page = self.get_json("/tx-logs", &query.to_query_pairs()).await?;
                Ok(Update::Transactions(page))
            }
            FetchRequest::SqlLogs(query) => {
                query.validate()?;
                let page = self.get_json("/sql-logs", &query.to_query_pairs()).await?;
                Ok(Update::SqlLogs(page))
            }
        }
    }
}

/// A data source that fetches from the Transaction Log Service over HTTP.
///
/// Requests are handed to a background task which serves them one at a
/// time, in order, and sends each result back over a channel. A failed
/// request leaves previously received data alone; its message is reported
/// by [`DataSource::error`] until the next success.
///
/// Must be created from within a tokio runtime.
#[derive(Debug)]
pub struct HttpSource {
    requests: mpsc::Sender<FetchRequest>,
    results: mpsc::Receiver<Result<Update, SourceError>>,
    description: String,
    last_error: Option<String>,
}

impl HttpSource {
    /// Spawn the background fetch task for the service at `base_url`.
    pub fn spawn(base_url: &str, api_prefix: &str, timeout: Duration) -> Result<Self, SourceError> {
        let service = ServiceClient::new(base_url, api_prefix, timeout)?;
        let description = format!("http: {}", service.base);
        let (request_tx, mut request_rx) = mpsc::channel::<FetchRequest>(QUEUE_DEPTH);
        let (result_tx, result_rx) = mpsc::channel(QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                debug!(?request, "Fetching");
                let result = service.fetch(request).await;
                if let Err(ref e) = result {
                    warn!(error = %e, "Fetch failed");
                }
                if result_tx.send(result).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
        });

        Ok(Self {
            requests: request_tx,
            results: result_rx,
            description,
            last_error: None,
        })
    }
}

impl DataSource for HttpSource {
    fn request(&mut self, request: FetchRequest) {
        if let Err(e) = self.requests.try_send(request) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "Request queue full",
                mpsc::error::TrySendError::Closed(_) => "Fetch task stopped",
            };
            warn!(reason, "Dropping request");
            self.last_error = Some(reason.to_string());
        }
    }

    fn poll(&mut self) -> Option<Update> {
        loop {
            match self.results.try_recv() {
                Ok(Ok(update)) => {
                    self.last_error = None;
                    return Some(update);
                }
                Ok(Err(e)) => {
                    self.last_error = Some(e.to_string());
                }
                Err(mpsc::error::TryRecvError::Empty) => return None,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.last_error = Some("Fetch task stopped".to_string());
                    return None;
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
