mod csv;
mod snapshot;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use crate::error::RemoteError;
use crate::warning::{SoftResult, SoftWarning, WarningKind};

pub use csv::{CsvRecord, parse_numbered_records, parse_records};
pub use snapshot::{RemoteRow, RemoteSnapshot, SideBySideRow, side_by_side};

/// Upper bound for a single snapshot download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches a published CSV export for display next to local progress.
#[derive(Clone)]
pub struct RemoteMirrorReader {
    client: Client,
}

impl Default for RemoteMirrorReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMirrorReader {
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download and parse the snapshot at `url`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` for a bad URL, transport failure, non-success
    /// status, an HTML page instead of CSV, or malformed CSV.
    pub async fn try_fetch(&self, url: &str) -> Result<RemoteSnapshot, RemoteError> {
        let url = Url::parse(url).map_err(|_| RemoteError::InvalidUrl(url.to_owned()))?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status));
        }

        // Unpublished sheets answer with a sign-in page.
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("text/html"))
        {
            return Err(RemoteError::UnexpectedContent {
                content_type: content_type.to_owned(),
            });
        }

        let body = response.text().await?;
        let snapshot = RemoteSnapshot::from_csv(&body)?;
        debug!(%url, rows = snapshot.len(), "fetched remote snapshot");
        Ok(snapshot)
    }

    /// Download the snapshot, returning an empty one on any failure.
    pub async fn fetch(&self, url: &str) -> SoftResult<RemoteSnapshot> {
        match self.try_fetch(url).await {
            Ok(snapshot) => SoftResult::ok(snapshot),
            Err(err) => {
                warn!(url, error = %err, "remote snapshot unavailable");
                SoftResult::degraded(
                    RemoteSnapshot::default(),
                    SoftWarning::new(
                        WarningKind::RemoteUnavailable,
                        format!("Remote progress unavailable: {err}"),
                    ),
                )
            }
        }
    }
}
