use std::sync::Arc;

use async_trait::async_trait;
use companion_core::model::{ProgressStore, SheetTarget, SyncDirection};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::error::SyncError;
use crate::remote::{RemoteMirrorReader, RemoteSnapshot};
use crate::warning::{SoftWarning, WarningKind};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Destination for a single-cell, last-writer-wins overwrite.
#[async_trait]
pub trait CellWriter: Send + Sync {
    /// Replace the target cell with `value`.
    ///
    /// Returns the range that was written.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the write is rejected or never reaches the sheet.
    async fn overwrite(&self, value: &str) -> Result<String, SyncError>;
}

/// Writes one cell through the Google Sheets `values.update` endpoint.
#[derive(Clone)]
pub struct SheetsCellWriter {
    client: Client,
    base_url: String,
    target: SheetTarget,
}

impl SheetsCellWriter {
    #[must_use]
    pub fn new(target: SheetTarget) -> Self {
        Self::with_base_url(target, SHEETS_API_BASE)
    }

    /// Point at a different API host (used by tests and proxies).
    #[must_use]
    pub fn with_base_url(target: SheetTarget, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            target,
        }
    }

    fn endpoint(&self) -> Result<Url, SyncError> {
        let invalid = || SyncError::InvalidEndpoint(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.target.spreadsheet_id(),
                "values",
                self.target.range(),
            ]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

#[async_trait]
impl CellWriter for SheetsCellWriter {
    async fn overwrite(&self, value: &str) -> Result<String, SyncError> {
        let body = ValueRange {
            range: self.target.range(),
            major_dimension: "ROWS",
            values: [[value]],
        };
        let response = self
            .client
            .put(self.endpoint()?)
            .bearer_auth(self.target.access_token())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }
        Ok(self.target.range().to_owned())
    }
}

/// What a sync attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Sync is switched off.
    Disabled,
    /// The remote snapshot was fetched for display (possibly empty).
    ReadOnly { snapshot: RemoteSnapshot },
    /// The host should open this URL so the user can edit the sheet by hand.
    OpenExternally { url: Url },
    /// One cell now holds every local label, comma-joined.
    Overwritten { range: String, labels: usize },
    /// The configured direction could not be carried out.
    NotSynced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub outcome: SyncOutcome,
    pub warning: Option<SoftWarning>,
}

/// Carries out the one configured sync direction. Never merges remote data into the store.
#[derive(Clone)]
pub struct SyncService {
    direction: SyncDirection,
    csv_url: Option<Url>,
    edit_url: Option<Url>,
    reader: RemoteMirrorReader,
    writer: Option<Arc<dyn CellWriter>>,
}

impl SyncService {
    #[must_use]
    pub fn new(direction: SyncDirection, reader: RemoteMirrorReader) -> Self {
        Self {
            direction,
            csv_url: None,
            edit_url: None,
            reader,
            writer: None,
        }
    }

    #[must_use]
    pub fn with_csv_url(mut self, url: Option<Url>) -> Self {
        self.csv_url = url;
        self
    }

    #[must_use]
    pub fn with_edit_url(mut self, url: Option<Url>) -> Self {
        self.edit_url = url;
        self
    }

    #[must_use]
    pub fn with_writer(mut self, writer: Option<Arc<dyn CellWriter>>) -> Self {
        self.writer = writer;
        self
    }

    #[must_use]
    pub fn direction(&self) -> SyncDirection {
        self.direction
    }

    /// Run the configured direction once.
    pub async fn sync(&self, store: &ProgressStore) -> SyncReport {
        let (outcome, warning) = match self.direction {
            SyncDirection::Off => (SyncOutcome::Disabled, None),
            SyncDirection::ReadOnly => self.read_only().await,
            SyncDirection::OpenInBrowser => self.open_in_browser(),
            SyncDirection::OverwriteCell => self.overwrite_cell(store).await,
        };
        SyncReport {
            direction: self.direction,
            outcome,
            warning,
        }
    }

    async fn read_only(&self) -> (SyncOutcome, Option<SoftWarning>) {
        let Some(url) = self.csv_url.as_ref() else {
            return (
                SyncOutcome::ReadOnly {
                    snapshot: RemoteSnapshot::default(),
                },
                Some(SoftWarning::new(
                    WarningKind::RemoteUnavailable,
                    "No remote progress sheet is configured.",
                )),
            );
        };
        let fetched = self.reader.fetch(url.as_str()).await;
        (
            SyncOutcome::ReadOnly {
                snapshot: fetched.value,
            },
            fetched.warning,
        )
    }

    fn open_in_browser(&self) -> (SyncOutcome, Option<SoftWarning>) {
        match self.edit_url.clone() {
            Some(url) => (SyncOutcome::OpenExternally { url }, None),
            None => (
                SyncOutcome::NotSynced,
                Some(SoftWarning::new(
                    WarningKind::SyncFailed,
                    "No sheet edit URL is configured.",
                )),
            ),
        }
    }

    async fn overwrite_cell(&self, store: &ProgressStore) -> (SyncOutcome, Option<SoftWarning>) {
        let Some(writer) = self.writer.as_ref() else {
            return (
                SyncOutcome::NotSynced,
                Some(SoftWarning::new(
                    WarningKind::SyncFailed,
                    "Sheet sync is not configured. Progress saved locally.",
                )),
            );
        };
        let value = store.joined_labels(",");
        match writer.overwrite(&value).await {
            Ok(range) => {
                info!(%range, labels = store.len(), "overwrote remote progress cell");
                (
                    SyncOutcome::Overwritten {
                        range,
                        labels: store.len(),
                    },
                    None,
                )
            }
            Err(err) => {
                warn!(error = %err, "remote progress cell not updated");
                (
                    SyncOutcome::NotSynced,
                    Some(SoftWarning::new(
                        WarningKind::SyncFailed,
                        format!("Sync failed: {err}"),
                    )),
                )
            }
        }
    }
}
