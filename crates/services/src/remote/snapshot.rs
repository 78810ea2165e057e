use companion_core::model::ProgressStore;

use crate::error::RemoteError;
use crate::remote::csv::parse_numbered_records;

/// One row of the remote sheet, keyed by header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRow {
    cells: Vec<(String, String)>,
    date_column: Option<usize>,
}

impl RemoteRow {
    /// Value under `column`; the first match wins for duplicate headers.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// First column, trimmed.
    #[must_use]
    pub fn label(&self) -> &str {
        self.cells.first().map_or("", |(_, value)| value.trim())
    }

    /// The date column picked for the whole snapshot, trimmed.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.date_column
            .and_then(|idx| self.cells.get(idx))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Read-only copy of a published sheet, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    headers: Vec<String>,
    rows: Vec<RemoteRow>,
}

impl RemoteSnapshot {
    /// Parse CSV with a header line.
    ///
    /// The label is the first column. The date is the first later column whose
    /// header mentions "date", or the second column when none does. Short rows
    /// are padded with empty values.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::MalformedCsv` for broken quoting or a row wider
    /// than the header.
    pub fn from_csv(text: &str) -> Result<Self, RemoteError> {
        let mut records = parse_numbered_records(text)?.into_iter();
        let Some(header) = records.next() else {
            return Ok(Self::default());
        };
        let headers: Vec<String> = header
            .fields
            .into_iter().map(|h| h.trim().to_owned()).collect();
        let date_column = headers
            .iter()
            .skip(1)
            .position(|h| h.to_ascii_lowercase().contains("date"))
            .map(|idx| idx + 1)
            .or_else(|| (headers.len() > 1).then_some(1));

        let mut rows = Vec::new();
        for record in records {
            if record.fields.len() > headers.len() {
                return Err(RemoteError::MalformedCsv {
                    line: record.line,
                    reason: "row has more fields than the header",
                });
            }
            let mut values = record.fields.into_iter();
            let cells = headers
                .iter()
                .map(|name| (name.clone(), values.next().unwrap_or_default()))
                .collect();
            rows.push(RemoteRow { cells, date_column });
        }

        Ok(Self { headers, rows })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[RemoteRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteRow> {
        self.rows.iter()
    }

    /// Row whose label equals `label`.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&RemoteRow> {
        self.rows.iter().find(|row| row.label() == label)
    }
}

/// A label with its local and remote dates, for manual cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideBySideRow {
    pub label: String,
    pub local: Option<String>,
    pub remote: Option<String>,
}

/// Local labels first in store order, then labels only the remote knows.
///
/// This only lines the two sources up; nothing is merged back into either.
#[must_use]
pub fn side_by_side(store: &ProgressStore, snapshot: &RemoteSnapshot) -> Vec<SideBySideRow> {
    let mut out: Vec<SideBySideRow> = store
        .iter()
        .map(|record| SideBySideRow {
            label: record.label().to_string(),
            local: Some(record.timestamp_display()),
            remote: snapshot
                .find(record.label().as_str())
                .map(|row| row.date().unwrap_or_default().to_owned()),
        })
        .collect();

    for row in snapshot.iter() {
        let label = row.label();
        if label.is_empty() || store.contains(label) || out.iter().any(|r| r.label == label) {
            continue;
        }
        out.push(SideBySideRow {
            label: label.to_owned(),
            local: None,
            remote: Some(row.date().unwrap_or_default().to_owned()),
        });
    }
    out
}
