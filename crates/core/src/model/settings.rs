use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;
use thiserror::Error;
use url::Url;

use crate::model::progress::MarkPolicy;

pub const DEFAULT_PROGRESS_FILE: &str = "progress.json";
pub const DEFAULT_SHEET_RANGE: &str = "A1";
pub const DEFAULT_REMINDER_AT: &str = "03:00";

/// Which way (if any) local progress travels relative to the remote sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncDirection {
    /// No remote interaction at all.
    Off,
    /// Fetch the published snapshot for side-by-side display.
    #[default]
    ReadOnly,
    /// Hand the sheet's edit URL to the host so the user edits it manually.
    OpenInBrowser,
    /// Replace one cell with the comma-joined list of local labels.
    OverwriteCell,
}

impl FromStr for SyncDirection {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "read-only" | "readonly" => Ok(Self::ReadOnly),
            "open-in-browser" | "browser" => Ok(Self::OpenInBrowser),
            "overwrite-cell" | "overwrite" => Ok(Self::OverwriteCell),
            _ => Err(SettingsError::InvalidSyncDirection { raw: s.to_owned() }),
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncDirection::Off => "off",
            SyncDirection::ReadOnly => "read-only",
            SyncDirection::OpenInBrowser => "open-in-browser",
            SyncDirection::OverwriteCell => "overwrite-cell",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid URL for {field}: {raw}")]
    InvalidUrl { field: &'static str, raw: String },
    #[error("unknown sync direction: {raw}")]
    InvalidSyncDirection { raw: String },
    #[error("unknown mark policy: {raw}")]
    InvalidMarkPolicy { raw: String },
    #[error("reminder time must be HH:MM, got {raw}")]
    InvalidReminderTime { raw: String },
    #[error("overwrite-cell sync requires a spreadsheet id and access token")]
    MissingSheetTarget,
    #[error("open-in-browser sync requires a sheet edit URL")]
    MissingEditUrl,
}

/// Destination of a single-cell overwrite.
#[derive(Clone, PartialEq, Eq)]
pub struct SheetTarget {
    spreadsheet_id: String,
    range: String,
    access_token: String,
}

impl SheetTarget {
    #[must_use]
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            access_token: access_token.into(),
        }
    }

    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    #[must_use]
    pub fn range(&self) -> &str {
        &self.range
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for SheetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetTarget")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("range", &self.range)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Validated runtime settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanionSettings {
    progress_file: PathBuf,
    mark_policy: MarkPolicy,
    remote_csv_url: Option<Url>,
    sync_direction: SyncDirection,
    sheet_edit_url: Option<Url>,
    sheet_target: Option<SheetTarget>,
    reminder_at: NaiveTime,
    notify_webhook: Option<Url>,
}

/// Raw, unvalidated settings as read from the environment or flags.
#[derive(Clone, Debug, Default)]
pub struct CompanionSettingsDraft {
    pub progress_file: Option<String>,
    pub mark_policy: Option<String>,
    pub remote_csv_url: Option<String>,
    pub sync_direction: Option<String>,
    pub sheet_edit_url: Option<String>,
    pub sheets_id: Option<String>,
    pub sheets_range: Option<String>,
    pub sheets_token: Option<String>,
    pub reminder_at: Option<String>,
    pub notify_webhook: Option<String>,
}

impl CompanionSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for malformed URLs, unknown enum names, a bad
    /// reminder time, or a sync direction missing the values it needs.
    pub fn validate(self) -> Result<CompanionSettings, SettingsError> {
        let progress_file = normalize_optional(self.progress_file)
            .unwrap_or_else(|| DEFAULT_PROGRESS_FILE.to_owned());

        let mark_policy = match normalize_optional(self.mark_policy) {
            Some(raw) => raw
                .parse::<MarkPolicy>()
                .map_err(|_| SettingsError::InvalidMarkPolicy { raw })?,
            None => MarkPolicy::default(),
        };

        let sync_direction = match normalize_optional(self.sync_direction) {
            Some(raw) => raw.parse::<SyncDirection>()?,
            None => SyncDirection::default(),
        };

        let remote_csv_url = parse_url("remote_csv_url", self.remote_csv_url)?;
        let sheet_edit_url = parse_url("sheet_edit_url", self.sheet_edit_url)?;
        let notify_webhook = parse_url("notify_webhook", self.notify_webhook)?;

        let sheet_target = match (
            normalize_optional(self.sheets_id),
            normalize_optional(self.sheets_token),
        ) {
            (Some(id), Some(token)) => Some(SheetTarget::new(
                id,
                normalize_optional(self.sheets_range)
                    .unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_owned()),
                token,
            )),
            _ => None,
        };

        let reminder_raw = normalize_optional(self.reminder_at)
            .unwrap_or_else(|| DEFAULT_REMINDER_AT.to_owned());
        let reminder_at = parse_reminder_time(&reminder_raw)?;

        match sync_direction {
            SyncDirection::OverwriteCell if sheet_target.is_none() => {
                return Err(SettingsError::MissingSheetTarget);
            }
            SyncDirection::OpenInBrowser if sheet_edit_url.is_none() => {
                return Err(SettingsError::MissingEditUrl);
            }
            _ => {}
        }

        Ok(CompanionSettings {
            progress_file: PathBuf::from(progress_file),
            mark_policy,
            remote_csv_url,
            sync_direction,
            sheet_edit_url,
            sheet_target,
            reminder_at,
            notify_webhook,
        })
    }
}

impl CompanionSettings {
    #[must_use]
    pub fn progress_file(&self) -> &std::path::Path {
        &self.progress_file
    }

    #[must_use]
    pub fn mark_policy(&self) -> MarkPolicy {
        self.mark_policy
    }

    #[must_use]
    pub fn remote_csv_url(&self) -> Option<&Url> {
        self.remote_csv_url.as_ref()
    }

    #[must_use]
    pub fn sync_direction(&self) -> SyncDirection {
        self.sync_direction
    }

    #[must_use]
    pub fn sheet_edit_url(&self) -> Option<&Url> {
        self.sheet_edit_url.as_ref()
    }

    #[must_use]
    pub fn sheet_target(&self) -> Option<&SheetTarget> {
        self.sheet_target.as_ref()
    }

    #[must_use]
    pub fn reminder_at(&self) -> NaiveTime {
        self.reminder_at
    }

    #[must_use]
    pub fn notify_webhook(&self) -> Option<&Url> {
        self.notify_webhook.as_ref()
    }
}

impl Default for CompanionSettings {
    fn default() -> Self {
        Self {
            progress_file: PathBuf::from(DEFAULT_PROGRESS_FILE),
            mark_policy: MarkPolicy::default(),
            remote_csv_url: None,
            sync_direction: SyncDirection::default(),
            sheet_edit_url: None,
            sheet_target: None,
            reminder_at: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default(),
            notify_webhook: None,
        }
    }
}

/// Parse an `HH:MM` time of day.
///
/// # Errors
///
/// Returns `SettingsError::InvalidReminderTime` when the value is not a valid time.
pub fn parse_reminder_time(raw: &str) -> Result<NaiveTime, SettingsError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        SettingsError::InvalidReminderTime {
            raw: raw.to_owned(),
        }
    })
}

fn parse_url(field: &'static str, value: Option<String>) -> Result<Option<Url>, SettingsError> {
    normalize_optional(value)
        .map(|raw| Url::parse(&raw).map_err(|_| SettingsError::InvalidUrl { field, raw }))
        .transpose()
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = CompanionSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, CompanionSettings::default());
        assert_eq!(settings.progress_file(), std::path::Path::new("progress.json"));
        assert_eq!(settings.sync_direction(), SyncDirection::ReadOnly);
        assert_eq!(settings.reminder_at(), NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = CompanionSettingsDraft {
            progress_file: Some("   ".into()),
            remote_csv_url: Some(String::new()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.progress_file(), std::path::Path::new("progress.json"));
        assert!(settings.remote_csv_url().is_none());
    }

    #[test]
    fn rejects_bad_url() {
        let err = CompanionSettingsDraft {
            remote_csv_url: Some("not a url".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidUrl {
                field: "remote_csv_url",
                ..
            }
        ));
    }

    #[test]
    fn overwrite_cell_requires_target() {
        let err = CompanionSettingsDraft {
            sync_direction: Some("overwrite-cell".into()),
            sheets_id: Some("abc".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::MissingSheetTarget);

        let settings = CompanionSettingsDraft {
            sync_direction: Some("overwrite-cell".into()),
            sheets_id: Some("abc".into()),
            sheets_token: Some("tok".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let target = settings.sheet_target().unwrap();
        assert_eq!(target.range(), "A1");
        assert!(!format!("{target:?}").contains("tok"));
    }

    #[test]
    fn open_in_browser_requires_edit_url() {
        let err = CompanionSettingsDraft {
            sync_direction: Some("open-in-browser".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::MissingEditUrl);
    }

    #[test]
    fn parses_policy_and_reminder() {
        let settings = CompanionSettingsDraft {
            mark_policy: Some("overwrite".into()),
            reminder_at: Some("04:45".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.mark_policy(), MarkPolicy::Overwrite);
        assert_eq!(settings.reminder_at(), NaiveTime::from_hms_opt(4, 45, 0).unwrap());

        assert!(parse_reminder_time("25:00").is_err());
        assert!(
            CompanionSettingsDraft {
                mark_policy: Some("maybe".into()),
                ..CompanionSettingsDraft::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn sync_direction_names_round_trip() {
        for direction in [
            SyncDirection::Off,
            SyncDirection::ReadOnly,
            SyncDirection::OpenInBrowser,
            SyncDirection::OverwriteCell,
        ] {
            assert_eq!(direction.to_string().parse::<SyncDirection>().unwrap(), direction);
        }
    }
}
