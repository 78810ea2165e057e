//! Environment-driven configuration.

use std::env;

use companion_core::model::{CompanionSettings, CompanionSettingsDraft};

use crate::error::ConfigError;

pub const ENV_PROGRESS_FILE: &str = "COMPANION_PROGRESS_FILE";
pub const ENV_MARK_POLICY: &str = "COMPANION_MARK_POLICY";
pub const ENV_REMOTE_CSV_URL: &str = "COMPANION_REMOTE_CSV_URL";
pub const ENV_SYNC_DIRECTION: &str = "COMPANION_SYNC_DIRECTION";
pub const ENV_SHEET_EDIT_URL: &str = "COMPANION_SHEET_EDIT_URL";
pub const ENV_SHEETS_ID: &str = "COMPANION_SHEETS_ID";
pub const ENV_SHEETS_RANGE: &str = "COMPANION_SHEETS_RANGE";
pub const ENV_SHEETS_TOKEN: &str = "COMPANION_SHEETS_TOKEN";
pub const ENV_REMINDER_AT: &str = "COMPANION_REMINDER_AT";
pub const ENV_NOTIFY_WEBHOOK: &str = "COMPANION_NOTIFY_WEBHOOK";

/// Build a settings draft from any key lookup.
pub fn draft_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CompanionSettingsDraft {
    CompanionSettingsDraft {
        progress_file: lookup(ENV_PROGRESS_FILE),
        mark_policy: lookup(ENV_MARK_POLICY),
        remote_csv_url: lookup(ENV_REMOTE_CSV_URL),
        sync_direction: lookup(ENV_SYNC_DIRECTION),
        sheet_edit_url: lookup(ENV_SHEET_EDIT_URL),
        sheets_id: lookup(ENV_SHEETS_ID),
        sheets_range: lookup(ENV_SHEETS_RANGE),
        sheets_token: lookup(ENV_SHEETS_TOKEN),
        reminder_at: lookup(ENV_REMINDER_AT),
        notify_webhook: lookup(ENV_NOTIFY_WEBHOOK),
    }
}

/// Validate settings built from any key lookup.
///
/// # Errors
///
/// Returns `ConfigError` when a value is present but invalid.
pub fn settings_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CompanionSettings, ConfigError> {
    Ok(draft_from_lookup(lookup).validate()?)
}

/// Read and validate settings from the process environment, consulting
/// `overrides` first for each key.
///
/// # Errors
///
/// Returns `ConfigError` when a value is present but invalid.
pub fn settings_from_env_with(
    overrides: impl Fn(&str) -> Option<String>,
) -> Result<CompanionSettings, ConfigError> {
    settings_from_lookup(|key| overrides(key).or_else(|| env::var(key).ok()))
}
