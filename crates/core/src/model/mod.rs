mod label;
mod progress;
mod settings;

pub use label::{Label, LabelError};
pub use progress::{MarkOutcome, MarkPolicy, ParseMarkPolicyError, ProgressRecord, ProgressStore};
pub use settings::{
    CompanionSettings, CompanionSettingsDraft, DEFAULT_PROGRESS_FILE, DEFAULT_REMINDER_AT,
    DEFAULT_SHEET_RANGE, SettingsError, SheetTarget, SyncDirection, parse_reminder_time,
};
