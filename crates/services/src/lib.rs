#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod progress_service;
pub mod recorder;
pub mod reminder;
pub mod remote;
pub mod sync;
pub mod warning;

pub use companion_core::Clock;

pub use app_services::AppServices;
pub use error::{ConfigError, NotifyError, RecorderError, RemoteError, SyncError};
pub use progress_service::ProgressService;
pub use recorder::{CompletionRecorder, MarkReport};
pub use reminder::{
    FanoutNotifier, LogNotifier, Notifier, ReminderHandle, ReminderService, WebhookNotifier,
};
pub use remote::{RemoteMirrorReader, RemoteRow, RemoteSnapshot, SideBySideRow, side_by_side};
pub use sync::{CellWriter, SheetsCellWriter, SyncOutcome, SyncReport, SyncService};
pub use warning::{SoftResult, SoftWarning, WarningKind};
