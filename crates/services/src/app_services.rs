use std::sync::Arc;

use companion_core::model::CompanionSettings;
use companion_core::reminder::ReminderSchedule;
use storage::repository::Storage;

use crate::progress_service::ProgressService;
use crate::recorder::CompletionRecorder;
use crate::reminder::{FanoutNotifier, LogNotifier, Notifier, ReminderService, WebhookNotifier};
use crate::remote::RemoteMirrorReader;
use crate::sync::{CellWriter, SheetsCellWriter, SyncService};
use crate::Clock;

/// Assembles app-facing services from validated settings.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: CompanionSettings,
    progress: Arc<ProgressService>,
    recorder: Arc<CompletionRecorder>,
    remote: Arc<RemoteMirrorReader>,
    sync: Arc<SyncService>,
}

impl AppServices {
    /// Services backed by the JSON progress file named in `settings`.
    #[must_use]
    pub fn new(settings: CompanionSettings, clock: Clock) -> Self {
        let storage = Storage::json_file(settings.progress_file());
        Self::with_storage(settings, clock, &storage)
    }

    #[must_use]
    pub fn with_storage(settings: CompanionSettings, clock: Clock, storage: &Storage) -> Self {
        let progress = ProgressService::new(clock, Arc::clone(&storage.progress))
            .with_policy(settings.mark_policy());
        let recorder = CompletionRecorder::new(progress.clone());
        let remote = RemoteMirrorReader::new();

        let writer = settings.sheet_target().map(|target| {
            let writer: Arc<dyn CellWriter> = Arc::new(SheetsCellWriter::new(target.clone()));
            writer
        });
        let sync = SyncService::new(settings.sync_direction(), remote.clone())
            .with_csv_url(settings.remote_csv_url().cloned())
            .with_edit_url(settings.sheet_edit_url().cloned())
            .with_writer(writer);

        Self {
            clock,
            settings,
            progress: Arc::new(progress),
            recorder: Arc::new(recorder),
            remote: Arc::new(remote),
            sync: Arc::new(sync),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CompanionSettings {
        &self.settings
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<CompletionRecorder> {
        Arc::clone(&self.recorder)
    }

    #[must_use]
    pub fn remote(&self) -> Arc<RemoteMirrorReader> {
        Arc::clone(&self.remote)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<SyncService> {
        Arc::clone(&self.sync)
    }

    /// A daily reminder at the configured time, logged and optionally sent to the webhook.
    #[must_use]
    pub fn reminder(&self) -> ReminderService {
        let mut targets: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
        if let Some(url) = self.settings.notify_webhook() {
            targets.push(Arc::new(WebhookNotifier::new(url.clone())));
        }
        ReminderService::new(
            self.clock,
            ReminderSchedule::daily(self.settings.reminder_at()),
            Arc::new(FanoutNotifier::new(targets)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::model::{CompanionSettingsDraft, MarkPolicy, ProgressStore};
    use companion_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn wires_policy_into_recorder() {
        let settings = CompanionSettingsDraft {
            mark_policy: Some("overwrite".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let repo = InMemoryRepository::new();
        let storage = Storage {
            progress: Arc::new(repo.clone()),
        };
        let services = AppServices::with_storage(settings, fixed_clock(), &storage);
        assert_eq!(services.progress().policy(), MarkPolicy::Overwrite);

        let mut store = ProgressStore::new();
        services.recorder().record(&mut store, "Al-Kahf").await.unwrap();
        services.recorder().record(&mut store, "Al-Kahf").await.unwrap();
        assert_eq!(repo.write_count(), 2);
    }

    #[test]
    fn reminder_uses_configured_time() {
        let settings = CompanionSettingsDraft {
            reminder_at: Some("04:30".into()),
            ..CompanionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let services = AppServices::with_storage(settings, fixed_clock(), &Storage::in_memory());
        let reminder = services.reminder();
        assert_eq!(
            reminder.schedule().at(),
            chrono::NaiveTime::from_hms_opt(4, 30, 0).unwrap()
        );
    }
}
