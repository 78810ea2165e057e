use companion_core::model::{Label, MarkOutcome, ProgressStore};
use companion_core::time::format_timestamp;
use tracing::info;

use crate::error::RecorderError;
use crate::progress_service::ProgressService;
use crate::warning::SoftWarning;

/// What happened when the user asked to mark a unit complete.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkReport {
    pub label: Label,
    pub outcome: MarkOutcome,
    pub warning: Option<SoftWarning>,
}

impl MarkReport {
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self.outcome, MarkOutcome::Recorded)
    }

    /// One-line message for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self.outcome {
            MarkOutcome::Recorded => format!("Marked {} as read.", self.label),
            MarkOutcome::AlreadyRecorded { recorded_at } => format!(
                "{} already marked read on {}.",
                self.label,
                format_timestamp(recorded_at)
            ),
            MarkOutcome::Refreshed { previous } => format!(
                "Marked {} as read again (previously {}).",
                self.label,
                format_timestamp(previous)
            ),
        }
    }
}

/// Bridges a "mark as read" action to the progress store.
#[derive(Clone)]
pub struct CompletionRecorder {
    progress: ProgressService,
}

impl CompletionRecorder {
    #[must_use]
    pub fn new(progress: ProgressService) -> Self {
        Self { progress }
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Record `label` as complete in `store`, persisting when it changed.
    ///
    /// Taking `&mut ProgressStore` keeps each store to a single writer.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Label` if `label` is blank.
    pub async fn record(
        &self,
        store: &mut ProgressStore,
        label: &str,
    ) -> Result<MarkReport, RecorderError> {
        let label = Label::parse(label)?;
        let (outcome, warning) = self.progress.mark(store, label.clone()).await;
        info!(label = %label, ?outcome, saved = warning.is_none(), "mark as read");
        Ok(MarkReport {
            label,
            outcome,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use companion_core::time::{fixed_clock, parse_timestamp};
    use storage::repository::InMemoryRepository;

    fn recorder() -> CompletionRecorder {
        let repo = InMemoryRepository::new();
        CompletionRecorder::new(ProgressService::new(fixed_clock(), Arc::new(repo)))
    }

    #[tokio::test]
    async fn blank_label_is_rejected() {
        let mut store = ProgressStore::new();
        let err = recorder().record(&mut store, "  ").await.unwrap_err();
        assert!(matches!(err, RecorderError::Label(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn messages_describe_outcome() {
        let rec = recorder();
        let mut store = ProgressStore::new();

        let first = rec.record(&mut store, "Al-Fatiha").await.unwrap();
        assert!(first.is_new());
        assert_eq!(first.message(), "Marked Al-Fatiha as read.");

        let second = rec.record(&mut store, "Al-Fatiha").await.unwrap();
        assert!(!second.is_new());
        assert_eq!(
            second.message(),
            "Al-Fatiha already marked read on 2023-11-14 22:13."
        );
    }

    #[test]
    fn refreshed_message_mentions_previous_time() {
        let report = MarkReport {
            label: Label::parse("Yusuf").unwrap(),
            outcome: MarkOutcome::Refreshed {
                previous: parse_timestamp("2025-03-01 04:00").unwrap(),
            },
            warning: None,
        };
        assert_eq!(
            report.message(),
            "Marked Yusuf as read again (previously 2025-03-01 04:00)."
        );
    }
}
