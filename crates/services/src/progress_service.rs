use std::sync::Arc;

use companion_core::model::{Label, MarkOutcome, MarkPolicy, ProgressStore};
use storage::repository::{ProgressRepository, StorageError};
use tracing::{debug, warn};

use crate::Clock;
use crate::warning::{SoftResult, SoftWarning, WarningKind};

/// Durable record of completed units, with fail-soft load and save.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    policy: MarkPolicy,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            policy: MarkPolicy::default(),
            repo,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MarkPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> MarkPolicy {
        self.policy
    }

    /// Load the store, treating a missing backing file as an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for unreadable or corrupt content.
    pub async fn try_load(&self) -> Result<ProgressStore, StorageError> {
        Ok(self.repo.read_store().await?.unwrap_or_default())
    }

    /// Load the store, falling back to an empty one on any failure.
    pub async fn load(&self) -> SoftResult<ProgressStore> {
        match self.try_load().await {
            Ok(store) => SoftResult::ok(store),
            Err(err) => {
                warn!(location = %self.repo.location(), error = %err, "progress unreadable, starting empty");
                let message = if err.is_corrupt() {
                    format!(
                        "Saved progress in {} is damaged and was ignored.",
                        self.repo.location()
                    )
                } else {
                    format!("Could not read saved progress: {err}")
                };
                SoftResult::degraded(
                    ProgressStore::new(),
                    SoftWarning::new(WarningKind::ProgressUnreadable, message),
                )
            }
        }
    }

    /// Persist the full store. Failures come back as a warning instead of an error.
    pub async fn save(&self, store: &ProgressStore) -> Option<SoftWarning> {
        match self.repo.write_store(store).await {
            Ok(()) => None,
            Err(err) => {
                warn!(location = %self.repo.location(), error = %err, "progress not saved");
                Some(SoftWarning::new(
                    WarningKind::ProgressNotSaved,
                    format!("Progress kept for this session only: {err}"),
                ))
            }
        }
    }

    /// Mark `label` complete now and write through when the store changed.
    pub async fn mark(
        &self,
        store: &mut ProgressStore,
        label: Label,
    ) -> (MarkOutcome, Option<SoftWarning>) {
        let at = self.clock.completion_stamp();
        let outcome = store.mark(label, at, self.policy);
        if !outcome.changed_store() {
            debug!(?outcome, "mark left store unchanged");
            return (outcome, None);
        }
        let warning = self.save(store).await;
        (outcome, warning)
    }
}
