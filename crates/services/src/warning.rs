use std::fmt;

/// Category of a non-fatal failure surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// The progress file could not be read or decoded; an empty store was used.
    ProgressUnreadable,
    /// The progress file could not be written; the change lives only in memory.
    ProgressNotSaved,
    /// The remote snapshot could not be fetched or parsed.
    RemoteUnavailable,
    /// A remote write-back did not happen.
    SyncFailed,
}

/// A failure that degraded a feature for this session without stopping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftWarning {
    kind: WarningKind,
    message: String,
}

impl SoftWarning {
    #[must_use]
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> WarningKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SoftWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A value that is always usable, plus the warning explaining a degraded result.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftResult<T> {
    pub value: T,
    pub warning: Option<SoftWarning>,
}

impl<T> SoftResult<T> {
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    #[must_use]
    pub fn degraded(value: T, warning: SoftWarning) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }

    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}
