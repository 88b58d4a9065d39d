//! Error recovery strategies for the curation engine.
//!
//! Nothing in the engine is allowed to fail as a whole. A corrupt stored
//! collection is reset on its own, an entry that cannot be read yet is skipped
//! for the current pass, and everything else falls back to defaults.

use crate::{Collection, CoreError, ErrorExt, StorageError};
use tracing::{debug, warn};

/// How a failure is absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Replace one persisted collection with its empty value
    ResetCollection(Collection),
    /// Leave one entry alone for this pass
    SkipEntry,
    /// Use the default value and carry on
    Fallback,
    /// Hand the error back to the caller
    Fail,
}

/// Outcome of an operation after its failure, if any, was absorbed.
#[derive(Debug)]
pub enum RecoveryResult<T> {
    /// No failure
    Recovered(T),
    /// The operation failed and a default value stands in for its output
    Degraded(T),
    /// The operation failed and its input should be ignored
    Skipped,
    /// The error could not be absorbed
    Failed(CoreError),
}

impl<T> RecoveryResult<T> {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryResult::Recovered(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RecoveryResult::Degraded(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecoveryResult::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecoveryResult::Failed(_))
    }

    /// The value if recovered or degraded.
    pub fn value(self) -> Option<T> {
        match self {
            RecoveryResult::Recovered(value) | RecoveryResult::Degraded(value) => Some(value),
            _ => None,
        }
    }

    /// The unabsorbed error, if any.
    pub fn err(self) -> Option<CoreError> {
        match self {
            RecoveryResult::Failed(error) => Some(error),
            _ => None,
        }
    }
}

pub struct ErrorRecovery;

impl ErrorRecovery {
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            CoreError::Storage(storage_error) => match storage_error {
                StorageError::Parse { collection, .. } => {
                    RecoveryStrategy::ResetCollection(*collection)
                }
                // Unreadable keys behave like absent keys
                StorageError::Read { .. } | StorageError::Io(_) => RecoveryStrategy::Fallback,
                StorageError::Write { .. } => RecoveryStrategy::Fail,
            },

            // Retried on the next content change
            CoreError::Extraction(_) | CoreError::InvalidInput { .. } => {
                RecoveryStrategy::SkipEntry
            }

            CoreError::Config(_) => RecoveryStrategy::Fail,
        }
    }

    /// `Degraded` carries `T::default()`, so callers pick a `T` whose default
    /// means "nothing usable", such as `Option<_>`.
    pub fn apply_strategy<T: Default>(
        strategy: RecoveryStrategy,
        outcome: Result<T, CoreError>,
    ) -> RecoveryResult<T> {
        let error = match outcome {
            Ok(value) => return RecoveryResult::Recovered(value),
            Err(error) => error,
        };

        match strategy {
            RecoveryStrategy::ResetCollection(collection) => {
                warn!(%collection, "resetting stored collection: {}", error);
                RecoveryResult::Degraded(T::default())
            }
            RecoveryStrategy::SkipEntry => {
                debug!(
                    code = error.error_code(),
                    retryable = error.is_retryable(),
                    "skipping entry for this pass: {}",
                    error
                );
                RecoveryResult::Skipped
            }
            RecoveryStrategy::Fallback => {
                warn!("falling back to defaults: {}", error);
                RecoveryResult::Degraded(T::default())
            }
            RecoveryStrategy::Fail => RecoveryResult::Failed(error),
        }
    }

    /// Pick the strategy from the error itself and apply it.
    pub fn recover<T: Default>(outcome: Result<T, CoreError>) -> RecoveryResult<T> {
        match outcome {
            Ok(value) => RecoveryResult::Recovered(value),
            Err(error) => {
                let strategy = Self::determine_strategy(&error);
                Self::apply_strategy(strategy, Err(error))
            }
        }
    }
}
